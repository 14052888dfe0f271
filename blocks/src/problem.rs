use serde::{Deserialize, Serialize};

use crate::program::Program;

fn default_precision() -> u32 {
    2
}

/// A puzzle: reach `target_value` starting from `initial_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub initial_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    /// Decimal places compared when the target is not a whole number.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl Problem {
    pub fn new(initial_value: f64, target_value: f64) -> Self {
        Problem {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            initial_value,
            target_value: Some(target_value),
            precision: default_precision(),
        }
    }

    /// Whether a run that ended with `result` solves this problem.
    pub fn is_solved(&self, result: f64) -> bool {
        let Some(target) = self.target_value else {
            return false;
        };
        if target.fract() == 0.0 {
            return result == target;
        }
        let scale = 10f64.powi(self.precision.min(15) as i32);
        (result * scale).round() == (target * scale).round()
    }

    pub fn starting_program(&self) -> Program {
        Program::new(self.initial_value)
    }
}
