use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use blocks::Problem;
use blocks::persist::{self, BlockRecord, ProgramRecord};
use blocks::program::Program;
use interpreter::RunConfig;

/// Optional `[limits]` table of a program or test file.
#[derive(Debug, Default, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub iteration_cap: Option<u64>,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl Limits {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::default();
        if let Some(cap) = self.iteration_cap {
            config = config.with_iteration_cap(cap);
        }
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        config
    }
}

/// A program on disk: an optional problem, optional limits and the slots.
#[derive(Debug, Default, Deserialize)]
pub struct ProgramFile {
    #[serde(default)]
    pub problem: Option<Problem>,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub slots: Vec<BlockRecord>,
}

impl ProgramFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        toml::from_str(&source).map_err(|e| format!("TOML parse error: {}", e))
    }

    pub fn program(&self) -> Program {
        persist::deserialize(ProgramRecord {
            slots: self.slots.clone(),
        })
    }

    /// Starting `x`: an explicit override, then the problem's, then zero.
    pub fn initial_value(&self, explicit: Option<f64>) -> f64 {
        explicit
            .or_else(|| self.problem.as_ref().map(|p| p.initial_value))
            .unwrap_or(0.0)
    }
}
