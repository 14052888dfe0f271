pub mod config;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod runtime_value;

pub use config::{CancelToken, RunConfig};
pub use error::{Diagnostic, ExpressionError, Interrupted, RuntimeError};
pub use executor::{Flow, RunOutcome, evaluate_block, execute_program, execute_program_with_config};
pub use runtime_value::RuntimeValue;
