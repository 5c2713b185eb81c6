//! Command-line construction and execution.

pub mod command_line;
pub mod runner;

pub use command_line::build_command_line;
pub use runner::{run_command, RunnerConfig};
