//! SimpleChat console pieces shared by the binary and its tests.

pub mod logging;
pub mod runner;

pub use logging::LogSink;
pub use runner::{CLI_CONVERSATION_ID, CliRunner, RunnerError};
