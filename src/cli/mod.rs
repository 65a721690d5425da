//! CLI command handlers
//!
//! Argument parsing structures, routing and the command implementations.

pub mod args;
pub mod commands;
pub mod router;

pub use args::{Cli, CombineArgs, Commands, RecommendArgs};
pub use router::execute_command;
