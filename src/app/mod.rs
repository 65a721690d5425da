//! Application module
//!
//! Process-level concerns of the binary: verbosity, logging setup and
//! reporting fatal errors.

pub mod config;
pub mod error_handling;
pub mod logging;

pub use config::AppConfig;
pub use error_handling::{exit_code, handle_fatal_error};
pub use logging::init_logging;
