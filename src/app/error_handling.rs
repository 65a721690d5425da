//! Error handling utilities

use tracing::error;

use crate::error::TunerError;

pub const GENERAL_ERROR: i32 = 1;
pub const ARGUMENT_ERROR: i32 = 2;

/// Exit code for a fatal error
///
/// Input problems the user has to fix map to [`ARGUMENT_ERROR`].
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<TunerError>() {
        Some(TunerError::InputContradiction(_) | TunerError::Config(_)) => ARGUMENT_ERROR,
        _ => GENERAL_ERROR,
    }
}

/// Print a fatal error and exit
///
/// The error chain is shown with `-v` and above.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("Error: {error:#}");

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code(&error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let contradiction = anyhow::Error::from(TunerError::InputContradiction("x".into()));
        assert_eq!(exit_code(&contradiction), ARGUMENT_ERROR);

        let io: anyhow::Result<()> = Err(TunerError::Io(std::io::Error::other("gone")))
            .context("Failed to read summary");
        assert_eq!(exit_code(&io.unwrap_err()), GENERAL_ERROR);
    }

    #[test]
    fn test_config_error_inside_context() {
        let result: anyhow::Result<()> =
            Err(TunerError::Config("bad platform".into())).context("Failed to load configuration");
        assert_eq!(exit_code(&result.unwrap_err()), ARGUMENT_ERROR);
    }
}
