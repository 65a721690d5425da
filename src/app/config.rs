//! Application configuration
//!
//! Settings of the process itself, as opposed to [`crate::config::TunerConfig`]
//! which controls the recommendations.

/// Overrides the verbosity-derived log filter when set
pub const LOG_ENV_VAR: &str = "RAPIDS_TUNER_LOG";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Verbosity level for logging
    pub verbose: u8,
    /// Filter directive taken from the environment
    pub log_filter: Option<String>,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            log_filter: std::env::var(LOG_ENV_VAR).ok().filter(|f| !f.trim().is_empty()),
        }
    }

    pub fn with_log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    /// Get the log level string based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            2 => "trace",
            _ => "trace,hyper=debug,reqwest=debug",
        }
    }

    /// Filter directive handed to the subscriber
    pub fn filter_directive(&self) -> String {
        self.log_filter
            .clone()
            .unwrap_or_else(|| self.log_level().to_string())
    }
}
