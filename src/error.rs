use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The target cluster mixes mutually exclusive ways of describing a worker.
    #[error("Input contradiction: {0}")]
    InputContradiction(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl TunerError {
    /// Errors that must stop the run instead of degrading to a comment.
    pub fn is_input_contradiction(&self) -> bool {
        matches!(self, TunerError::InputContradiction(_))
    }
}

pub type Result<T> = std::result::Result<T, TunerError>;
