use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON configuration: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A remote call failed unexpectedly. A negative check result is not a probe error.
    #[error("Remote call on {node} failed: {reason}")]
    ProbeError { node: String, reason: String },

    #[error("Remote call on {node} timed out after {secs}s")]
    TimeoutError { node: String, secs: u64 },

    #[error("Could not parse {what}: {reason}")]
    ParseError { what: String, reason: String },

    #[error("Playbook '{playbook}' failed: {reason}")]
    PlaybookError { playbook: String, reason: String },

    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    pub fn probe(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ProbeError { node: node.into(), reason: reason.into() }
    }

    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ParseError { what: what.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
