//! Error types for the desk.

use std::path::PathBuf;

/// All errors that can occur during desk operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid order: {0}")]
    Validation(#[from] certbook::ValidationError),

    #[error(transparent)]
    Gateway(#[from] certbook_gateway::GatewayError),

    #[error("order not executable: {0}")]
    NotExecutable(String),

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("aborted: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_converts() {
        let err: Error = certbook::ValidationError::NonPositiveAmount.into();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn gateway_error_is_transparent() {
        let err: Error = certbook_gateway::GatewayError::Connection("refused".into()).into();
        assert_eq!(err.to_string(), "connection error: refused");
    }
}
