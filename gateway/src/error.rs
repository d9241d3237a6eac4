//! Gateway error types.

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("price feed error: {0}")]
    Feed(String),
}
