use keel_core::{CodecError, ConnectionError, MessageIdError};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no available name server")]
    NoAvailableEndpoint,

    #[error("getting brokers of cluster {cluster} failed, errorMessage: {message}")]
    DirectoryQueryFailed { cluster: String, message: String },

    #[error("request {request_code} failed, errorMessage: {message}")]
    RemoteError { request_code: i32, message: String },

    #[error("request {request_code} got no response within {timeout:?}")]
    Timeout { request_code: i32, timeout: Duration },

    #[error("transport error: {0}")]
    Transport(ConnectionError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("broker directory is shut down")]
    DirectoryClosed,

    #[error("broker {broker} of cluster {cluster} is unavailable")]
    BrokerUnavailable { cluster: String, broker: String },

    #[error("invalid message id: {0}")]
    InvalidMessageId(#[from] MessageIdError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AdminError {
    /// Diagnostic text reported by the remote side, if the failure came from it.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            AdminError::RemoteError { message, .. }
            | AdminError::DirectoryQueryFailed { message, .. } => Some(message),
            _ => None,
        }
    }
}
