use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection to {0} is not established")]
    NotConnected(String),

    #[error("connection to {0} closed before the response arrived")]
    Closed(String),

    #[error("no response from {0} within {1:?}")]
    Timeout(String, std::time::Duration),

    #[error("frame of {0} bytes exceeds the limit of {1} bytes")]
    FrameTooLarge(usize, usize),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unable to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unable to decode payload: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("endpoint `{0}` is not in host:port form")]
    MissingPort(String),

    #[error("endpoint `{0}` has an empty host")]
    EmptyHost(String),

    #[error("endpoint `{0}` has an invalid port")]
    InvalidPort(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageIdError {
    #[error("message id `{0}` has no broker separator")]
    MissingSeparator(String),

    #[error("message id `{0}` has an empty broker name")]
    EmptyBroker(String),

    #[error("message id `{0}` has an invalid position")]
    InvalidPosition(String),
}
