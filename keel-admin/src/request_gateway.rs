use crate::errors::{AdminError, Result};

use keel_core::{Connection, ConnectionError, RemotingRequest};
use std::time::Duration;
use tracing::debug;

/// Timeout applied to administrative requests unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Uniform call contract over any [`Connection`].
///
/// Success yields the raw response body; decoding it is left to the caller.
/// A failure status becomes [`AdminError::RemoteError`] carrying the remote
/// diagnostic text verbatim.
#[derive(Debug, Clone, Copy)]
pub struct RequestGateway {
    default_timeout: Duration,
}

impl Default for RequestGateway {
    fn default() -> Self {
        RequestGateway::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl RequestGateway {
    pub fn new(default_timeout: Duration) -> Self {
        RequestGateway { default_timeout }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Same as [`invoke`](Self::invoke) with the default timeout.
    pub async fn call(
        &self,
        connection: &dyn Connection,
        code: impl Into<i32>,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>> {
        self.invoke(connection, code, payload, self.default_timeout)
            .await
    }

    pub async fn invoke(
        &self,
        connection: &dyn Connection,
        code: impl Into<i32>,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let request_code = code.into();
        let request = RemotingRequest::new(request_code, payload);

        // bound the call here as well, the connection may not honour its own timeout
        let response = match tokio::time::timeout(timeout, connection.invoke(request, timeout)).await
        {
            Err(_) | Ok(Err(ConnectionError::Timeout(_, _))) => {
                debug!(request_code, connection = connection.name(), ?timeout, "request timed out");
                return Err(AdminError::Timeout {
                    request_code,
                    timeout,
                });
            }
            Ok(Err(e)) => return Err(AdminError::Transport(e)),
            Ok(Ok(response)) => response,
        };

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(AdminError::RemoteError {
                request_code,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            })
        }
    }
}

#[cfg(test)]
#[path = "request_gateway_test.rs"]
mod request_gateway_test;
