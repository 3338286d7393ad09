use crate::{
    endpoint::Endpoint,
    errors::ConnectionError,
    protocol::{RemotingRequest, RemotingResponse},
};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A bidirectional channel to one remote endpoint.
///
/// Implementations own their reconnect policy: `start` only kicks off the
/// first attempt and never fails, `is_connected` reports the live state.
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn endpoint(&self) -> &Endpoint;

    /// Starts the connection. Calling it again is a no-op.
    async fn start(&self);

    /// Closes the connection and stops reconnecting. Calling it again is a no-op.
    async fn shutdown(&self);

    fn is_connected(&self) -> bool;

    /// Sends `request` and waits for the correlated response, at most `timeout`.
    async fn invoke(
        &self,
        request: RemotingRequest,
        timeout: Duration,
    ) -> Result<RemotingResponse, ConnectionError>;
}

/// Opens connections that are not started yet.
pub trait ConnectionFactory: Send + Sync {
    fn create(&self, name: &str, endpoint: &Endpoint) -> Arc<dyn Connection>;
}
