use crate::{
    connection::{Connection, ConnectionFactory},
    endpoint::Endpoint,
    errors::ConnectionError,
    frame::{self, RequestFrame},
    protocol::{RemotingRequest, RemotingResponse},
};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::net::{
    tcp::{OwnedReadHalf, OwnedWriteHalf},
    TcpStream,
};
use tokio::sync::{oneshot, watch, Mutex};
use tracing::{debug, info, warn};

/// Transport settings applied to every socket connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketSetting {
    pub connect_timeout_ms: u64,
    pub reconnect_interval_ms: u64,
    pub tcp_nodelay: bool,
    pub max_frame_bytes: usize,
}

impl Default for SocketSetting {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3000,
            reconnect_interval_ms: 1000,
            tcp_nodelay: true,
            max_frame_bytes: 16 * 1024 * 1024,
        }
    }
}

impl SocketSetting {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Connecting,
    Connected,
    Disconnected,
}

struct Shared {
    // unique identifier for every request sent on this connection
    next_id: AtomicU64,
    // requests waiting for their response, keyed by correlation id
    pending: DashMap<u64, oneshot::Sender<RemotingResponse>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    link: watch::Sender<LinkState>,
    closed: watch::Sender<bool>,
    started: AtomicBool,
}

impl Shared {
    fn fail_pending(&self) {
        // dropping the senders wakes every waiter with a closed channel
        self.pending.clear();
    }

    async fn read_loop(
        &self,
        mut reader: OwnedReadHalf,
        max_frame_bytes: usize,
    ) -> Result<(), ConnectionError> {
        while let Some(frame) = frame::read_response(&mut reader, max_frame_bytes).await? {
            match self.pending.remove(&frame.correlation_id) {
                Some((_, waiter)) => {
                    let _ = waiter.send(RemotingResponse {
                        status: frame.status,
                        body: frame.body,
                    });
                }
                None => debug!(
                    correlation_id = frame.correlation_id,
                    "dropping response of an abandoned request"
                ),
            }
        }
        Ok(())
    }
}

/// TCP connection multiplexing concurrent requests by correlation id.
///
/// A background task owns the read half of the socket and reconnects after
/// `reconnect_interval_ms` whenever the link drops, until `shutdown` is called
/// or the connection is dropped.
pub struct SocketConnection {
    name: String,
    endpoint: Endpoint,
    setting: SocketSetting,
    shared: Arc<Shared>,
}

impl SocketConnection {
    pub fn new(name: impl Into<String>, endpoint: Endpoint, setting: SocketSetting) -> Self {
        let (link, _) = watch::channel(LinkState::Disconnected);
        let (closed, _) = watch::channel(false);
        SocketConnection {
            name: name.into(),
            endpoint,
            setting,
            shared: Arc::new(Shared {
                next_id: AtomicU64::new(1),
                pending: DashMap::new(),
                writer: Mutex::new(None),
                link,
                closed,
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Number of requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    async fn connection_loop(
        shared: Arc<Shared>,
        name: String,
        endpoint: Endpoint,
        setting: SocketSetting,
    ) {
        let mut closed = shared.closed.subscribe();
        loop {
            if *closed.borrow() {
                break;
            }
            shared.link.send_replace(LinkState::Connecting);

            let connect = TcpStream::connect((endpoint.host(), endpoint.port()));
            match tokio::time::timeout(setting.connect_timeout(), connect).await {
                Ok(Ok(stream)) => {
                    if let Err(e) = stream.set_nodelay(setting.tcp_nodelay) {
                        warn!(connection = %name, error = %e, "unable to set TCP_NODELAY");
                    }
                    let (read_half, write_half) = stream.into_split();
                    *shared.writer.lock().await = Some(write_half);
                    shared.link.send_replace(LinkState::Connected);
                    info!(connection = %name, endpoint = %endpoint, "connection established");

                    tokio::select! {
                        res = shared.read_loop(read_half, setting.max_frame_bytes) => match res {
                            Ok(()) => info!(connection = %name, endpoint = %endpoint, "connection closed by peer"),
                            Err(e) => warn!(connection = %name, endpoint = %endpoint, error = %e, "connection lost"),
                        },
                        _ = closed.changed() => {}
                    }

                    shared.writer.lock().await.take();
                    shared.link.send_replace(LinkState::Disconnected);
                    shared.fail_pending();
                }
                Ok(Err(e)) => {
                    shared.link.send_replace(LinkState::Disconnected);
                    debug!(connection = %name, endpoint = %endpoint, error = %e, "connect attempt failed");
                }
                Err(_) => {
                    shared.link.send_replace(LinkState::Disconnected);
                    debug!(connection = %name, endpoint = %endpoint, "connect attempt timed out");
                }
            }

            if *closed.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(setting.reconnect_interval()) => {}
                _ = closed.changed() => {}
            }
        }
        debug!(connection = %name, endpoint = %endpoint, "connection loop stopped");
    }
}

impl fmt::Debug for SocketConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketConnection")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Drop for SocketConnection {
    fn drop(&mut self) {
        // stops the background loop, which only holds the shared state
        if !self.shared.closed.send_replace(true) {
            self.shared.fail_pending();
            debug!(connection = %self.name, endpoint = %self.endpoint, "connection dropped without shutdown");
        }
    }
}

struct PendingGuard<'a> {
    pending: &'a DashMap<u64, oneshot::Sender<RemotingResponse>>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

#[async_trait]
impl Connection for SocketConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn start(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) || *self.shared.closed.borrow() {
            return;
        }
        let mut link = self.shared.link.subscribe();
        self.shared.link.send_replace(LinkState::Connecting);

        tokio::spawn(Self::connection_loop(
            Arc::clone(&self.shared),
            self.name.clone(),
            self.endpoint.clone(),
            self.setting.clone(),
        ));

        // wait for the outcome of the first attempt only, later attempts run in background
        let first_attempt = link.wait_for(|state| *state != LinkState::Connecting);
        let still_connecting = tokio::time::timeout(self.setting.connect_timeout(), first_attempt)
            .await
            .is_err();
        if still_connecting {
            debug!(connection = %self.name, endpoint = %self.endpoint, "still connecting after start");
        }
    }

    async fn shutdown(&self) {
        if self.shared.closed.send_replace(true) {
            return;
        }
        self.shared.writer.lock().await.take();
        self.shared.link.send_replace(LinkState::Disconnected);
        self.shared.fail_pending();
        info!(connection = %self.name, endpoint = %self.endpoint, "connection shut down");
    }

    fn is_connected(&self) -> bool {
        *self.shared.link.borrow() == LinkState::Connected
    }

    async fn invoke(
        &self,
        request: RemotingRequest,
        timeout: Duration,
    ) -> Result<RemotingResponse, ConnectionError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.shared.pending,
            id,
        };

        let frame = RequestFrame {
            correlation_id: id,
            code: request.code,
            body: request.body,
        };
        let exchange = async move {
            {
                let mut writer = self.shared.writer.lock().await;
                let writer = writer
                    .as_mut()
                    .ok_or_else(|| ConnectionError::NotConnected(self.endpoint.to_string()))?;
                frame::write_request(writer, &frame, self.setting.max_frame_bytes).await?;
            }
            rx.await
                .map_err(|_| ConnectionError::Closed(self.endpoint.to_string()))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(self.endpoint.to_string(), timeout)),
        }
    }
}

/// Creates [`SocketConnection`]s sharing one [`SocketSetting`].
#[derive(Debug, Clone, Default)]
pub struct SocketConnectionFactory {
    setting: SocketSetting,
}

impl SocketConnectionFactory {
    pub fn new(setting: SocketSetting) -> Self {
        SocketConnectionFactory { setting }
    }
}

impl ConnectionFactory for SocketConnectionFactory {
    fn create(&self, name: &str, endpoint: &Endpoint) -> Arc<dyn Connection> {
        Arc::new(SocketConnection::new(
            name,
            endpoint.clone(),
            self.setting.clone(),
        ))
    }
}
