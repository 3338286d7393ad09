//! Scripted connections for unit tests.

use async_trait::async_trait;
use keel_core::{
    models::{BrokerInfo, BrokerRole},
    Connection, ConnectionError, ConnectionFactory, Endpoint, JsonCodec, PayloadCodec,
    RemotingRequest, RemotingResponse,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::Barrier;

/// Answers a request, or `None` to never answer it.
pub(crate) type Handler = Arc<dyn Fn(&RemotingRequest) -> Option<RemotingResponse> + Send + Sync>;

pub(crate) fn handler<F>(f: F) -> Handler
where
    F: Fn(&RemotingRequest) -> Option<RemotingResponse> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn ok_handler() -> Handler {
    handler(|_| Some(RemotingResponse::success(Vec::new())))
}

pub(crate) fn json<T: serde::Serialize>(value: &T) -> Vec<u8> {
    JsonCodec.encode(value).unwrap()
}

pub(crate) fn broker_info(cluster: &str, broker: &str, admin_port: u16) -> BrokerInfo {
    BrokerInfo {
        broker_name: broker.to_string(),
        group_name: format!("{}-group", broker),
        cluster_name: cluster.to_string(),
        role: BrokerRole::Master,
        producer_address: Endpoint::new(format!("{}.local", broker), admin_port + 1),
        consumer_address: Endpoint::new(format!("{}.local", broker), admin_port + 2),
        admin_address: Endpoint::new(format!("{}.local", broker), admin_port),
    }
}

pub(crate) struct MockConnection {
    name: String,
    endpoint: Endpoint,
    connect_on_start: bool,
    connected: AtomicBool,
    starts: AtomicUsize,
    shutdowns: AtomicUsize,
    requests: Mutex<Vec<RemotingRequest>>,
    handler: Handler,
    start_delay: Option<Duration>,
    start_barrier: Option<Arc<Barrier>>,
}

impl MockConnection {
    pub(crate) fn new(name: &str, endpoint: Endpoint, connect_on_start: bool, handler: Handler) -> Self {
        MockConnection {
            name: name.to_string(),
            endpoint,
            connect_on_start,
            connected: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            handler,
            start_delay: None,
            start_barrier: None,
        }
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<RemotingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn invocations(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockConnection")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.start_barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if self.connect_on_start {
            self.connected.store(true, Ordering::SeqCst);
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn invoke(
        &self,
        request: RemotingRequest,
        _timeout: Duration,
    ) -> Result<RemotingResponse, ConnectionError> {
        self.requests.lock().unwrap().push(request.clone());
        match (self.handler)(&request) {
            Some(response) => Ok(response),
            None => std::future::pending().await,
        }
    }
}

/// Records every connection it opens; handlers are looked up by endpoint.
#[derive(Default)]
pub(crate) struct MockConnectionFactory {
    handlers: Mutex<HashMap<Endpoint, Handler>>,
    offline: Mutex<Vec<Endpoint>>,
    created: Mutex<Vec<Arc<MockConnection>>>,
    start_delay: Mutex<Option<Duration>>,
    start_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl MockConnectionFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_handler(&self, endpoint: Endpoint, handler: Handler) {
        self.handlers.lock().unwrap().insert(endpoint, handler);
    }

    /// Connections to `endpoint` stay disconnected after start.
    pub(crate) fn set_offline(&self, endpoint: Endpoint) {
        self.offline.lock().unwrap().push(endpoint);
    }

    /// Connections created from now on take `delay` to start.
    pub(crate) fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = Some(delay);
    }

    /// Connections created from now on wait on `barrier` while starting.
    pub(crate) fn set_start_barrier(&self, barrier: Arc<Barrier>) {
        *self.start_barrier.lock().unwrap() = Some(barrier);
    }

    pub(crate) fn created(&self) -> Vec<Arc<MockConnection>> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn created_for(&self, endpoint: &Endpoint) -> Vec<Arc<MockConnection>> {
        self.created()
            .into_iter()
            .filter(|c| c.endpoint() == endpoint)
            .collect()
    }
}

impl ConnectionFactory for MockConnectionFactory {
    fn create(&self, name: &str, endpoint: &Endpoint) -> Arc<dyn Connection> {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(ok_handler);
        let online = !self.offline.lock().unwrap().contains(endpoint);
        let mut cnx = MockConnection::new(name, endpoint.clone(), online, handler);
        cnx.start_delay = *self.start_delay.lock().unwrap();
        cnx.start_barrier = self.start_barrier.lock().unwrap().clone();
        let cnx = Arc::new(cnx);
        self.created.lock().unwrap().push(Arc::clone(&cnx));
        cnx
    }
}
