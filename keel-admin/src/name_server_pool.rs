use crate::errors::{AdminError, Result};

use futures::future::join_all;
use keel_core::{Connection, ConnectionFactory, Endpoint};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use tracing::info;

/// One connection per configured directory server, picked round-robin among
/// the ones currently connected.
///
/// The connection list is fixed at construction; reconnecting is left to the
/// connections themselves.
#[derive(Debug)]
pub struct NameServerPool {
    connections: Vec<Arc<dyn Connection>>,
    next_index: AtomicU64,
    started: AtomicBool,
}

impl NameServerPool {
    pub fn new(endpoints: &[Endpoint], factory: &dyn ConnectionFactory) -> Self {
        let connections = endpoints
            .iter()
            .map(|endpoint| factory.create(&format!("name-server-{}", endpoint), endpoint))
            .collect();
        NameServerPool {
            connections,
            next_index: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Starts every connection; unreachable servers keep retrying in background.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        join_all(self.connections.iter().map(|cnx| cnx.start())).await;

        let connected = self.connections.iter().filter(|c| c.is_connected()).count();
        info!(
            configured = self.connections.len(),
            connected, "name server connections started"
        );
    }

    pub fn pick_available(&self) -> Result<Arc<dyn Connection>> {
        let available: Vec<&Arc<dyn Connection>> = self
            .connections
            .iter()
            .filter(|cnx| cnx.is_connected())
            .collect();
        if available.is_empty() {
            return Err(AdminError::NoAvailableEndpoint);
        }
        let index = self.next_index.fetch_add(1, Ordering::Relaxed) % available.len() as u64;
        Ok(Arc::clone(available[index as usize]))
    }

    pub async fn shutdown(&self) {
        join_all(self.connections.iter().map(|cnx| cnx.shutdown())).await;
    }

    pub fn connections(&self) -> &[Arc<dyn Connection>] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
