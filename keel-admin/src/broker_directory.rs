use crate::{
    errors::{AdminError, Result},
    name_server_pool::NameServerPool,
    request_gateway::RequestGateway,
};

use dashmap::DashMap;
use futures::future::join_all;
use keel_core::{
    models::{BrokerInfo, GetClusterBrokersRequest},
    Connection, ConnectionFactory, JsonCodec, NameServerRequestCode, PayloadCodec,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

/// Stable logical name of a broker; its network address may change across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerIdentity {
    pub cluster_name: String,
    pub broker_name: String,
}

/// A broker registration paired with the live connection to its admin endpoint.
#[derive(Debug, Clone)]
pub struct BrokerConnection {
    pub info: BrokerInfo,
    pub connection: Arc<dyn Connection>,
}

impl BrokerConnection {
    pub fn broker_name(&self) -> &str {
        &self.info.broker_name
    }

    pub fn identity(&self) -> BrokerIdentity {
        BrokerIdentity {
            cluster_name: self.info.cluster_name.clone(),
            broker_name: self.info.broker_name.clone(),
        }
    }
}

/// Last known topology of one cluster. Never mutated once built; a refresh
/// installs a whole new snapshot.
#[derive(Debug)]
pub struct ClusterTopologySnapshot {
    cluster_name: String,
    brokers: Vec<BrokerConnection>,
    retired: AtomicBool,
}

impl ClusterTopologySnapshot {
    fn new(cluster_name: &str, brokers: Vec<BrokerConnection>) -> Self {
        ClusterTopologySnapshot {
            cluster_name: cluster_name.to_string(),
            brokers,
            retired: AtomicBool::new(false),
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn brokers(&self) -> &[BrokerConnection] {
        &self.brokers
    }

    pub fn find(&self, broker_name: &str) -> Option<&BrokerConnection> {
        self.brokers.iter().find(|b| b.broker_name() == broker_name)
    }

    pub fn len(&self) -> usize {
        self.brokers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }

    // shuts the connections down once, whoever retires the snapshot first
    async fn retire(&self) {
        if self.retired.swap(true, Ordering::SeqCst) {
            return;
        }
        join_all(self.brokers.iter().map(|b| b.connection.shutdown())).await;
        debug!(
            cluster = %self.cluster_name,
            brokers = self.brokers.len(),
            "retired superseded broker connections"
        );
    }
}

// Retires on a spawned task so an abandoned caller cannot stop it half way.
async fn retire_detached(snapshot: Arc<ClusterTopologySnapshot>) {
    let cluster = snapshot.cluster_name.clone();
    let task = tokio::spawn(async move { snapshot.retire().await });
    if let Err(e) = task.await {
        warn!(cluster = %cluster, error = %e, "retiring broker connections failed");
    }
}

/// Connections opened by a refresh that has not installed them yet.
#[derive(Default)]
struct OpenedConnections(Vec<Arc<dyn Connection>>);

impl Drop for OpenedConnections {
    fn drop(&mut self) {
        if self.0.is_empty() {
            return;
        }
        let connections = std::mem::take(&mut self.0);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(connections = connections.len(), "shutting down connections of an abandoned refresh");
                handle.spawn(async move {
                    join_all(connections.iter().map(|cnx| cnx.shutdown())).await;
                });
            }
            Err(_) => warn!(
                connections = connections.len(),
                "no runtime to shut down connections of an abandoned refresh"
            ),
        }
    }
}

/// Per-cluster cache of broker connections, discovered lazily through the
/// name servers.
///
/// Refreshing a cluster swaps in a complete snapshot with a single map insert
/// and only then shuts down the replaced connections, so a lookup always sees
/// either the old or the new topology. Concurrent refreshes of one cluster are
/// not serialized: the last insert wins and every replaced snapshot is still
/// retired by the refresh that replaced it.
pub struct ClusterBrokerDirectory<C: PayloadCodec = JsonCodec> {
    name_servers: Arc<NameServerPool>,
    gateway: RequestGateway,
    codec: Arc<C>,
    factory: Arc<dyn ConnectionFactory>,
    clusters: DashMap<String, Arc<ClusterTopologySnapshot>>,
    closed: AtomicBool,
}

impl<C: PayloadCodec> ClusterBrokerDirectory<C> {
    pub fn new(
        name_servers: Arc<NameServerPool>,
        gateway: RequestGateway,
        codec: Arc<C>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Self {
        ClusterBrokerDirectory {
            name_servers,
            gateway,
            codec,
            factory,
            clusters: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Connection to `broker_name` of `cluster_name`, or `None` if the name
    /// servers do not know that broker.
    ///
    /// A cache miss triggers one refresh of the cluster and one more lookup.
    pub async fn resolve(
        &self,
        cluster_name: &str,
        broker_name: &str,
    ) -> Result<Option<Arc<dyn Connection>>> {
        if let Some(broker) = self.lookup(cluster_name, broker_name) {
            return Ok(Some(broker.connection));
        }

        debug!(cluster = %cluster_name, broker = %broker_name, "broker not cached, refreshing cluster");
        self.refresh(cluster_name).await?;

        Ok(self
            .lookup(cluster_name, broker_name)
            .map(|broker| broker.connection))
    }

    /// Queries a name server for the live brokers of `cluster_name` and installs
    /// the resulting snapshot. On failure the previous snapshot stays in place.
    pub async fn refresh(&self, cluster_name: &str) -> Result<Arc<ClusterTopologySnapshot>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AdminError::DirectoryClosed);
        }
        let name_server = self.name_servers.pick_available()?;
        let request = GetClusterBrokersRequest {
            cluster_name: cluster_name.to_string(),
            ..Default::default()
        };
        let payload = self.codec.encode(&request)?;

        let body = self
            .gateway
            .call(
                name_server.as_ref(),
                NameServerRequestCode::GetClusterBrokers,
                payload,
            )
            .await
            .map_err(|e| match e {
                AdminError::RemoteError { message, .. } => AdminError::DirectoryQueryFailed {
                    cluster: cluster_name.to_string(),
                    message,
                },
                other => other,
            })?;
        let broker_infos: Vec<BrokerInfo> = self.codec.decode(&body)?;

        // connections not yet installed are shut down if this future is dropped
        let mut opened = OpenedConnections::default();
        let brokers: Vec<BrokerConnection> = broker_infos
            .into_iter()
            .map(|info| {
                let connection = self.factory.create(&info.broker_name, &info.admin_address);
                opened.0.push(Arc::clone(&connection));
                BrokerConnection { info, connection }
            })
            .collect();
        join_all(brokers.iter().map(|b| b.connection.start())).await;

        let snapshot = Arc::new(ClusterTopologySnapshot::new(cluster_name, brokers));
        if self.closed.load(Ordering::SeqCst) {
            opened.0.clear();
            retire_detached(snapshot).await;
            return Err(AdminError::DirectoryClosed);
        }
        let replaced = self
            .clusters
            .insert(cluster_name.to_string(), Arc::clone(&snapshot));
        opened.0.clear();
        info!(
            cluster = %cluster_name,
            brokers = snapshot.len(),
            "broker topology refreshed"
        );

        if let Some(replaced) = replaced {
            retire_detached(replaced).await;
        }

        // shutdown may have drained the map between the check and the insert
        if self.closed.load(Ordering::SeqCst) {
            self.clusters
                .remove_if(cluster_name, |_, current| Arc::ptr_eq(current, &snapshot));
            retire_detached(snapshot).await;
            return Err(AdminError::DirectoryClosed);
        }
        Ok(snapshot)
    }

    /// Current snapshot of `cluster_name`, refreshing once when nothing is cached yet.
    pub async fn list_brokers(&self, cluster_name: &str) -> Result<Arc<ClusterTopologySnapshot>> {
        match self.cached(cluster_name) {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh(cluster_name).await,
        }
    }

    /// Locates a broker within the cluster snapshot without forcing a refresh
    /// on a warm cache.
    pub async fn find_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
    ) -> Result<Option<BrokerConnection>> {
        let snapshot = self.list_brokers(cluster_name).await?;
        Ok(snapshot.find(broker_name).cloned())
    }

    pub fn cached(&self, cluster_name: &str) -> Option<Arc<ClusterTopologySnapshot>> {
        self.clusters
            .get(cluster_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn cached_clusters(&self) -> Vec<String> {
        self.clusters.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drops every cached snapshot and shuts its connections down. Later
    /// refreshes fail with [`AdminError::DirectoryClosed`].
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let clusters = self.cached_clusters();
        for cluster in clusters {
            if let Some((_, snapshot)) = self.clusters.remove(&cluster) {
                retire_detached(snapshot).await;
            }
        }
    }

    // copies the entry out so no map guard is held across an await
    fn lookup(&self, cluster_name: &str, broker_name: &str) -> Option<BrokerConnection> {
        self.clusters
            .get(cluster_name)
            .and_then(|snapshot| snapshot.find(broker_name).cloned())
    }
}

#[cfg(test)]
#[path = "broker_directory_test.rs"]
mod broker_directory_test;
