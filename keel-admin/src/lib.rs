//! Keel-Admin
//!
//! Keel-Admin -- control plane for Keel clusters: name server pool, broker
//! topology cache, request gateway and accumulated message monitoring

pub mod errors;
pub use errors::{AdminError, Result};

mod config;
pub use config::{parse_name_servers, AdminConfig, MonitorConfig, NAME_SERVERS_ENV};

mod request_gateway;
pub use request_gateway::{RequestGateway, DEFAULT_REQUEST_TIMEOUT};

mod name_server_pool;
pub use name_server_pool::NameServerPool;

mod broker_directory;
pub use broker_directory::{
    BrokerConnection, BrokerIdentity, ClusterBrokerDirectory, ClusterTopologySnapshot,
};

mod notifier;
pub use notifier::{AccumulationNotifier, LogNotifier};

mod scheduler;
pub use scheduler::{ScheduledAction, Scheduler, TokioScheduler};

mod accumulation_monitor;
pub use accumulation_monitor::{AccumulationMonitor, MonitorState, ScanOutcome};

mod admin_service;
pub use admin_service::{AdminService, SCAN_TASK_NAME};

#[cfg(test)]
mod test_support;
