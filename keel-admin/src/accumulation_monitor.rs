use crate::{
    errors::Result,
    name_server_pool::NameServerPool,
    notifier::AccumulationNotifier,
    request_gateway::RequestGateway,
};

use keel_core::{
    models::{GetTopicAccumulateInfoListRequest, TopicAccumulateInfo},
    JsonCodec, NameServerRequestCode, PayloadCodec,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Scanning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Another scan was still running, this trigger was dropped.
    Skipped,
    Completed { notified: usize },
    /// The query failed; logged and left for the next cycle.
    Failed,
}

/// Periodic scan for topics whose unconsumed backlog exceeds the threshold.
///
/// A scan never overlaps itself and never returns an error to its scheduler.
pub struct AccumulationMonitor<C: PayloadCodec = JsonCodec> {
    name_servers: Arc<NameServerPool>,
    gateway: RequestGateway,
    codec: Arc<C>,
    notifier: Arc<dyn AccumulationNotifier>,
    threshold: u64,
    scanning: AtomicBool,
}

struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<C: PayloadCodec> AccumulationMonitor<C> {
    pub fn new(
        name_servers: Arc<NameServerPool>,
        gateway: RequestGateway,
        codec: Arc<C>,
        notifier: Arc<dyn AccumulationNotifier>,
        threshold: u64,
    ) -> Self {
        AccumulationMonitor {
            name_servers,
            gateway,
            codec,
            notifier,
            threshold,
            scanning: AtomicBool::new(false),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn state(&self) -> MonitorState {
        if self.scanning.load(Ordering::SeqCst) {
            MonitorState::Scanning
        } else {
            MonitorState::Idle
        }
    }

    /// Runs one scan cycle, notifying once per topic over the threshold.
    pub async fn scan(&self) -> ScanOutcome {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("accumulation scan already running, trigger ignored");
            return ScanOutcome::Skipped;
        }
        let _guard = ScanGuard(&self.scanning);

        let findings = match self.query().await {
            Ok(findings) => findings,
            Err(e) => {
                error!(threshold = self.threshold, error = %e, "accumulation scan failed");
                return ScanOutcome::Failed;
            }
        };
        if findings.is_empty() {
            debug!(threshold = self.threshold, "no topic over accumulation threshold");
            return ScanOutcome::Completed { notified: 0 };
        }

        info!(
            threshold = self.threshold,
            topics = findings.len(),
            "topics over accumulation threshold"
        );
        for finding in &findings {
            self.notifier.notify(finding).await;
        }
        ScanOutcome::Completed {
            notified: findings.len(),
        }
    }

    async fn query(&self) -> Result<Vec<TopicAccumulateInfo>> {
        let name_server = self.name_servers.pick_available()?;
        let payload = self.codec.encode(&GetTopicAccumulateInfoListRequest {
            accumulate_threshold: self.threshold,
        })?;
        let body = self
            .gateway
            .call(
                name_server.as_ref(),
                NameServerRequestCode::GetTopicAccumulateInfoList,
                payload,
            )
            .await?;
        Ok(self.codec.decode(&body)?)
    }
}

#[cfg(test)]
#[path = "accumulation_monitor_test.rs"]
mod accumulation_monitor_test;
