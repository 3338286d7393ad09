use async_trait::async_trait;
use keel_core::models::TopicAccumulateInfo;
use tracing::warn;

/// Receives each topic found over the accumulation threshold.
#[async_trait]
pub trait AccumulationNotifier: Send + Sync {
    async fn notify(&self, info: &TopicAccumulateInfo);
}

/// Reports findings through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl AccumulationNotifier for LogNotifier {
    async fn notify(&self, info: &TopicAccumulateInfo) {
        warn!(
            topic = %info.topic,
            cluster = %info.cluster_name,
            accumulate_count = info.accumulate_count,
            queue_count = info.queue_count,
            consumer_group = info.consumer_group.as_deref().unwrap_or("-"),
            "message accumulation exceeds threshold"
        );
    }
}
