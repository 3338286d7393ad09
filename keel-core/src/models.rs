//! Payloads exchanged with directory servers and brokers.
//!
//! Requests prefixed with `Cluster` are sent to a directory server, which fans
//! them out to every broker of the cluster. The unprefixed requests target a
//! single broker admin endpoint.

use crate::endpoint::Endpoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrokerRole {
    Master,
    Slave,
}

/// Registration record of a broker as kept by the directory servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerInfo {
    pub broker_name: String,
    pub group_name: String,
    pub cluster_name: String,
    pub role: BrokerRole,
    pub producer_address: Endpoint,
    pub consumer_address: Endpoint,
    pub admin_address: Endpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerStatisticInfo {
    pub broker_info: BrokerInfo,
    pub topic_count: u64,
    pub queue_count: u64,
    pub total_unconsumed_message_count: u64,
    pub consumer_group_count: u64,
    pub producer_count: u64,
    pub consumer_count: u64,
    pub message_chunk_count: u64,
    pub message_min_chunk_num: i64,
    pub message_max_chunk_num: i64,
    pub total_send_throughput: u64,
    pub total_consume_throughput: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerStatusInfo {
    pub broker_info: BrokerInfo,
    pub total_send_throughput: u64,
    pub total_consume_throughput: u64,
    pub total_unconsumed_message_count: u64,
    /// Milliseconds since the epoch of the last heartbeat seen by the directory server
    pub last_active_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicQueueInfo {
    pub topic: String,
    pub queue_id: i32,
    pub queue_current_offset: i64,
    pub queue_min_offset: i64,
    pub queue_min_consumed_offset: i64,
    pub producer_visible: bool,
    pub consumer_visible: bool,
    pub send_throughput: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerTopicQueueInfo {
    pub broker_info: BrokerInfo,
    pub topic_queue_info_list: Vec<TopicQueueInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConsumeInfo {
    pub consumer_group: String,
    pub topic: String,
    pub queue_id: i32,
    pub queue_current_offset: i64,
    pub consumed_offset: i64,
    pub queue_not_consume_count: i64,
    pub online_consumer_count: u32,
    pub consume_throughput: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerTopicConsumeInfo {
    pub broker_info: BrokerInfo,
    pub topic_consume_info_list: Vec<TopicConsumeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerProducerListInfo {
    pub broker_info: BrokerInfo,
    pub producer_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerInfo {
    pub consumer_group: String,
    pub consumer_id: String,
    pub topic: String,
    pub queue_id: i32,
    pub queue_current_offset: i64,
    pub consumed_offset: i64,
    pub queue_not_consume_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConsumerListInfo {
    pub broker_info: BrokerInfo,
    pub consumer_list: Vec<ConsumerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub message_id: String,
    pub topic: String,
    pub queue_id: i32,
    pub queue_offset: i64,
    pub tag: Option<String>,
    pub code: i32,
    pub body: Vec<u8>,
    pub created_time: i64,
    pub stored_time: i64,
    pub producer_address: Option<String>,
}

/// A topic whose unconsumed backlog crossed the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAccumulateInfo {
    pub topic: String,
    pub cluster_name: String,
    pub accumulate_count: u64,
    pub queue_count: u32,
    pub consumer_group: Option<String>,
}

// ===== DIRECTORY SERVER REQUESTS =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetClusterBrokersRequest {
    pub cluster_name: String,
    pub topic: Option<String>,
    pub only_find_master: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopicRequest {
    pub cluster_name: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopicConsumeRequest {
    pub cluster_name: String,
    pub consumer_group: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub cluster_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTopicForClusterRequest {
    pub cluster_name: String,
    pub topic: String,
    pub initial_queue_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteQueueForClusterRequest {
    pub cluster_name: String,
    pub topic: String,
    pub queue_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQueueVisibleForClusterRequest {
    pub cluster_name: String,
    pub topic: String,
    pub queue_id: i32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQueueNextConsumeOffsetForClusterRequest {
    pub cluster_name: String,
    pub consumer_group: String,
    pub topic: String,
    pub queue_id: i32,
    pub next_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConsumerGroupForClusterRequest {
    pub cluster_name: String,
    pub group_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTopicAccumulateInfoListRequest {
    pub accumulate_threshold: u64,
}

// ===== BROKER REQUESTS =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConsumeRequest {
    pub consumer_group: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTopicRequest {
    pub topic: String,
    pub initial_queue_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteQueueRequest {
    pub topic: String,
    pub queue_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQueueVisibleRequest {
    pub topic: String,
    pub queue_id: i32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQueueNextConsumeOffsetRequest {
    pub consumer_group: String,
    pub topic: String,
    pub queue_id: i32,
    pub next_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConsumerGroupRequest {
    pub group_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMessageDetailRequest {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMessageDetailByQueueOffsetRequest {
    pub topic: String,
    pub queue_id: i32,
    pub queue_offset: i64,
}
