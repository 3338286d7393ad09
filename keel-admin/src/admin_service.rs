use crate::{
    accumulation_monitor::AccumulationMonitor,
    broker_directory::ClusterBrokerDirectory,
    config::AdminConfig,
    errors::{AdminError, Result},
    name_server_pool::NameServerPool,
    notifier::{AccumulationNotifier, LogNotifier},
    request_gateway::RequestGateway,
    scheduler::{ScheduledAction, Scheduler, TokioScheduler},
};

use futures::FutureExt;
use keel_core::{
    models::{
        BrokerConsumerListInfo, BrokerProducerListInfo, BrokerStatisticInfo, BrokerStatusInfo,
        BrokerTopicConsumeInfo, BrokerTopicQueueInfo, ClusterRequest, ClusterTopicConsumeRequest,
        ClusterTopicRequest, ConsumerInfo, CreateTopicForClusterRequest, CreateTopicRequest,
        DeleteConsumerGroupForClusterRequest, DeleteConsumerGroupRequest,
        DeleteQueueForClusterRequest, DeleteQueueRequest, GetClusterBrokersRequest,
        GetMessageDetailByQueueOffsetRequest, GetMessageDetailRequest,
        GetTopicAccumulateInfoListRequest, QueueMessage, SetQueueNextConsumeOffsetForClusterRequest,
        SetQueueNextConsumeOffsetRequest, SetQueueVisibleForClusterRequest, SetQueueVisibleRequest,
        TopicAccumulateInfo, TopicConsumeInfo, TopicConsumeRequest, TopicQueueInfo, TopicRequest,
    },
    BrokerRequestCode, Connection, ConnectionFactory, JsonCodec, MessageId,
    NameServerRequestCode, PayloadCodec, SocketConnectionFactory,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Name under which the accumulation scan is registered with the scheduler.
pub const SCAN_TASK_NAME: &str = "scan_accumulate_messages";

/// Administrative operations over a set of clusters.
///
/// Cluster-wide operations go to any connected name server, which fans them
/// out to the brokers of the cluster. The `*_on_broker` operations talk to
/// one broker directly, located through the cached cluster topology.
pub struct AdminService<C: PayloadCodec = JsonCodec> {
    config: AdminConfig,
    codec: Arc<C>,
    gateway: RequestGateway,
    name_servers: Arc<NameServerPool>,
    brokers: ClusterBrokerDirectory<C>,
    monitor: Arc<AccumulationMonitor<C>>,
    scheduler: Arc<dyn Scheduler>,
}

impl AdminService<JsonCodec> {
    pub fn new(
        config: AdminConfig,
        factory: Arc<dyn ConnectionFactory>,
        notifier: Arc<dyn AccumulationNotifier>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::with_codec(config, JsonCodec, factory, notifier, scheduler)
    }

    /// Socket transport, log notifications and a tokio scheduler.
    pub fn from_config(config: AdminConfig) -> Self {
        let factory = Arc::new(SocketConnectionFactory::new(config.socket.clone()));
        Self::new(
            config,
            factory,
            Arc::new(LogNotifier),
            Arc::new(TokioScheduler::new()),
        )
    }
}

impl<C: PayloadCodec> AdminService<C> {
    pub fn with_codec(
        config: AdminConfig,
        codec: C,
        factory: Arc<dyn ConnectionFactory>,
        notifier: Arc<dyn AccumulationNotifier>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let codec = Arc::new(codec);
        let gateway = RequestGateway::new(config.request_timeout());
        let name_servers = Arc::new(NameServerPool::new(&config.name_servers, factory.as_ref()));
        let brokers = ClusterBrokerDirectory::new(
            Arc::clone(&name_servers),
            gateway,
            Arc::clone(&codec),
            factory,
        );
        let monitor = Arc::new(AccumulationMonitor::new(
            Arc::clone(&name_servers),
            gateway,
            Arc::clone(&codec),
            notifier,
            config.monitor.accumulate_threshold,
        ));
        AdminService {
            config,
            codec,
            gateway,
            name_servers,
            brokers,
            monitor,
            scheduler,
        }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn name_servers(&self) -> &Arc<NameServerPool> {
        &self.name_servers
    }

    pub fn brokers(&self) -> &ClusterBrokerDirectory<C> {
        &self.brokers
    }

    pub fn monitor(&self) -> &Arc<AccumulationMonitor<C>> {
        &self.monitor
    }

    /// Connects the name servers and, when enabled, schedules the accumulation scan.
    pub async fn start(&self) {
        self.name_servers.start().await;

        let monitor_config = &self.config.monitor;
        if !monitor_config.enabled {
            debug!("accumulation monitor disabled");
            return;
        }
        let monitor = Arc::clone(&self.monitor);
        let action: ScheduledAction = Arc::new(move || {
            let monitor = Arc::clone(&monitor);
            async move {
                monitor.scan().await;
            }
            .boxed()
        });
        self.scheduler.run_periodically(
            SCAN_TASK_NAME,
            action,
            monitor_config.initial_delay(),
            monitor_config.scan_interval(),
        );
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown();
        self.brokers.shutdown().await;
        self.name_servers.shutdown().await;
        info!("admin service stopped");
    }

    // ===== CLUSTER-WIDE OPERATIONS =====

    pub async fn get_all_clusters(&self) -> Result<Vec<String>> {
        let body = self
            .name_server_call(NameServerRequestCode::GetAllClusters, Vec::new())
            .await?;
        self.decode(&body)
    }

    pub async fn get_cluster_broker_status_info_list(
        &self,
        cluster_name: &str,
        topic: Option<&str>,
        only_find_master: bool,
    ) -> Result<Vec<BrokerStatusInfo>> {
        let request = GetClusterBrokersRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.map(str::to_string),
            only_find_master,
        };
        self.name_server_request(NameServerRequestCode::GetClusterBrokerStatusInfoList, &request)
            .await
    }

    pub async fn get_topic_queue_info_list(
        &self,
        cluster_name: &str,
        topic: &str,
    ) -> Result<Vec<BrokerTopicQueueInfo>> {
        let request = ClusterTopicRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
        };
        self.name_server_request(NameServerRequestCode::GetTopicQueueInfo, &request)
            .await
    }

    pub async fn get_topic_consume_info_list(
        &self,
        cluster_name: &str,
        consumer_group: &str,
        topic: &str,
    ) -> Result<Vec<BrokerTopicConsumeInfo>> {
        let request = ClusterTopicConsumeRequest {
            cluster_name: cluster_name.to_string(),
            consumer_group: consumer_group.to_string(),
            topic: topic.to_string(),
        };
        self.name_server_request(NameServerRequestCode::GetTopicConsumeInfo, &request)
            .await
    }

    pub async fn get_producer_info_list(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<BrokerProducerListInfo>> {
        let request = ClusterRequest {
            cluster_name: cluster_name.to_string(),
        };
        self.name_server_request(NameServerRequestCode::GetProducerList, &request)
            .await
    }

    pub async fn get_consumer_info_list(
        &self,
        cluster_name: &str,
        consumer_group: &str,
        topic: &str,
    ) -> Result<Vec<BrokerConsumerListInfo>> {
        let request = ClusterTopicConsumeRequest {
            cluster_name: cluster_name.to_string(),
            consumer_group: consumer_group.to_string(),
            topic: topic.to_string(),
        };
        self.name_server_request(NameServerRequestCode::GetConsumerList, &request)
            .await
    }

    pub async fn create_topic(
        &self,
        cluster_name: &str,
        topic: &str,
        initial_queue_count: Option<i32>,
    ) -> Result<()> {
        let request = CreateTopicForClusterRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
            initial_queue_count,
        };
        self.name_server_command(NameServerRequestCode::CreateTopic, &request)
            .await
    }

    pub async fn delete_topic(&self, cluster_name: &str, topic: &str) -> Result<()> {
        let request = ClusterTopicRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
        };
        self.name_server_command(NameServerRequestCode::DeleteTopic, &request)
            .await
    }

    pub async fn add_queue(&self, cluster_name: &str, topic: &str) -> Result<()> {
        let request = ClusterTopicRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
        };
        self.name_server_command(NameServerRequestCode::AddQueue, &request)
            .await
    }

    pub async fn delete_queue(&self, cluster_name: &str, topic: &str, queue_id: i32) -> Result<()> {
        let request = DeleteQueueForClusterRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
            queue_id,
        };
        self.name_server_command(NameServerRequestCode::DeleteQueue, &request)
            .await
    }

    pub async fn set_queue_producer_visible(
        &self,
        cluster_name: &str,
        topic: &str,
        queue_id: i32,
        visible: bool,
    ) -> Result<()> {
        let request = SetQueueVisibleForClusterRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
            queue_id,
            visible,
        };
        self.name_server_command(NameServerRequestCode::SetQueueProducerVisible, &request)
            .await
    }

    pub async fn set_queue_consumer_visible(
        &self,
        cluster_name: &str,
        topic: &str,
        queue_id: i32,
        visible: bool,
    ) -> Result<()> {
        let request = SetQueueVisibleForClusterRequest {
            cluster_name: cluster_name.to_string(),
            topic: topic.to_string(),
            queue_id,
            visible,
        };
        self.name_server_command(NameServerRequestCode::SetQueueConsumerVisible, &request)
            .await
    }

    pub async fn set_queue_next_consume_offset(
        &self,
        cluster_name: &str,
        consumer_group: &str,
        topic: &str,
        queue_id: i32,
        next_offset: i64,
    ) -> Result<()> {
        validate_next_offset(next_offset)?;
        let request = SetQueueNextConsumeOffsetForClusterRequest {
            cluster_name: cluster_name.to_string(),
            consumer_group: consumer_group.to_string(),
            topic: topic.to_string(),
            queue_id,
            next_offset,
        };
        self.name_server_command(NameServerRequestCode::SetQueueNextConsumeOffset, &request)
            .await
    }

    pub async fn delete_consumer_group(&self, cluster_name: &str, consumer_group: &str) -> Result<()> {
        validate_consumer_group(consumer_group)?;
        let request = DeleteConsumerGroupForClusterRequest {
            cluster_name: cluster_name.to_string(),
            group_name: consumer_group.to_string(),
        };
        self.name_server_command(NameServerRequestCode::DeleteConsumerGroup, &request)
            .await
    }

    pub async fn get_topic_accumulate_info_list(
        &self,
        accumulate_threshold: u64,
    ) -> Result<Vec<TopicAccumulateInfo>> {
        let request = GetTopicAccumulateInfoListRequest {
            accumulate_threshold,
        };
        self.name_server_request(NameServerRequestCode::GetTopicAccumulateInfoList, &request)
            .await
    }

    // ===== BROKER-TARGETED OPERATIONS =====

    pub async fn query_broker_statistic_info(
        &self,
        cluster_name: &str,
        broker_name: &str,
    ) -> Result<BrokerStatisticInfo> {
        let body = self
            .broker_call(
                cluster_name,
                broker_name,
                BrokerRequestCode::GetBrokerStatisticInfo,
                Vec::new(),
            )
            .await?;
        self.decode(&body)
    }

    pub async fn get_topic_queue_info_list_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
    ) -> Result<Vec<TopicQueueInfo>> {
        let request = TopicRequest {
            topic: topic.to_string(),
        };
        self.broker_request(cluster_name, broker_name, BrokerRequestCode::GetTopicQueueInfo, &request)
            .await
    }

    pub async fn get_topic_consume_info_list_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        consumer_group: &str,
        topic: &str,
    ) -> Result<Vec<TopicConsumeInfo>> {
        let request = TopicConsumeRequest {
            consumer_group: consumer_group.to_string(),
            topic: topic.to_string(),
        };
        self.broker_request(
            cluster_name,
            broker_name,
            BrokerRequestCode::GetTopicConsumeInfo,
            &request,
        )
        .await
    }

    /// Producer ids connected to the broker.
    pub async fn get_producer_info_list_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
    ) -> Result<Vec<String>> {
        let body = self
            .broker_call(
                cluster_name,
                broker_name,
                BrokerRequestCode::GetProducerList,
                Vec::new(),
            )
            .await?;
        Ok(split_comma_list(&body))
    }

    pub async fn get_consumer_info_list_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        consumer_group: &str,
        topic: &str,
    ) -> Result<Vec<ConsumerInfo>> {
        let request = TopicConsumeRequest {
            consumer_group: consumer_group.to_string(),
            topic: topic.to_string(),
        };
        self.broker_request(cluster_name, broker_name, BrokerRequestCode::GetConsumerList, &request)
            .await
    }

    /// Ids of the messages most recently stored by the broker.
    pub async fn get_latest_send_messages(
        &self,
        cluster_name: &str,
        broker_name: &str,
    ) -> Result<Vec<String>> {
        let body = self
            .broker_call(
                cluster_name,
                broker_name,
                BrokerRequestCode::GetLatestMessages,
                Vec::new(),
            )
            .await?;
        Ok(split_comma_list(&body))
    }

    pub async fn create_topic_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
        initial_queue_count: Option<i32>,
    ) -> Result<()> {
        let request = CreateTopicRequest {
            topic: topic.to_string(),
            initial_queue_count,
        };
        self.broker_command(cluster_name, broker_name, BrokerRequestCode::CreateTopic, &request)
            .await
    }

    pub async fn delete_topic_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
    ) -> Result<()> {
        let request = TopicRequest {
            topic: topic.to_string(),
        };
        self.broker_command(cluster_name, broker_name, BrokerRequestCode::DeleteTopic, &request)
            .await
    }

    pub async fn add_queue_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
    ) -> Result<()> {
        let request = TopicRequest {
            topic: topic.to_string(),
        };
        self.broker_command(cluster_name, broker_name, BrokerRequestCode::AddQueue, &request)
            .await
    }

    pub async fn delete_queue_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
        queue_id: i32,
    ) -> Result<()> {
        let request = DeleteQueueRequest {
            topic: topic.to_string(),
            queue_id,
        };
        self.broker_command(cluster_name, broker_name, BrokerRequestCode::DeleteQueue, &request)
            .await
    }

    pub async fn set_queue_producer_visible_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
        queue_id: i32,
        visible: bool,
    ) -> Result<()> {
        let request = SetQueueVisibleRequest {
            topic: topic.to_string(),
            queue_id,
            visible,
        };
        self.broker_command(
            cluster_name,
            broker_name,
            BrokerRequestCode::SetQueueProducerVisible,
            &request,
        )
        .await
    }

    pub async fn set_queue_consumer_visible_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
        queue_id: i32,
        visible: bool,
    ) -> Result<()> {
        let request = SetQueueVisibleRequest {
            topic: topic.to_string(),
            queue_id,
            visible,
        };
        self.broker_command(
            cluster_name,
            broker_name,
            BrokerRequestCode::SetQueueConsumerVisible,
            &request,
        )
        .await
    }

    pub async fn set_queue_next_consume_offset_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        consumer_group: &str,
        topic: &str,
        queue_id: i32,
        next_offset: i64,
    ) -> Result<()> {
        validate_next_offset(next_offset)?;
        let request = SetQueueNextConsumeOffsetRequest {
            consumer_group: consumer_group.to_string(),
            topic: topic.to_string(),
            queue_id,
            next_offset,
        };
        self.broker_command(
            cluster_name,
            broker_name,
            BrokerRequestCode::SetQueueNextConsumeOffset,
            &request,
        )
        .await
    }

    pub async fn delete_consumer_group_on_broker(
        &self,
        cluster_name: &str,
        broker_name: &str,
        consumer_group: &str,
    ) -> Result<()> {
        validate_consumer_group(consumer_group)?;
        let request = DeleteConsumerGroupRequest {
            group_name: consumer_group.to_string(),
        };
        self.broker_command(
            cluster_name,
            broker_name,
            BrokerRequestCode::DeleteConsumerGroup,
            &request,
        )
        .await
    }

    // ===== MESSAGE LOOKUP =====

    /// Looks a message up on the broker that stored it, named by the id itself.
    /// `None` when that broker is not part of the cluster or the message is gone.
    pub async fn get_message_detail(
        &self,
        cluster_name: &str,
        message_id: &str,
    ) -> Result<Option<QueueMessage>> {
        let id = MessageId::parse(message_id)?;
        let Some(broker) = self.brokers.find_broker(cluster_name, &id.broker_name).await? else {
            debug!(cluster = %cluster_name, broker = %id.broker_name, "message broker not in cluster");
            return Ok(None);
        };
        let payload = self.encode(&GetMessageDetailRequest {
            message_id: message_id.to_string(),
        })?;
        let body = self
            .gateway
            .call(
                broker.connection.as_ref(),
                BrokerRequestCode::GetMessageDetail,
                payload,
            )
            .await?;
        let messages: Vec<QueueMessage> = self.decode(&body)?;
        Ok(messages.into_iter().next())
    }

    pub async fn get_message_detail_by_queue_offset(
        &self,
        cluster_name: &str,
        broker_name: &str,
        topic: &str,
        queue_id: i32,
        queue_offset: i64,
    ) -> Result<Option<QueueMessage>> {
        let Some(broker) = self.brokers.find_broker(cluster_name, broker_name).await? else {
            return Ok(None);
        };
        let payload = self.encode(&GetMessageDetailByQueueOffsetRequest {
            topic: topic.to_string(),
            queue_id,
            queue_offset,
        })?;
        let body = self
            .gateway
            .call(
                broker.connection.as_ref(),
                BrokerRequestCode::GetMessageDetailByQueueOffset,
                payload,
            )
            .await?;
        let messages: Vec<QueueMessage> = self.decode(&body)?;
        Ok(messages.into_iter().next())
    }

    // ===== HELPERS =====

    async fn name_server_call(
        &self,
        code: NameServerRequestCode,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let name_server = self.name_servers.pick_available()?;
        self.gateway.call(name_server.as_ref(), code, payload).await
    }

    async fn name_server_request<Req, Resp>(
        &self,
        code: NameServerRequestCode,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = self.encode(request)?;
        let body = self.name_server_call(code, payload).await?;
        self.decode(&body)
    }

    async fn name_server_command<Req: Serialize + Sync>(
        &self,
        code: NameServerRequestCode,
        request: &Req,
    ) -> Result<()> {
        let payload = self.encode(request)?;
        self.name_server_call(code, payload).await?;
        Ok(())
    }

    async fn broker_connection(
        &self,
        cluster_name: &str,
        broker_name: &str,
    ) -> Result<Arc<dyn Connection>> {
        self.brokers
            .resolve(cluster_name, broker_name)
            .await?
            .ok_or_else(|| AdminError::BrokerUnavailable {
                cluster: cluster_name.to_string(),
                broker: broker_name.to_string(),
            })
    }

    async fn broker_call(
        &self,
        cluster_name: &str,
        broker_name: &str,
        code: BrokerRequestCode,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let connection = self.broker_connection(cluster_name, broker_name).await?;
        self.gateway.call(connection.as_ref(), code, payload).await
    }

    async fn broker_request<Req, Resp>(
        &self,
        cluster_name: &str,
        broker_name: &str,
        code: BrokerRequestCode,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = self.encode(request)?;
        let body = self
            .broker_call(cluster_name, broker_name, code, payload)
            .await?;
        self.decode(&body)
    }

    async fn broker_command<Req: Serialize + Sync>(
        &self,
        cluster_name: &str,
        broker_name: &str,
        code: BrokerRequestCode,
        request: &Req,
    ) -> Result<()> {
        let payload = self.encode(request)?;
        self.broker_call(cluster_name, broker_name, code, payload)
            .await?;
        Ok(())
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(self.codec.encode(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T> {
        Ok(self.codec.decode(body)?)
    }
}

fn validate_next_offset(next_offset: i64) -> Result<()> {
    if next_offset < 0 {
        return Err(AdminError::InvalidArgument(
            "next_offset cannot be smaller than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_consumer_group(consumer_group: &str) -> Result<()> {
    if consumer_group.is_empty() {
        return Err(AdminError::InvalidArgument(
            "consumer group cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn split_comma_list(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .split(',')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "admin_service_test.rs"]
mod admin_service_test;
