use super::*;
use crate::test_support::{broker_info, handler, json, MockConnectionFactory};
use keel_core::{Endpoint, RemotingResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct RecordingScheduler {
    scheduled: Mutex<Vec<(String, ScheduledAction, Duration, Duration)>>,
    shutdowns: AtomicUsize,
}

impl Scheduler for RecordingScheduler {
    fn run_periodically(
        &self,
        name: &str,
        action: ScheduledAction,
        initial_delay: Duration,
        interval: Duration,
    ) {
        self.scheduled
            .lock()
            .unwrap()
            .push((name.to_string(), action, initial_delay, interval));
    }

    fn stop(&self, _name: &str) -> bool {
        false
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

fn message(id: &str) -> QueueMessage {
    QueueMessage {
        message_id: id.to_string(),
        topic: "orders".to_string(),
        queue_id: 2,
        queue_offset: 42,
        tag: None,
        code: 0,
        body: b"payload".to_vec(),
        created_time: 1_700_000_000_000,
        stored_time: 1_700_000_000_005,
        producer_address: Some("10.0.0.7:5000".to_string()),
    }
}

struct Fixture {
    factory: Arc<MockConnectionFactory>,
    name_server: Endpoint,
    broker: Endpoint,
    scheduler: Arc<RecordingScheduler>,
    service: AdminService,
}

impl Fixture {
    async fn new(monitor_enabled: bool) -> Self {
        let factory = Arc::new(MockConnectionFactory::new());
        let name_server = Endpoint::new("ns1", 9493);
        let info = broker_info("C1", "B", 10000);
        let broker = info.admin_address.clone();

        factory.set_handler(
            name_server.clone(),
            handler(move |req| {
                let response = match req.code {
                    c if c == NameServerRequestCode::GetClusterBrokers as i32 => {
                        RemotingResponse::success(json(&vec![info.clone()]))
                    }
                    c if c == NameServerRequestCode::GetAllClusters as i32 => {
                        RemotingResponse::success(json(&vec!["C1", "C2"]))
                    }
                    c if c == NameServerRequestCode::GetTopicAccumulateInfoList as i32 => {
                        RemotingResponse::success(json(&Vec::<TopicAccumulateInfo>::new()))
                    }
                    c if c == NameServerRequestCode::DeleteTopic as i32 => {
                        RemotingResponse::failed("topic not exist")
                    }
                    _ => RemotingResponse::success(Vec::new()),
                };
                Some(response)
            }),
        );
        factory.set_handler(
            broker.clone(),
            handler(|req| {
                let response = match req.code {
                    c if c == BrokerRequestCode::GetProducerList as i32 => {
                        RemotingResponse::success(b"p1,,p2,".to_vec())
                    }
                    c if c == BrokerRequestCode::GetMessageDetail as i32 => {
                        let request: GetMessageDetailRequest =
                            serde_json::from_slice(&req.body).unwrap();
                        RemotingResponse::success(json(&vec![message(&request.message_id)]))
                    }
                    c if c == BrokerRequestCode::GetMessageDetailByQueueOffset as i32 => {
                        RemotingResponse::success(json(&Vec::<QueueMessage>::new()))
                    }
                    _ => RemotingResponse::success(Vec::new()),
                };
                Some(response)
            }),
        );

        let mut config = AdminConfig::new(vec![name_server.clone()]);
        config.monitor.enabled = monitor_enabled;
        let scheduler = Arc::new(RecordingScheduler::default());
        let service = AdminService::new(
            config,
            factory.clone(),
            Arc::new(LogNotifier),
            scheduler.clone(),
        );
        service.start().await;

        Fixture {
            factory,
            name_server,
            broker,
            scheduler,
            service,
        }
    }

    fn name_server_requests(&self) -> Vec<keel_core::RemotingRequest> {
        self.factory.created_for(&self.name_server)[0].requests()
    }

    fn broker_requests(&self) -> Vec<keel_core::RemotingRequest> {
        self.factory
            .created_for(&self.broker)
            .iter()
            .flat_map(|c| c.requests())
            .collect()
    }
}

#[tokio::test]
async fn cluster_list_goes_to_a_name_server_with_empty_body() {
    let fx = Fixture::new(false).await;

    let clusters = fx.service.get_all_clusters().await.unwrap();
    assert_eq!(clusters, vec!["C1".to_string(), "C2".to_string()]);

    let requests = fx.name_server_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].code, NameServerRequestCode::GetAllClusters as i32);
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn remote_failure_text_is_kept() {
    let fx = Fixture::new(false).await;

    let err = fx.service.delete_topic("C1", "orders").await.unwrap_err();
    match err {
        AdminError::RemoteError {
            request_code,
            message,
        } => {
            assert_eq!(request_code, NameServerRequestCode::DeleteTopic as i32);
            assert_eq!(message, "topic not exist");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_any_request() {
    let fx = Fixture::new(false).await;

    let err = fx
        .service
        .set_queue_next_consume_offset("C1", "g1", "orders", 0, -1)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidArgument(_)));

    let err = fx
        .service
        .delete_consumer_group_on_broker("C1", "B", "")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidArgument(_)));

    assert!(fx.name_server_requests().is_empty());
    assert!(fx.factory.created_for(&fx.broker).is_empty());
}

#[tokio::test]
async fn cluster_request_carries_typed_payload() {
    let fx = Fixture::new(false).await;

    fx.service
        .set_queue_next_consume_offset("C1", "g1", "orders", 3, 120)
        .await
        .unwrap();

    let requests = fx.name_server_requests();
    assert_eq!(
        requests[0].code,
        NameServerRequestCode::SetQueueNextConsumeOffset as i32
    );
    let sent: SetQueueNextConsumeOffsetForClusterRequest =
        serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent.cluster_name, "C1");
    assert_eq!(sent.consumer_group, "g1");
    assert_eq!(sent.queue_id, 3);
    assert_eq!(sent.next_offset, 120);
}

#[tokio::test]
async fn broker_producer_list_drops_empty_entries() {
    let fx = Fixture::new(false).await;

    let producers = fx
        .service
        .get_producer_info_list_on_broker("C1", "B")
        .await
        .unwrap();
    assert_eq!(producers, vec!["p1".to_string(), "p2".to_string()]);
    assert_eq!(
        fx.broker_requests()[0].code,
        BrokerRequestCode::GetProducerList as i32
    );
}

#[tokio::test]
async fn unknown_broker_is_unavailable() {
    let fx = Fixture::new(false).await;

    let err = fx
        .service
        .delete_topic_on_broker("C1", "Z", "orders")
        .await
        .unwrap_err();
    match err {
        AdminError::BrokerUnavailable { cluster, broker } => {
            assert_eq!(cluster, "C1");
            assert_eq!(broker, "Z");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn message_detail_is_asked_of_the_owning_broker() {
    let fx = Fixture::new(false).await;
    let id = MessageId::new("B", 0x2a).to_string();

    let found = fx.service.get_message_detail("C1", &id).await.unwrap();
    assert_eq!(found, Some(message(&id)));

    let requests = fx.broker_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].code, BrokerRequestCode::GetMessageDetail as i32);
}

#[tokio::test]
async fn message_detail_of_foreign_broker_is_none() {
    let fx = Fixture::new(false).await;
    let id = MessageId::new("other", 7).to_string();

    assert_eq!(fx.service.get_message_detail("C1", &id).await.unwrap(), None);
    assert!(fx.broker_requests().is_empty());

    let err = fx
        .service
        .get_message_detail("C1", "not-an-id")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidMessageId(_)));
}

#[tokio::test]
async fn message_by_offset_with_empty_answer_is_none() {
    let fx = Fixture::new(false).await;

    let found = fx
        .service
        .get_message_detail_by_queue_offset("C1", "B", "orders", 2, 42)
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn start_schedules_scan_only_when_enabled() {
    let disabled = Fixture::new(false).await;
    assert!(disabled.scheduler.scheduled.lock().unwrap().is_empty());

    let fx = Fixture::new(true).await;
    let action = {
        let scheduled = fx.scheduler.scheduled.lock().unwrap();
        assert_eq!(scheduled.len(), 1);
        let (name, action, initial_delay, interval) = &scheduled[0];
        assert_eq!(name, SCAN_TASK_NAME);
        assert_eq!(*initial_delay, Duration::from_millis(1000));
        assert_eq!(*interval, Duration::from_secs(60));
        Arc::clone(action)
    };

    action().await;
    let requests = fx.name_server_requests();
    assert_eq!(
        requests[0].code,
        NameServerRequestCode::GetTopicAccumulateInfoList as i32
    );
    let sent: GetTopicAccumulateInfoListRequest =
        serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent.accumulate_threshold, 10_000);
}

#[tokio::test]
async fn shutdown_stops_scheduler_and_connections() {
    let fx = Fixture::new(true).await;
    fx.service
        .add_queue_on_broker("C1", "B", "orders")
        .await
        .unwrap();

    fx.service.shutdown().await;

    assert_eq!(fx.scheduler.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(fx.factory.created_for(&fx.broker)[0].shutdowns(), 1);
    assert_eq!(fx.factory.created_for(&fx.name_server)[0].shutdowns(), 1);
    assert!(fx.service.brokers().cached("C1").is_none());
}

#[tokio::test]
async fn no_connected_name_server_is_reported() {
    let fx = Fixture::new(false).await;
    fx.factory.created_for(&fx.name_server)[0].set_connected(false);

    let err = fx.service.get_all_clusters().await.unwrap_err();
    assert!(matches!(err, AdminError::NoAvailableEndpoint));
}
