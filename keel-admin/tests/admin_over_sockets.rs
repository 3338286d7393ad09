//! Drives `AdminService` over real TCP connections against in-process
//! name server and broker stand-ins speaking the frame format.

use async_trait::async_trait;
use keel_admin::{
    AccumulationNotifier, AdminConfig, AdminError, AdminService, ScanOutcome, TokioScheduler,
};
use keel_core::{
    frame::{read_request, write_response, ResponseFrame},
    models::{BrokerInfo, BrokerRole, BrokerStatisticInfo, TopicAccumulateInfo},
    BrokerRequestCode, Endpoint, NameServerRequestCode, RemotingResponse, SocketConnectionFactory,
    SocketSetting,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const MAX_FRAME: usize = 1024 * 1024;

type Reply = Arc<dyn Fn(i32, &[u8]) -> RemotingResponse + Send + Sync>;

async fn spawn_server(reply: Reply) -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let reply = Arc::clone(&reply);
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.into_split();
                while let Ok(Some(request)) = read_request(&mut reader, MAX_FRAME).await {
                    let response = reply(request.code, &request.body);
                    let frame = ResponseFrame {
                        correlation_id: request.correlation_id,
                        status: response.status,
                        body: response.body,
                    };
                    if write_response(&mut writer, &frame, MAX_FRAME).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    Endpoint::new("127.0.0.1", port)
}

fn broker_info(admin_address: Endpoint) -> BrokerInfo {
    BrokerInfo {
        broker_name: "broker-a".to_string(),
        group_name: "group-a".to_string(),
        cluster_name: "C1".to_string(),
        role: BrokerRole::Master,
        producer_address: Endpoint::new("127.0.0.1", 1),
        consumer_address: Endpoint::new("127.0.0.1", 2),
        admin_address,
    }
}

fn statistics(info: BrokerInfo) -> BrokerStatisticInfo {
    BrokerStatisticInfo {
        broker_info: info,
        topic_count: 3,
        queue_count: 12,
        total_unconsumed_message_count: 1500,
        consumer_group_count: 2,
        producer_count: 1,
        consumer_count: 4,
        message_chunk_count: 8,
        message_min_chunk_num: 0,
        message_max_chunk_num: 7,
        total_send_throughput: 100,
        total_consume_throughput: 90,
    }
}

#[derive(Default)]
struct RecordingNotifier {
    topics: Mutex<Vec<String>>,
}

#[async_trait]
impl AccumulationNotifier for RecordingNotifier {
    async fn notify(&self, info: &TopicAccumulateInfo) {
        self.topics.lock().unwrap().push(info.topic.clone());
    }
}

struct Cluster {
    service: AdminService,
    notifier: Arc<RecordingNotifier>,
    directory_queries: Arc<AtomicUsize>,
}

async fn cluster() -> Cluster {
    let broker_endpoint = spawn_server(Arc::new(|code, _body| {
        if code == BrokerRequestCode::GetBrokerStatisticInfo as i32 {
            // the broker does not know its own listen port here, any info will do
            let info = broker_info(Endpoint::new("127.0.0.1", 0));
            RemotingResponse::success(serde_json::to_vec(&statistics(info)).unwrap())
        } else {
            RemotingResponse::failed("topic not exist")
        }
    }))
    .await;

    let directory_queries = Arc::new(AtomicUsize::new(0));
    let queries = Arc::clone(&directory_queries);
    let info = broker_info(broker_endpoint);
    let name_server = spawn_server(Arc::new(move |code, body| {
        if code == NameServerRequestCode::GetClusterBrokers as i32 {
            queries.fetch_add(1, Ordering::SeqCst);
            RemotingResponse::success(serde_json::to_vec(&vec![info.clone()]).unwrap())
        } else if code == NameServerRequestCode::GetTopicAccumulateInfoList as i32 {
            let request: serde_json::Value = serde_json::from_slice(body).unwrap();
            assert_eq!(request["accumulate_threshold"], 1000);
            let findings = vec![TopicAccumulateInfo {
                topic: "orders".to_string(),
                cluster_name: "C1".to_string(),
                accumulate_count: 1500,
                queue_count: 4,
                consumer_group: Some("billing".to_string()),
            }];
            RemotingResponse::success(serde_json::to_vec(&findings).unwrap())
        } else {
            RemotingResponse::failed("unsupported request")
        }
    }))
    .await;

    let mut config = AdminConfig::new(vec![name_server]);
    config.request_timeout_ms = 2000;
    config.monitor.accumulate_threshold = 1000;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = AdminService::new(
        config,
        Arc::new(SocketConnectionFactory::new(SocketSetting::default())),
        notifier.clone(),
        Arc::new(TokioScheduler::new()),
    );
    service.start().await;

    Cluster {
        service,
        notifier,
        directory_queries,
    }
}

#[tokio::test]
async fn broker_request_travels_through_discovered_connection() {
    let cluster = cluster().await;

    let stats = cluster
        .service
        .query_broker_statistic_info("C1", "broker-a")
        .await
        .unwrap();
    assert_eq!(stats.topic_count, 3);
    assert_eq!(stats.total_unconsumed_message_count, 1500);

    // second call is served from the cached topology
    cluster
        .service
        .query_broker_statistic_info("C1", "broker-a")
        .await
        .unwrap();
    assert_eq!(cluster.directory_queries.load(Ordering::SeqCst), 1);

    cluster.service.shutdown().await;
}

#[tokio::test]
async fn remote_diagnostic_reaches_the_caller() {
    let cluster = cluster().await;

    let err = cluster
        .service
        .delete_topic_on_broker("C1", "broker-a", "orders")
        .await
        .unwrap_err();
    assert_eq!(err.remote_message(), Some("topic not exist"));

    let err = cluster.service.get_all_clusters().await.unwrap_err();
    assert_eq!(err.remote_message(), Some("unsupported request"));

    cluster.service.shutdown().await;
}

#[tokio::test]
async fn unknown_broker_refreshes_once_and_is_unavailable() {
    let cluster = cluster().await;

    let err = cluster
        .service
        .query_broker_statistic_info("C1", "broker-z")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::BrokerUnavailable { .. }));
    assert_eq!(cluster.directory_queries.load(Ordering::SeqCst), 1);

    cluster.service.shutdown().await;
}

#[tokio::test]
async fn accumulation_scan_notifies_over_the_wire() {
    let cluster = cluster().await;

    let outcome = cluster.service.monitor().scan().await;
    assert_eq!(outcome, ScanOutcome::Completed { notified: 1 });
    assert_eq!(*cluster.notifier.topics.lock().unwrap(), vec!["orders".to_string()]);

    cluster.service.shutdown().await;
}
