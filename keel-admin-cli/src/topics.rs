use crate::output::{is_json, print_json, row, table};
use clap::{Args, Subcommand};
use keel_admin::AdminService;
use keel_core::models::{TopicConsumeInfo, TopicQueueInfo};

#[derive(Debug, Args)]
pub(crate) struct Topics {
    #[command(subcommand)]
    command: TopicsCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum TopicsCommands {
    #[command(about = "Create a topic on every broker of the cluster, or on one broker")]
    Create {
        #[arg(help = "Topic name")]
        topic: String,
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
        #[arg(long, help = "Number of queues created with the topic")]
        queue_count: Option<i32>,
    },
    #[command(about = "Delete a topic")]
    Delete {
        #[arg(help = "Topic name")]
        topic: String,
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
    },
    #[command(about = "Show the queues of a topic")]
    Queues {
        #[arg(help = "Topic name")]
        topic: String,
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
    #[command(about = "Show how far a consumer group has consumed a topic")]
    ConsumeInfo {
        #[arg(help = "Topic name")]
        topic: String,
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Consumer group")]
        group: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
}

pub async fn handle_command(topics: Topics, service: &AdminService) -> anyhow::Result<()> {
    match topics.command {
        TopicsCommands::Create {
            topic,
            cluster,
            broker,
            queue_count,
        } => {
            match broker {
                Some(broker) => {
                    service
                        .create_topic_on_broker(&cluster, &broker, &topic, queue_count)
                        .await?
                }
                None => service.create_topic(&cluster, &topic, queue_count).await?,
            }
            println!("Topic Created: {}", topic);
        }
        TopicsCommands::Delete {
            topic,
            cluster,
            broker,
        } => {
            match broker {
                Some(broker) => service.delete_topic_on_broker(&cluster, &broker, &topic).await?,
                None => service.delete_topic(&cluster, &topic).await?,
            }
            println!("Topic Deleted: {}", topic);
        }
        TopicsCommands::Queues {
            topic,
            cluster,
            broker,
            output,
        } => {
            let queues: Vec<(String, TopicQueueInfo)> = match broker {
                Some(broker) => service
                    .get_topic_queue_info_list_on_broker(&cluster, &broker, &topic)
                    .await?
                    .into_iter()
                    .map(|q| (broker.clone(), q))
                    .collect(),
                None => service
                    .get_topic_queue_info_list(&cluster, &topic)
                    .await?
                    .into_iter()
                    .flat_map(|b| {
                        let name = b.broker_info.broker_name;
                        b.topic_queue_info_list
                            .into_iter()
                            .map(move |q| (name.clone(), q))
                    })
                    .collect(),
            };
            if is_json(&output) {
                let serializable: Vec<serde_json::Value> = queues
                    .iter()
                    .map(|(broker, q)| serde_json::json!({ "broker": broker, "queue": q }))
                    .collect();
                print_json(&serializable)?;
            } else {
                let mut table = table(&[
                    "BROKER",
                    "QUEUE",
                    "CURRENT OFFSET",
                    "MIN OFFSET",
                    "MIN CONSUMED",
                    "PRODUCER VISIBLE",
                    "CONSUMER VISIBLE",
                    "SEND TPS",
                ]);
                for (broker, q) in queues {
                    table.add_row(row(vec![
                        broker,
                        q.queue_id.to_string(),
                        q.queue_current_offset.to_string(),
                        q.queue_min_offset.to_string(),
                        q.queue_min_consumed_offset.to_string(),
                        q.producer_visible.to_string(),
                        q.consumer_visible.to_string(),
                        q.send_throughput.to_string(),
                    ]));
                }
                table.printstd();
            }
        }
        TopicsCommands::ConsumeInfo {
            topic,
            cluster,
            group,
            broker,
            output,
        } => {
            let infos: Vec<(String, TopicConsumeInfo)> = match broker {
                Some(broker) => service
                    .get_topic_consume_info_list_on_broker(&cluster, &broker, &group, &topic)
                    .await?
                    .into_iter()
                    .map(|c| (broker.clone(), c))
                    .collect(),
                None => service
                    .get_topic_consume_info_list(&cluster, &group, &topic)
                    .await?
                    .into_iter()
                    .flat_map(|b| {
                        let name = b.broker_info.broker_name;
                        b.topic_consume_info_list
                            .into_iter()
                            .map(move |c| (name.clone(), c))
                    })
                    .collect(),
            };
            if is_json(&output) {
                let serializable: Vec<serde_json::Value> = infos
                    .iter()
                    .map(|(broker, c)| serde_json::json!({ "broker": broker, "consume": c }))
                    .collect();
                print_json(&serializable)?;
            } else {
                let mut table = table(&[
                    "BROKER",
                    "GROUP",
                    "QUEUE",
                    "CURRENT OFFSET",
                    "CONSUMED OFFSET",
                    "NOT CONSUMED",
                    "ONLINE CONSUMERS",
                    "CONSUME TPS",
                ]);
                for (broker, c) in infos {
                    table.add_row(row(vec![
                        broker,
                        c.consumer_group,
                        c.queue_id.to_string(),
                        c.queue_current_offset.to_string(),
                        c.consumed_offset.to_string(),
                        c.queue_not_consume_count.to_string(),
                        c.online_consumer_count.to_string(),
                        c.consume_throughput.to_string(),
                    ]));
                }
                table.printstd();
            }
        }
    }

    Ok(())
}
