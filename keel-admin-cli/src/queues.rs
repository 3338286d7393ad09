use clap::{Args, Subcommand};
use keel_admin::AdminService;

#[derive(Debug, Args)]
pub(crate) struct Queues {
    #[command(subcommand)]
    command: QueuesCommands,
}

#[derive(Debug, Args)]
pub(crate) struct QueueTarget {
    #[arg(help = "Topic name")]
    topic: String,
    #[arg(long, help = "Cluster name")]
    cluster: String,
    #[arg(long, help = "Restrict to this broker")]
    broker: Option<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum QueuesCommands {
    #[command(about = "Add a queue to a topic")]
    Add {
        #[command(flatten)]
        target: QueueTarget,
    },
    #[command(about = "Delete a queue of a topic")]
    Delete {
        #[command(flatten)]
        target: QueueTarget,
        #[arg(long, help = "Queue id")]
        queue_id: i32,
    },
    #[command(about = "Allow or forbid producers to send to a queue")]
    ProducerVisible {
        #[command(flatten)]
        target: QueueTarget,
        #[arg(long, help = "Queue id")]
        queue_id: i32,
        #[arg(long, action = clap::ArgAction::Set, help = "true or false")]
        visible: bool,
    },
    #[command(about = "Allow or forbid consumers to read from a queue")]
    ConsumerVisible {
        #[command(flatten)]
        target: QueueTarget,
        #[arg(long, help = "Queue id")]
        queue_id: i32,
        #[arg(long, action = clap::ArgAction::Set, help = "true or false")]
        visible: bool,
    },
    #[command(about = "Move the next consume offset of a consumer group on a queue")]
    ResetOffset {
        #[command(flatten)]
        target: QueueTarget,
        #[arg(long, help = "Consumer group")]
        group: String,
        #[arg(long, help = "Queue id")]
        queue_id: i32,
        #[arg(long, help = "Offset the group consumes next")]
        offset: i64,
    },
}

pub async fn handle_command(queues: Queues, service: &AdminService) -> anyhow::Result<()> {
    match queues.command {
        QueuesCommands::Add { target } => {
            let QueueTarget {
                topic,
                cluster,
                broker,
            } = target;
            match broker {
                Some(broker) => service.add_queue_on_broker(&cluster, &broker, &topic).await?,
                None => service.add_queue(&cluster, &topic).await?,
            }
            println!("Queue added to topic: {}", topic);
        }
        QueuesCommands::Delete { target, queue_id } => {
            let QueueTarget {
                topic,
                cluster,
                broker,
            } = target;
            match broker {
                Some(broker) => {
                    service
                        .delete_queue_on_broker(&cluster, &broker, &topic, queue_id)
                        .await?
                }
                None => service.delete_queue(&cluster, &topic, queue_id).await?,
            }
            println!("Queue {} deleted from topic: {}", queue_id, topic);
        }
        QueuesCommands::ProducerVisible {
            target,
            queue_id,
            visible,
        } => {
            let QueueTarget {
                topic,
                cluster,
                broker,
            } = target;
            match broker {
                Some(broker) => {
                    service
                        .set_queue_producer_visible_on_broker(
                            &cluster, &broker, &topic, queue_id, visible,
                        )
                        .await?
                }
                None => {
                    service
                        .set_queue_producer_visible(&cluster, &topic, queue_id, visible)
                        .await?
                }
            }
            println!("Queue {} of {} producer visible: {}", queue_id, topic, visible);
        }
        QueuesCommands::ConsumerVisible {
            target,
            queue_id,
            visible,
        } => {
            let QueueTarget {
                topic,
                cluster,
                broker,
            } = target;
            match broker {
                Some(broker) => {
                    service
                        .set_queue_consumer_visible_on_broker(
                            &cluster, &broker, &topic, queue_id, visible,
                        )
                        .await?
                }
                None => {
                    service
                        .set_queue_consumer_visible(&cluster, &topic, queue_id, visible)
                        .await?
                }
            }
            println!("Queue {} of {} consumer visible: {}", queue_id, topic, visible);
        }
        QueuesCommands::ResetOffset {
            target,
            group,
            queue_id,
            offset,
        } => {
            let QueueTarget {
                topic,
                cluster,
                broker,
            } = target;
            match broker {
                Some(broker) => {
                    service
                        .set_queue_next_consume_offset_on_broker(
                            &cluster, &broker, &group, &topic, queue_id, offset,
                        )
                        .await?
                }
                None => {
                    service
                        .set_queue_next_consume_offset(&cluster, &group, &topic, queue_id, offset)
                        .await?
                }
            }
            println!(
                "Next consume offset of {} on queue {} of {}: {}",
                group, queue_id, topic, offset
            );
        }
    }

    Ok(())
}
