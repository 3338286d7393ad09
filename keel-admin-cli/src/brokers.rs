use crate::output::{is_json, print_json, row, table};
use clap::{Args, Subcommand};
use keel_admin::AdminService;

#[derive(Debug, Args)]
pub(crate) struct Brokers {
    #[command(subcommand)]
    command: BrokersCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum BrokersCommands {
    #[command(about = "List the brokers of a cluster with their status")]
    List {
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Only brokers hosting this topic")]
        topic: Option<String>,
        #[arg(long, default_value_t = false, help = "Only master brokers")]
        only_master: bool,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
    #[command(about = "Show the statistics of one broker")]
    Stats {
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Broker name")]
        broker: String,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
    #[command(about = "List the ids of the messages a broker stored most recently")]
    LatestMessages {
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Broker name")]
        broker: String,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: plain)")]
        output: Option<String>,
    },
}

pub async fn handle_command(brokers: Brokers, service: &AdminService) -> anyhow::Result<()> {
    match brokers.command {
        BrokersCommands::List {
            cluster,
            topic,
            only_master,
            output,
        } => {
            let brokers = service
                .get_cluster_broker_status_info_list(&cluster, topic.as_deref(), only_master)
                .await?;
            if is_json(&output) {
                print_json(&brokers)?;
            } else {
                let mut table = table(&[
                    "BROKER",
                    "GROUP",
                    "ROLE",
                    "ADMIN ADDRESS",
                    "SEND TPS",
                    "CONSUME TPS",
                    "UNCONSUMED",
                ]);
                for status in brokers {
                    let info = &status.broker_info;
                    table.add_row(row(vec![
                        info.broker_name.clone(),
                        info.group_name.clone(),
                        format!("{:?}", info.role),
                        info.admin_address.to_string(),
                        status.total_send_throughput.to_string(),
                        status.total_consume_throughput.to_string(),
                        status.total_unconsumed_message_count.to_string(),
                    ]));
                }
                table.printstd();
            }
        }
        BrokersCommands::Stats {
            cluster,
            broker,
            output,
        } => {
            let stats = service.query_broker_statistic_info(&cluster, &broker).await?;
            if is_json(&output) {
                print_json(&stats)?;
            } else {
                let mut table = table(&["METRIC", "VALUE"]);
                for (name, value) in [
                    ("topics", stats.topic_count.to_string()),
                    ("queues", stats.queue_count.to_string()),
                    ("unconsumed", stats.total_unconsumed_message_count.to_string()),
                    ("consumer groups", stats.consumer_group_count.to_string()),
                    ("producers", stats.producer_count.to_string()),
                    ("consumers", stats.consumer_count.to_string()),
                    ("chunks", stats.message_chunk_count.to_string()),
                    ("min chunk", stats.message_min_chunk_num.to_string()),
                    ("max chunk", stats.message_max_chunk_num.to_string()),
                    ("send tps", stats.total_send_throughput.to_string()),
                    ("consume tps", stats.total_consume_throughput.to_string()),
                ] {
                    table.add_row(row(vec![name.to_string(), value]));
                }
                table.printstd();
            }
        }
        BrokersCommands::LatestMessages {
            cluster,
            broker,
            output,
        } => {
            let ids = service.get_latest_send_messages(&cluster, &broker).await?;
            if is_json(&output) {
                print_json(&ids)?;
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
        }
    }

    Ok(())
}
