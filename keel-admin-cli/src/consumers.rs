use crate::output::{is_json, print_json, row, table};
use clap::{Args, Subcommand};
use keel_admin::AdminService;
use keel_core::models::ConsumerInfo;

#[derive(Debug, Args)]
pub(crate) struct Consumers {
    #[command(subcommand)]
    command: ConsumersCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ConsumersCommands {
    #[command(about = "List the consumers of a group on a topic")]
    List {
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Consumer group")]
        group: String,
        #[arg(long, help = "Topic name")]
        topic: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
}

pub async fn handle_command(consumers: Consumers, service: &AdminService) -> anyhow::Result<()> {
    match consumers.command {
        ConsumersCommands::List {
            cluster,
            group,
            topic,
            broker,
            output,
        } => {
            let consumers: Vec<(String, ConsumerInfo)> = match broker {
                Some(broker) => service
                    .get_consumer_info_list_on_broker(&cluster, &broker, &group, &topic)
                    .await?
                    .into_iter()
                    .map(|c| (broker.clone(), c))
                    .collect(),
                None => service
                    .get_consumer_info_list(&cluster, &group, &topic)
                    .await?
                    .into_iter()
                    .flat_map(|b| {
                        let name = b.broker_info.broker_name;
                        b.consumer_list.into_iter().map(move |c| (name.clone(), c))
                    })
                    .collect(),
            };
            if is_json(&output) {
                let serializable: Vec<serde_json::Value> = consumers
                    .iter()
                    .map(|(broker, c)| serde_json::json!({ "broker": broker, "consumer": c }))
                    .collect();
                print_json(&serializable)?;
            } else {
                let mut table = table(&[
                    "BROKER",
                    "CONSUMER ID",
                    "QUEUE",
                    "CURRENT OFFSET",
                    "CONSUMED OFFSET",
                    "NOT CONSUMED",
                ]);
                for (broker, c) in consumers {
                    table.add_row(row(vec![
                        broker,
                        c.consumer_id,
                        c.queue_id.to_string(),
                        c.queue_current_offset.to_string(),
                        c.consumed_offset.to_string(),
                        c.queue_not_consume_count.to_string(),
                    ]));
                }
                table.printstd();
            }
        }
    }

    Ok(())
}
