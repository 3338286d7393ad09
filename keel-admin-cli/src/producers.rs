use crate::output::{is_json, print_json, row, table};
use clap::{Args, Subcommand};
use keel_admin::AdminService;

#[derive(Debug, Args)]
pub(crate) struct Producers {
    #[command(subcommand)]
    command: ProducersCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ProducersCommands {
    #[command(about = "List the producers connected to the brokers of a cluster")]
    List {
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
}

pub async fn handle_command(producers: Producers, service: &AdminService) -> anyhow::Result<()> {
    match producers.command {
        ProducersCommands::List {
            cluster,
            broker,
            output,
        } => {
            let producers: Vec<(String, String)> = match broker {
                Some(broker) => service
                    .get_producer_info_list_on_broker(&cluster, &broker)
                    .await?
                    .into_iter()
                    .map(|p| (broker.clone(), p))
                    .collect(),
                None => service
                    .get_producer_info_list(&cluster)
                    .await?
                    .into_iter()
                    .flat_map(|b| {
                        let name = b.broker_info.broker_name;
                        b.producer_list.into_iter().map(move |p| (name.clone(), p))
                    })
                    .collect(),
            };
            if is_json(&output) {
                let serializable: Vec<serde_json::Value> = producers
                    .iter()
                    .map(|(broker, id)| serde_json::json!({ "broker": broker, "producer_id": id }))
                    .collect();
                print_json(&serializable)?;
            } else {
                let mut table = table(&["BROKER", "PRODUCER ID"]);
                for (broker, id) in producers {
                    table.add_row(row(vec![broker, id]));
                }
                table.printstd();
            }
        }
    }

    Ok(())
}
