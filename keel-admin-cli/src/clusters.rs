use crate::output::{is_json, print_json, row, table};
use clap::{Args, Subcommand};
use keel_admin::AdminService;

#[derive(Debug, Args)]
pub(crate) struct Clusters {
    #[command(subcommand)]
    command: ClustersCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ClustersCommands {
    #[command(about = "List all clusters")]
    List {
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
}

pub async fn handle_command(clusters: Clusters, service: &AdminService) -> anyhow::Result<()> {
    match clusters.command {
        ClustersCommands::List { output } => {
            let clusters = service.get_all_clusters().await?;
            if is_json(&output) {
                print_json(&clusters)?;
            } else {
                let mut table = table(&["CLUSTER"]);
                for cluster in clusters {
                    table.add_row(row(vec![cluster]));
                }
                table.printstd();
            }
        }
    }

    Ok(())
}
