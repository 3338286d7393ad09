use clap::{Args, Subcommand};
use keel_admin::AdminService;

#[derive(Debug, Args)]
pub(crate) struct Groups {
    #[command(subcommand)]
    command: GroupsCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum GroupsCommands {
    #[command(about = "Delete a consumer group and its consume offsets")]
    Delete {
        #[arg(help = "Consumer group")]
        group: String,
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Restrict to this broker")]
        broker: Option<String>,
    },
}

pub async fn handle_command(groups: Groups, service: &AdminService) -> anyhow::Result<()> {
    match groups.command {
        GroupsCommands::Delete {
            group,
            cluster,
            broker,
        } => {
            match broker {
                Some(broker) => {
                    service
                        .delete_consumer_group_on_broker(&cluster, &broker, &group)
                        .await?
                }
                None => service.delete_consumer_group(&cluster, &group).await?,
            }
            println!("Consumer group deleted: {}", group);
        }
    }

    Ok(())
}
