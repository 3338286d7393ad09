mod brokers;
mod client;
mod clusters;
mod consumers;
mod groups;
mod messages;
mod monitor;
mod output;
mod producers;
mod queues;
mod topics;

use brokers::Brokers;
use client::ConnectArgs;
use clusters::Clusters;
use consumers::Consumers;
use groups::Groups;
use messages::Messages;
use monitor::Monitor;
use producers::Producers;
use queues::Queues;
use topics::Topics;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "keel-admin")]
#[command(about = "CLI for administering Keel message queue clusters", long_about = None)]
struct Cli {
    #[command(flatten)]
    connect: ConnectArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "List the clusters known to the name servers")]
    Clusters(Clusters),
    #[command(about = "View brokers of a cluster")]
    Brokers(Brokers),
    #[command(about = "Manage topics of a cluster or of a single broker")]
    Topics(Topics),
    #[command(about = "Manage the queues of a topic")]
    Queues(Queues),
    #[command(about = "Manage consumer groups")]
    Groups(Groups),
    #[command(about = "List producers connected to the brokers")]
    Producers(Producers),
    #[command(about = "List consumers connected to the brokers")]
    Consumers(Consumers),
    #[command(about = "Look up stored messages")]
    Messages(Messages),
    #[command(about = "Scan for accumulated messages until interrupted")]
    Monitor(Monitor),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = client::load_config(&cli.connect)?;

    if let Commands::Monitor(monitor) = &cli.command {
        monitor.apply(&mut config);
        config.validate()?;
    }

    let service = client::connect(config).await;
    let result = match cli.command {
        Commands::Clusters(clusters) => clusters::handle_command(clusters, &service).await,
        Commands::Brokers(brokers) => brokers::handle_command(brokers, &service).await,
        Commands::Topics(topics) => topics::handle_command(topics, &service).await,
        Commands::Queues(queues) => queues::handle_command(queues, &service).await,
        Commands::Groups(groups) => groups::handle_command(groups, &service).await,
        Commands::Producers(producers) => producers::handle_command(producers, &service).await,
        Commands::Consumers(consumers) => consumers::handle_command(consumers, &service).await,
        Commands::Messages(messages) => messages::handle_command(messages, &service).await,
        Commands::Monitor(_) => monitor::run(&service).await,
    };
    service.shutdown().await;

    result
}
