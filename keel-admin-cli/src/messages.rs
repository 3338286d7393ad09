use crate::output::{is_json, print_json, row, table};
use clap::{Args, Subcommand};
use keel_admin::AdminService;
use keel_core::models::QueueMessage;

#[derive(Debug, Args)]
pub(crate) struct Messages {
    #[command(subcommand)]
    command: MessagesCommands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum MessagesCommands {
    #[command(about = "Show a message by its id")]
    Get {
        #[arg(long, help = "Message id as returned when it was sent")]
        id: String,
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
    #[command(about = "Show the message stored at a queue offset")]
    ByOffset {
        #[arg(long, help = "Cluster name")]
        cluster: String,
        #[arg(long, help = "Broker name")]
        broker: String,
        #[arg(long, help = "Topic name")]
        topic: String,
        #[arg(long, help = "Queue id")]
        queue_id: i32,
        #[arg(long, help = "Queue offset")]
        offset: i64,
        #[arg(long, value_parser = ["json"], help = "Output format: json (default: table)")]
        output: Option<String>,
    },
}

pub async fn handle_command(messages: Messages, service: &AdminService) -> anyhow::Result<()> {
    let (message, output) = match messages.command {
        MessagesCommands::Get {
            id,
            cluster,
            output,
        } => (service.get_message_detail(&cluster, &id).await?, output),
        MessagesCommands::ByOffset {
            cluster,
            broker,
            topic,
            queue_id,
            offset,
            output,
        } => (
            service
                .get_message_detail_by_queue_offset(&cluster, &broker, &topic, queue_id, offset)
                .await?,
            output,
        ),
    };

    match message {
        Some(message) if is_json(&output) => print_json(&message)?,
        Some(message) => print_message(&message),
        None => println!("Message not found"),
    }

    Ok(())
}

fn print_message(message: &QueueMessage) {
    let mut table = table(&["FIELD", "VALUE"]);
    for (field, value) in [
        ("message id", message.message_id.clone()),
        ("topic", message.topic.clone()),
        ("queue id", message.queue_id.to_string()),
        ("queue offset", message.queue_offset.to_string()),
        ("tag", message.tag.clone().unwrap_or_default()),
        ("code", message.code.to_string()),
        ("created", message.created_time.to_string()),
        ("stored", message.stored_time.to_string()),
        (
            "producer",
            message.producer_address.clone().unwrap_or_default(),
        ),
        ("body", String::from_utf8_lossy(&message.body).into_owned()),
    ] {
        table.add_row(row(vec![field.to_string(), value]));
    }
    table.printstd();
}
