use anyhow::Context;
use clap::{Parser, Subcommand};
use event_relay_lambda::adapters::topic::SnsTopicPublisher;
use event_relay_lambda::config::{load_aws_config, DEFAULT_REGION};
use event_relay_lambda::handlers::publisher::{EventPublisher, PublishReceipt};
use event_relay_lambda::telemetry;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "publisher", about = "Publish a single event envelope to a topic")]
struct Cli {
    /// ARN of the destination topic (FIFO for payment events)
    #[arg(long, env = "TOPIC_ARN")]
    topic_arn: String,
    /// Region of the topic
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish an order_created event
    Order {
        /// JSON payload; defaults to a sample order
        #[arg(long)]
        payload: Option<String>,
    },
    /// Publish a payment_processed event to an ordered topic
    Payment {
        /// JSON payload
        #[arg(long)]
        payload: String,
    },
    /// Publish a system_alert event
    Alert {
        /// JSON payload
        #[arg(long)]
        payload: String,
    },
}

fn sample_order() -> Value {
    json!({
        "order_id": "ORD-001",
        "customer_id": "CUST-123",
        "amount": 199.99,
        "currency": "USD",
        "items": [
            {"product_id": "PROD-1", "quantity": 2, "price": 99.99}
        ],
        "priority": "high",
        "customer_tier": "premium"
    })
}

fn parse_payload(payload: &str) -> anyhow::Result<Value> {
    serde_json::from_str(payload).context("payload must be valid JSON")
}

fn publish(
    publisher: &EventPublisher<SnsTopicPublisher>,
    topic_arn: &str,
    command: Commands,
) -> anyhow::Result<PublishReceipt> {
    match command {
        Commands::Order { payload } => {
            let data = match payload {
                Some(payload) => parse_payload(&payload)?,
                None => sample_order(),
            };
            publisher.publish_order_event(topic_arn, data)
        }
        Commands::Payment { payload } => {
            publisher.publish_payment_event(topic_arn, parse_payload(&payload)?)
        }
        Commands::Alert { payload } => {
            publisher.publish_system_alert(topic_arn, parse_payload(&payload)?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let aws_config = load_aws_config(&cli.region).await;
    let publisher = EventPublisher::new(SnsTopicPublisher::new(aws_sdk_sns::Client::new(
        &aws_config,
    )));

    let topic_arn = cli.topic_arn;
    let command = cli.command;
    let receipt = tokio::task::spawn_blocking(move || publish(&publisher, &topic_arn, command))
        .await
        .context("publisher task panicked")??;

    println!("{}", json!({"message_id": receipt.message_id, "event_id": receipt.event_id}));
    Ok(())
}
