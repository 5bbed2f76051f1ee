use anyhow::Context;
use clap::Parser;
use event_relay_lambda::adapters::queue::SqsQueueClient;
use event_relay_lambda::config::{load_aws_config, DEFAULT_REGION};
use event_relay_lambda::handlers::dispatcher::{
    DispatcherConfig, QueueDispatcher, UnknownEventPolicy, DEFAULT_MAX_MESSAGES,
    DEFAULT_WAIT_TIME_SECONDS,
};
use event_relay_lambda::handlers::events::LoggingEventHandler;
use event_relay_lambda::telemetry;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "subscriber",
    about = "Poll a queue subscribed to the event topic and dispatch each event"
)]
struct Cli {
    /// URL of the queue subscribed to the topic
    #[arg(long, env = "QUEUE_URL")]
    queue_url: String,
    /// Region of the queue
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,
    /// Messages requested per receive call (1-10)
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_MESSAGES,
        value_parser = clap::value_parser!(i32).range(1..=10)
    )]
    max_messages: i32,
    /// Long-poll wait per receive call, in seconds (0-20)
    #[arg(
        long,
        default_value_t = DEFAULT_WAIT_TIME_SECONDS,
        value_parser = clap::value_parser!(i32).range(0..=20)
    )]
    wait_time_seconds: i32,
    /// Leave messages with unknown event types in the queue instead of deleting them
    #[arg(long)]
    retain_unknown: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let aws_config = load_aws_config(&cli.region).await;
    let queue = SqsQueueClient::new(aws_sdk_sqs::Client::new(&aws_config), cli.queue_url);
    tracing::info!(queue_url = queue.queue_url(), "initialized queue client");

    let config = DispatcherConfig {
        max_messages: cli.max_messages,
        wait_time_seconds: cli.wait_time_seconds,
        unknown_event_policy: if cli.retain_unknown {
            UnknownEventPolicy::Retain
        } else {
            UnknownEventPolicy::Delete
        },
    };
    let dispatcher = QueueDispatcher::new(queue, LoggingEventHandler, config);

    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested; finishing current batch");
                stop.cancel();
            }
        }
    });

    tokio::task::spawn_blocking(move || dispatcher.run(&stop))
        .await
        .context("queue dispatcher panicked")?;

    Ok(())
}
