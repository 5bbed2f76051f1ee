use event_relay_lambda::handlers::events::LoggingEventHandler;
use event_relay_lambda::handlers::notification::handle_topic_event;
use event_relay_lambda::handlers::InvocationResponse;
use event_relay_lambda::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<InvocationResponse, Error> {
    tracing::debug!(request_id = %event.context.request_id, "received topic event");
    Ok(handle_topic_event(&event.payload, &LoggingEventHandler))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
