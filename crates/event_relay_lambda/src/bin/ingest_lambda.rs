use std::sync::Arc;

use event_relay_core::storage_event::TableRow;
use event_relay_lambda::adapters::table::{DynamoRowStore, RowStore};
use event_relay_lambda::config::{load_aws_config, RelayConfig};
use event_relay_lambda::handlers::ingest::handle_storage_event;
use event_relay_lambda::handlers::InvocationResponse;
use event_relay_lambda::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct NoopRowStore;

impl RowStore for NoopRowStore {
    fn put_row(&self, _row: &TableRow) -> anyhow::Result<()> {
        Ok(())
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &RelayConfig,
    store: Option<&DynamoRowStore>,
) -> Result<InvocationResponse, Error> {
    let noop_store = NoopRowStore;
    let store: &dyn RowStore = match store {
        Some(store) => store,
        None => &noop_store,
    };

    handle_storage_event(
        &event.payload,
        &event.context.request_id,
        config.table_name.as_deref(),
        store,
    )
    .map_err(|error| Error::from(format!("{error:#}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();

    let config = RelayConfig::from_env();
    let aws_config = load_aws_config(&config.region).await;
    let store = config.table_name.as_ref().map(|table| {
        let client = aws_sdk_dynamodb::Client::new(&aws_config);
        let store = DynamoRowStore::new(client, table.clone());
        tracing::info!(table = store.table_name(), "initialized table store");
        store
    });

    let config = Arc::new(config);
    let store = Arc::new(store);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let config = config.clone();
        let store = store.clone();
        async move { handle_request(event, &config, (*store).as_ref()).await }
    }))
    .await
}
