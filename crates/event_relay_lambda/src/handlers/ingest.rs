use anyhow::Context;
use chrono::Utc;
use event_relay_core::storage_event::{row_from_value, StorageEvent};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapters::table::RowStore;
use crate::handlers::InvocationResponse;

/// Writes one table row per usable storage-event record.
///
/// Partial or malformed records are skipped with a log line. A failed write
/// aborts the invocation; rows already written stay written. With no table
/// configured the handler reports success without touching `store`.
#[tracing::instrument(skip(event, store))]
pub fn handle_storage_event(
    event: &Value,
    request_id: &str,
    table_name: Option<&str>,
    store: &dyn RowStore,
) -> anyhow::Result<InvocationResponse> {
    tracing::debug!(event = %event, "event received");

    let Some(table_name) = table_name else {
        tracing::warn!("table name not set; skipping table write");
        return Ok(InvocationResponse::ok(
            json!({"message": "No DynamoDB table configured"}),
        ));
    };

    let storage_event = StorageEvent::deserialize(event).context("malformed storage event")?;

    let now = Utc::now();
    let mut processed_count = 0usize;
    for (index, record) in storage_event.records.iter().enumerate() {
        let row = match row_from_value(record, request_id, now) {
            Ok(row) => row,
            Err(reason) => {
                tracing::info!(record_index = index, reason = %reason, "skipping record");
                continue;
            }
        };

        store.put_row(&row).inspect_err(|error| {
            tracing::error!(error = ?error, table = table_name, "error processing records");
        })?;

        tracing::info!(
            bucket = %row.bucket_name,
            key = %row.s3_object_key,
            "successfully processed s3://{}/{}",
            row.bucket_name,
            row.s3_object_key
        );
        processed_count += 1;
    }

    Ok(InvocationResponse::ok(json!({
        "message": "Processed S3 events successfully",
        "processed_count": processed_count,
    })))
}
