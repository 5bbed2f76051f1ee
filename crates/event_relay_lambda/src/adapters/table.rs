use std::collections::HashMap;

use anyhow::Context;
use aws_sdk_dynamodb::types::AttributeValue;
use event_relay_core::storage_event::TableRow;

use super::block_on_sdk;

pub trait RowStore {
    fn put_row(&self, row: &TableRow) -> anyhow::Result<()>;
}

#[derive(Clone, Debug)]
pub struct DynamoRowStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoRowStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl RowStore for DynamoRowStore {
    #[tracing::instrument(
        skip(self, row),
        fields(table = %self.table_name, key = %row.s3_object_key)
    )]
    fn put_row(&self, row: &TableRow) -> anyhow::Result<()> {
        let request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(row_item(row)));

        block_on_sdk(request.send()).with_context(|| {
            format!(
                "failed to put row for '{}' into table '{}'",
                row.s3_object_key, self.table_name
            )
        })?;

        Ok(())
    }
}

/// Item layout written for each row. `file_size_bytes` is numeric, the rest
/// are strings.
pub fn row_item(row: &TableRow) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            "s3_object_key".to_string(),
            AttributeValue::S(row.s3_object_key.clone()),
        ),
        (
            "bucket_name".to_string(),
            AttributeValue::S(row.bucket_name.clone()),
        ),
        (
            "file_size_bytes".to_string(),
            AttributeValue::N(row.file_size_bytes.to_string()),
        ),
        (
            "processed_at".to_string(),
            AttributeValue::S(row.processed_at.clone()),
        ),
        (
            "event_time".to_string(),
            AttributeValue::S(row.event_time.clone()),
        ),
    ])
}
