//! Object-storage event records and the table rows derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::contract::format_timestamp;

pub const DELETE_MARKER_EVENT: &str = "ObjectRemoved:DeleteMarkerCreated";

/// Storage notification batch. Records stay raw so that one record of the
/// wrong shape is skipped on its own; see [`row_from_value`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<Value>,
}

/// Fields are optional throughout because partial records are skipped, not
/// rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageEventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    #[serde(rename = "eventTime", default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub s3: Option<StorageEntity>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageEntity {
    #[serde(default)]
    pub bucket: Option<StorageBucket>,
    #[serde(default)]
    pub object: Option<StorageObject>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageBucket {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageObject {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One row per processed storage event, keyed by `s3_object_key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRow {
    pub s3_object_key: String,
    pub bucket_name: String,
    pub file_size_bytes: u64,
    pub processed_at: String,
    pub event_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("record is malformed: {0}")]
    Malformed(String),
    #[error("record has no storage entity")]
    MissingStorageEntity,
    #[error("record has no object (e.g. delete marker)")]
    MissingObject,
    #[error("record is missing bucket or key")]
    MissingBucketOrKey,
    #[error("record is a delete marker")]
    DeleteMarker,
}

/// Percent-decodes an object key. `+` is left as-is and invalid UTF-8 is
/// replaced rather than rejected.
pub fn decode_object_key(key: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(key.as_bytes())).into_owned()
}

/// Decodes one raw record and maps it to a row. A record whose fields have
/// the wrong types is skipped as [`SkipReason::Malformed`].
pub fn row_from_value(
    record: &Value,
    request_id: &str,
    now: DateTime<Utc>,
) -> Result<TableRow, SkipReason> {
    let record = StorageEventRecord::deserialize(record)
        .map_err(|error| SkipReason::Malformed(error.to_string()))?;
    row_from_record(&record, request_id, now)
}

/// `processed_at` carries the invocation request id; `now` fills
/// `event_time` when the record has none.
pub fn row_from_record(
    record: &StorageEventRecord,
    request_id: &str,
    now: DateTime<Utc>,
) -> Result<TableRow, SkipReason> {
    let entity = record.s3.as_ref().ok_or(SkipReason::MissingStorageEntity)?;
    let object = entity.object.as_ref().ok_or(SkipReason::MissingObject)?;

    if record.event_name.as_deref() == Some(DELETE_MARKER_EVENT) {
        return Err(SkipReason::DeleteMarker);
    }

    let bucket = entity
        .bucket
        .as_ref()
        .and_then(|bucket| bucket.name.as_deref())
        .filter(|name| !name.is_empty());
    let key = object.key.as_deref().filter(|key| !key.is_empty());
    let (Some(bucket), Some(key)) = (bucket, key) else {
        return Err(SkipReason::MissingBucketOrKey);
    };

    let event_time = record
        .event_time
        .clone()
        .filter(|time| !time.is_empty())
        .unwrap_or_else(|| format_timestamp(now));

    Ok(TableRow {
        s3_object_key: decode_object_key(key),
        bucket_name: bucket.to_string(),
        file_size_bytes: object.size.unwrap_or(0),
        processed_at: request_id.to_string(),
        event_time,
    })
}
