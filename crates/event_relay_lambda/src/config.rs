//! Runtime configuration shared by the relay binaries.

use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;

pub const DEFAULT_REGION: &str = "ap-south-1";
pub const TABLE_NAME_ENV: &str = "DYNAMODB_TABLE_NAME";
pub const REGION_ENV: &str = "AWS_REGION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Destination table for ingested storage events. Ingest becomes a no-op
    /// when this is unset.
    pub table_name: Option<String>,

    pub region: String,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            table_name: non_empty(TABLE_NAME_ENV),
            region: non_empty(REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}

/// Shared SDK configuration. Load once per process and build every client
/// from it.
pub async fn load_aws_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
