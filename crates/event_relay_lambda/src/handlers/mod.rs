use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod dispatcher;
pub mod events;
pub mod ingest;
pub mod notification;
pub mod publisher;

/// Lambda-style response: a status code and a JSON-encoded body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
