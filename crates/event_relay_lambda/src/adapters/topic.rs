use std::collections::HashMap;

use anyhow::Context;
use aws_sdk_sns::types::MessageAttributeValue;
use event_relay_core::attributes::{MessageAttributes, PublishRequest};

use super::block_on_sdk;

pub trait TopicPublisher {
    /// Publishes one message and returns the service-assigned message id.
    fn publish(&self, request: &PublishRequest) -> anyhow::Result<String>;
}

impl<T: TopicPublisher + ?Sized> TopicPublisher for &T {
    fn publish(&self, request: &PublishRequest) -> anyhow::Result<String> {
        (**self).publish(request)
    }
}

#[derive(Clone, Debug)]
pub struct SnsTopicPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsTopicPublisher {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

impl TopicPublisher for SnsTopicPublisher {
    #[tracing::instrument(skip(self, request), fields(topic_arn = %request.topic_arn))]
    fn publish(&self, request: &PublishRequest) -> anyhow::Result<String> {
        let attributes = sns_message_attributes(&request.attributes)?;

        let publish = self
            .client
            .publish()
            .topic_arn(&request.topic_arn)
            .message(&request.message)
            .set_subject(request.subject.clone())
            .set_message_group_id(request.group_id.clone())
            .set_message_deduplication_id(request.deduplication_id.clone())
            .set_message_attributes(Some(attributes));

        let output = block_on_sdk(publish.send())
            .with_context(|| format!("failed to publish to topic '{}'", request.topic_arn))?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}

fn sns_message_attributes(
    attributes: &MessageAttributes,
) -> anyhow::Result<HashMap<String, MessageAttributeValue>> {
    attributes
        .iter()
        .map(|(name, attribute)| {
            let value = MessageAttributeValue::builder()
                .data_type(attribute.data_type())
                .string_value(attribute.value())
                .build()
                .with_context(|| format!("invalid message attribute '{name}'"))?;
            Ok((name.clone(), value))
        })
        .collect()
}
