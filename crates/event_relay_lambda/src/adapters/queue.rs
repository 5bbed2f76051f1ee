use anyhow::Context;

use super::block_on_sdk;

/// The parts of a received queue message the dispatcher reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
}

impl From<aws_sdk_sqs::types::Message> for QueueMessage {
    fn from(message: aws_sdk_sqs::types::Message) -> Self {
        Self {
            message_id: message.message_id,
            receipt_handle: message.receipt_handle,
            body: message.body,
        }
    }
}

pub trait QueueClient {
    /// Long-polls for up to `max_messages`, waiting at most
    /// `wait_time_seconds` for the first one to arrive.
    fn receive_messages(
        &self,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> anyhow::Result<Vec<QueueMessage>>;

    fn delete_message(&self, receipt_handle: &str) -> anyhow::Result<()>;
}

impl<T: QueueClient + ?Sized> QueueClient for &T {
    fn receive_messages(
        &self,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> anyhow::Result<Vec<QueueMessage>> {
        (**self).receive_messages(max_messages, wait_time_seconds)
    }

    fn delete_message(&self, receipt_handle: &str) -> anyhow::Result<()> {
        (**self).delete_message(receipt_handle)
    }
}

#[derive(Clone, Debug)]
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueueClient {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

impl QueueClient for SqsQueueClient {
    #[tracing::instrument(skip(self))]
    fn receive_messages(
        &self,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> anyhow::Result<Vec<QueueMessage>> {
        let request = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .set_message_attribute_names(Some(vec!["All".to_string()]));

        let output = block_on_sdk(request.send())
            .with_context(|| format!("failed to receive messages from '{}'", self.queue_url))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(QueueMessage::from)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn delete_message(&self, receipt_handle: &str) -> anyhow::Result<()> {
        let request = self
            .client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle);

        block_on_sdk(request.send())
            .with_context(|| format!("failed to delete message from '{}'", self.queue_url))?;

        Ok(())
    }
}
