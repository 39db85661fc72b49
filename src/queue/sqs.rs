//! SQS implementation of [`MessageQueue`]

use super::{MessageQueue, QueueMessage, ReceiveSettings};
use crate::error::{WorkerError, WorkerResult};
use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client;
use tracing::{debug, info, warn};

/// Queue client backed by SQS
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    settings: ReceiveSettings,
}

impl SqsQueue {
    pub fn new(client: Client, settings: ReceiveSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive_one(&self, queue_url: &str) -> WorkerResult<Option<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(self.settings.max_messages)
            .wait_time_seconds(self.settings.wait_time_seconds)
            .visibility_timeout(self.settings.visibility_timeout_seconds)
            .send()
            .await
            .map_err(|e| WorkerError::queue(DisplayErrorContext(e).to_string()))?;

        let received = output.messages.as_ref().map_or(0, Vec::len);
        let message = extract_message(output.messages);

        match (&message, received) {
            (None, 0) => debug!("No message received within the wait window"),
            (None, count) => warn!(
                received = count,
                "Discarding receive response that is not exactly one complete message"
            ),
            (Some(_), _) => debug!("Message received"),
        }

        Ok(message)
    }

    async fn delete_one(&self, queue_url: &str, receipt_handle: &str) -> WorkerResult<()> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| WorkerError::queue(DisplayErrorContext(e).to_string()))?;

        info!("Message deleted from queue");
        Ok(())
    }
}

/// Normalize a receive response to at most one usable message.
///
/// Anything other than exactly one message carrying both a body and a
/// receipt handle is treated as "no message".
pub fn extract_message(messages: Option<Vec<Message>>) -> Option<QueueMessage> {
    let mut messages = messages?;
    if messages.len() != 1 {
        return None;
    }

    let message = messages.pop()?;
    match (message.body, message.receipt_handle) {
        (Some(body), Some(receipt_handle)) if !body.is_empty() && !receipt_handle.is_empty() => {
            Some(QueueMessage::new(body, receipt_handle))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message(body: Option<&str>, receipt_handle: Option<&str>) -> Message {
        Message::builder()
            .set_body(body.map(str::to_string))
            .set_receipt_handle(receipt_handle.map(str::to_string))
            .build()
    }

    #[test]
    fn test_single_complete_message_is_extracted() {
        let extracted = extract_message(Some(vec![message(
            Some(r#"{"body":"test message body"}"#),
            Some("test-receipt-handle-1"),
        )]));

        assert_eq!(
            extracted,
            Some(QueueMessage::new(
                r#"{"body":"test message body"}"#,
                "test-receipt-handle-1"
            ))
        );
    }

    #[test]
    fn test_absent_messages_yield_none() {
        assert_eq!(extract_message(None), None);
        assert_eq!(extract_message(Some(vec![])), None);
    }

    #[test]
    fn test_missing_fields_yield_none() {
        assert_eq!(extract_message(Some(vec![message(None, Some("h"))])), None);
        assert_eq!(extract_message(Some(vec![message(Some("b"), None)])), None);
        assert_eq!(extract_message(Some(vec![message(Some(""), Some("h"))])), None);
    }

    proptest! {
        #[test]
        fn prop_more_than_one_message_is_never_extracted(count in 2usize..10) {
            let batch = (0..count)
                .map(|i| message(Some("body"), Some(&format!("handle-{i}"))))
                .collect();
            prop_assert_eq!(extract_message(Some(batch)), None);
        }
    }
}
