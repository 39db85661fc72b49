//! Queue access for the polling loop
//!
//! A [`MessageQueue`] hands out at most one [`QueueMessage`] per receive and
//! deletes it once the work is done. There is no retry here; an undeleted
//! message comes back after its visibility timeout.

use crate::error::WorkerResult;
use async_trait::async_trait;

pub mod sqs;

pub use sqs::SqsQueue;

/// Long-poll window for a receive call
pub const LONG_POLL_WAIT_SECONDS: i32 = 20;

/// Hides a received message for one full protect, process, unprotect cycle
pub const VISIBILITY_TIMEOUT_SECONDS: i32 = 60 * 20;

/// A single dequeued unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt_handle: String,
}

impl QueueMessage {
    pub fn new<B: Into<String>, H: Into<String>>(body: B, receipt_handle: H) -> Self {
        Self {
            body: body.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

/// Receive parameters sent on every poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveSettings {
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub visibility_timeout_seconds: i32,
}

impl ReceiveSettings {
    pub fn with_max_messages(max_messages: i32) -> Self {
        Self {
            max_messages,
            ..Self::default()
        }
    }
}

impl Default for ReceiveSettings {
    fn default() -> Self {
        Self {
            max_messages: 1,
            wait_time_seconds: LONG_POLL_WAIT_SECONDS,
            visibility_timeout_seconds: VISIBILITY_TIMEOUT_SECONDS,
        }
    }
}

/// Queue client used by the loop controller
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-poll for one message; `None` when nothing usable arrived
    async fn receive_one(&self, queue_url: &str) -> WorkerResult<Option<QueueMessage>>;

    /// Permanently remove a delivered message
    async fn delete_one(&self, queue_url: &str, receipt_handle: &str) -> WorkerResult<()>;
}
