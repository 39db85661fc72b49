//! Message processing
//!
//! The processor only does the work for one body and reports whether it
//! succeeded. Deciding what happens to the message and the loop afterwards is
//! the controller's job.

use crate::error::WorkerResult;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Work performed for one queue message body
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// Process one message body. Must tolerate redelivery of the same body.
    async fn process(&self, body: &str) -> WorkerResult<()>;
}

/// Stand-in workload that sleeps for a fixed delay
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    delay: Duration,
}

impl SimulatedProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl MessageProcessor for SimulatedProcessor {
    async fn process(&self, body: &str) -> WorkerResult<()> {
        info!(message_body = %body, "Message received");

        tokio::time::sleep(self.delay).await;

        info!(
            delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
            "Message processing completed"
        );
        Ok(())
    }
}
