//! Polling loop with task protection
//!
//! Each iteration brackets the queue work with a protection lease:
//!
//! ```text
//! protect ─► receive ─┬─ no message ─────────────────────┬─► unprotect ─► next iteration
//!                     └─ message ─► process ─► delete ───┘
//! ```
//!
//! A denied protect or unprotect request ends the loop gracefully. Any other
//! fault releases protection (leaving the message for redelivery) and is
//! returned to the caller, which exits the process with a failure status. Cancellation is only
//! observed between iterations, so an iteration in flight always finishes its
//! cleanup.

use crate::config::WorkerConfig;
use crate::error::{IterationStage, WorkerError, WorkerResult};
use crate::identity::{IdentityResolver, TaskIdentity};
use crate::observability::{worker_span, IterationScope};
use crate::protection::{ProtectionRequest, TaskProtection};
use crate::queue::MessageQueue;
use crate::worker::processor::MessageProcessor;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Identifiers the loop needs on every iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub cluster: String,
    pub queue_url: String,
}

impl LoopSettings {
    pub fn new<C: Into<String>, Q: Into<String>>(cluster: C, queue_url: Q) -> Self {
        Self {
            cluster: cluster.into(),
            queue_url: queue_url.into(),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.cluster.clone(), config.queue_url.clone())
    }
}

/// Result of a single loop iteration that did not fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Nothing arrived within the wait window
    Idle,
    /// One message was processed and deleted
    Processed,
    /// The orchestrator refused a protection change; stop polling.
    /// `message_processed` is set when the refusal came on release after a
    /// message was already deleted.
    Denied {
        reason: String,
        message_processed: bool,
    },
}

/// Why the loop ended without a fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    ProtectionDenied { reason: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::ProtectionDenied { reason } => write!(f, "protection denied ({reason})"),
        }
    }
}

/// What a clean run did before stopping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub messages_processed: u64,
    pub stop_reason: StopReason,
}

/// Drives the protect / receive / process / delete / unprotect loop
pub struct LoopController<R, P, Q, M> {
    settings: LoopSettings,
    resolver: R,
    protection: P,
    queue: Q,
    processor: M,
    shutdown: CancellationToken,
}

impl<R, P, Q, M> LoopController<R, P, Q, M>
where
    R: IdentityResolver,
    P: TaskProtection,
    Q: MessageQueue,
    M: MessageProcessor,
{
    /// Create a controller. Cancelling `shutdown` stops the loop at the next
    /// iteration boundary.
    pub fn new(
        settings: LoopSettings,
        resolver: R,
        protection: P,
        queue: Q,
        processor: M,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            settings,
            resolver,
            protection,
            queue,
            processor,
            shutdown,
        }
    }

    /// Resolve the task identity, then poll until cancelled or denied.
    ///
    /// An `Err` is a fatal fault that has already been logged with its
    /// iteration context.
    pub async fn run(&self) -> WorkerResult<RunSummary> {
        let identity = self.resolver.resolve_task_identity().await?;
        self.poll(&identity).instrument(worker_span(&identity)).await
    }

    async fn poll(&self, identity: &TaskIdentity) -> WorkerResult<RunSummary> {
        info!(
            cluster = %self.settings.cluster,
            queue_url = %self.settings.queue_url,
            "Starting SQS polling worker"
        );

        let mut iterations = 0;
        let mut messages_processed = 0;

        let stop_reason = loop {
            if self.shutdown.is_cancelled() {
                break StopReason::Cancelled;
            }

            let scope = IterationScope::new();
            iterations += 1;

            let outcome = self
                .run_iteration(identity)
                .instrument(scope.span().clone())
                .await?;

            match outcome {
                IterationOutcome::Idle => {}
                IterationOutcome::Processed => messages_processed += 1,
                IterationOutcome::Denied {
                    reason,
                    message_processed,
                } => {
                    if message_processed {
                        messages_processed += 1;
                    }
                    break StopReason::ProtectionDenied { reason };
                }
            }
        };

        info!(
            iterations,
            messages_processed,
            stop_reason = %stop_reason,
            "Polling stopped, worker shutting down"
        );

        Ok(RunSummary {
            iterations,
            messages_processed,
            stop_reason,
        })
    }

    /// Run one full iteration for `identity`.
    pub async fn run_iteration(&self, identity: &TaskIdentity) -> WorkerResult<IterationOutcome> {
        if let Err(e) = self.set_protection(identity, ProtectionRequest::lease()).await {
            if let Some(reason) = e.denial_reason() {
                info!(reason = %reason, "Task protection failed, exiting gracefully");
                return Ok(IterationOutcome::Denied {
                    reason: reason.to_string(),
                    message_processed: false,
                });
            }

            // The lease may or may not have been granted.
            self.release_after_failure(identity).await;
            return Err(report(IterationStage::Protect, e));
        }

        match self.drain_one().await {
            Ok(outcome) => match self.release(identity).await? {
                None => Ok(outcome),
                Some(reason) => Ok(IterationOutcome::Denied {
                    reason,
                    message_processed: outcome == IterationOutcome::Processed,
                }),
            },
            Err((stage, e)) => {
                self.release_after_failure(identity).await;
                Err(report(stage, e))
            }
        }
    }

    /// Receive, process and delete at most one message.
    async fn drain_one(&self) -> Result<IterationOutcome, (IterationStage, WorkerError)> {
        let queue_url = self.settings.queue_url.as_str();

        let message = self
            .queue
            .receive_one(queue_url)
            .await
            .map_err(|e| (IterationStage::Receive, e))?;

        let Some(message) = message else {
            return Ok(IterationOutcome::Idle);
        };

        self.processor
            .process(&message.body)
            .await
            .map_err(|e| (IterationStage::Process, e))?;

        self.queue
            .delete_one(queue_url, &message.receipt_handle)
            .await
            .map_err(|e| (IterationStage::Delete, e))?;

        Ok(IterationOutcome::Processed)
    }

    /// Release protection after a successful iteration. Returns the reason
    /// when the orchestrator refuses the release.
    async fn release(&self, identity: &TaskIdentity) -> WorkerResult<Option<String>> {
        match self.set_protection(identity, ProtectionRequest::Disable).await {
            Ok(()) => Ok(None),
            Err(WorkerError::TaskProtectionDenied { reason }) => {
                info!(reason = %reason, "Task protection release failed, exiting gracefully");
                Ok(Some(reason))
            }
            Err(e) => Err(report(IterationStage::Unprotect, e)),
        }
    }

    /// Release protection while a fault is already on its way out.
    async fn release_after_failure(&self, identity: &TaskIdentity) {
        if let Err(e) = self.set_protection(identity, ProtectionRequest::Disable).await {
            warn!(error = %e, "Failed to release task protection during cleanup");
        }
    }

    async fn set_protection(
        &self,
        identity: &TaskIdentity,
        request: ProtectionRequest,
    ) -> WorkerResult<()> {
        self.protection
            .set_protection(&self.settings.cluster, identity, request)
            .await
    }
}

fn report(stage: IterationStage, error: WorkerError) -> WorkerError {
    error!(
        stage = %stage,
        error = %error,
        error_detail = ?error,
        "Error occurred during message processing"
    );
    error
}
