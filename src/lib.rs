//! SQS ECS Worker - Rust Implementation
//!
//! A long-running worker that drains an SQS queue one message at a time while
//! holding ECS task scale-in protection, so an autoscaler can shrink the
//! service to zero without killing a task mid-message.
//!
//! # Overview
//!
//! - [`identity`] resolves this task's ARN from the ECS metadata endpoint
//! - [`protection`] requests and releases task scale-in protection
//! - [`queue`] receives and deletes queue messages
//! - [`worker`] runs the polling loop and wires shutdown signals into it
//! - [`observability`] sets up structured logging and per-iteration log scopes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sqs_ecs_worker::testing::{CallLog, MockProcessor, MockQueue, MockTaskProtection, StaticIdentity};
//! use sqs_ecs_worker::worker::{LoopController, LoopSettings};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), sqs_ecs_worker::WorkerError> {
//! let log = CallLog::new();
//! let controller = LoopController::new(
//!     LoopSettings::new("workers", "https://sqs.us-east-1.amazonaws.com/123456789012/jobs"),
//!     StaticIdentity::new("arn:aws:ecs:us-east-1:123456789012:task/workers/abc"),
//!     MockTaskProtection::new(log.clone()),
//!     MockQueue::new(log.clone()),
//!     MockProcessor::new(log.clone()),
//!     CancellationToken::new(),
//! );
//!
//! let summary = controller.run().await?;
//! println!("stopped after {} iterations: {}", summary.iterations, summary.stop_reason);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod observability;
pub mod protection;
pub mod queue;
pub mod testing;
pub mod worker;

pub use config::{ConfigArgs, ConfigError, WorkerConfig};
pub use error::{exit_status, IterationStage, WorkerError, WorkerResult};
pub use identity::{IdentityResolver, MetadataClient, TaskIdentity};
pub use protection::{EcsTaskProtection, ProtectionRequest, TaskProtection};
pub use queue::{MessageQueue, QueueMessage, ReceiveSettings, SqsQueue};
pub use worker::{LoopController, LoopSettings, RunSummary, StopReason};
