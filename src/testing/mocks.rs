//! Mock implementations for testing
//!
//! Provides scripted identity, protection, queue and processor doubles that
//! record into one shared [`CallLog`], so tests can assert the exact order of
//! calls across components without an ECS cluster or SQS queue.

use crate::error::{WorkerError, WorkerResult};
use crate::identity::{IdentityResolver, TaskIdentity};
use crate::protection::{ProtectionRequest, TaskProtection};
use crate::queue::{MessageQueue, QueueMessage};
use crate::worker::processor::MessageProcessor;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// One call observed by a mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Protection {
        cluster: String,
        tasks: Vec<String>,
        protection_enabled: bool,
        expires_in_minutes: Option<i32>,
    },
    Receive {
        queue_url: String,
    },
    Process {
        body: String,
    },
    Delete {
        queue_url: String,
        receipt_handle: String,
    },
}

impl RecordedCall {
    pub fn is_protection(&self) -> bool {
        matches!(self, RecordedCall::Protection { .. })
    }

    pub fn is_receive(&self) -> bool {
        matches!(self, RecordedCall::Receive { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, RecordedCall::Delete { .. })
    }
}

/// Ordered log shared by all mocks of one test
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, call: RecordedCall) {
        self.calls.lock().await.push(call);
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn protection_calls(&self) -> Vec<RecordedCall> {
        self.filtered(RecordedCall::is_protection).await
    }

    pub async fn receive_calls(&self) -> Vec<RecordedCall> {
        self.filtered(RecordedCall::is_receive).await
    }

    pub async fn delete_calls(&self) -> Vec<RecordedCall> {
        self.filtered(RecordedCall::is_delete).await
    }

    async fn filtered(&self, keep: fn(&RecordedCall) -> bool) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| keep(call))
            .cloned()
            .collect()
    }
}

/// Identity resolver returning a fixed ARN, or failing
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    identity: Option<TaskIdentity>,
}

impl StaticIdentity {
    pub fn new<S: Into<String>>(arn: S) -> Self {
        Self {
            identity: Some(TaskIdentity::new(arn)),
        }
    }

    pub fn unreachable() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn resolve_task_identity(&self) -> WorkerResult<TaskIdentity> {
        self.identity
            .clone()
            .ok_or_else(|| WorkerError::metadata_fetch("Mock metadata endpoint unreachable"))
    }
}

/// Scripted reply of the mock orchestrator
#[derive(Debug, Clone)]
pub enum ProtectionReply {
    Ok,
    Denied(String),
    Fault(String),
}

/// Mock task protection client; replies `Ok` once the script runs out
#[derive(Debug, Clone)]
pub struct MockTaskProtection {
    log: CallLog,
    replies: Arc<Mutex<VecDeque<ProtectionReply>>>,
}

impl MockTaskProtection {
    pub fn new(log: CallLog) -> Self {
        Self::with_replies(log, Vec::new())
    }

    pub fn with_replies(log: CallLog, replies: Vec<ProtectionReply>) -> Self {
        Self {
            log,
            replies: Arc::new(Mutex::new(replies.into())),
        }
    }
}

#[async_trait]
impl TaskProtection for MockTaskProtection {
    async fn set_protection(
        &self,
        cluster: &str,
        task: &TaskIdentity,
        request: ProtectionRequest,
    ) -> WorkerResult<()> {
        self.log
            .record(RecordedCall::Protection {
                cluster: cluster.to_string(),
                tasks: vec![task.arn.clone()],
                protection_enabled: request.enabled(),
                expires_in_minutes: request.expires_in_minutes(),
            })
            .await;

        match self.replies.lock().await.pop_front() {
            None | Some(ProtectionReply::Ok) => Ok(()),
            Some(ProtectionReply::Denied(reason)) => Err(WorkerError::protection_denied(reason)),
            Some(ProtectionReply::Fault(message)) => Err(WorkerError::protection(message)),
        }
    }
}

/// Scripted reply of the mock queue
#[derive(Debug, Clone)]
pub enum ReceiveReply {
    Message(QueueMessage),
    Empty,
    Fault(String),
}

/// Mock queue; receives come back empty once the script runs out
#[derive(Debug, Clone)]
pub struct MockQueue {
    log: CallLog,
    receives: Arc<Mutex<VecDeque<ReceiveReply>>>,
    delete_fault: Option<String>,
}

impl MockQueue {
    pub fn new(log: CallLog) -> Self {
        Self::with_receives(log, Vec::new())
    }

    pub fn with_receives(log: CallLog, receives: Vec<ReceiveReply>) -> Self {
        Self {
            log,
            receives: Arc::new(Mutex::new(receives.into())),
            delete_fault: None,
        }
    }

    pub fn failing_deletes<S: Into<String>>(mut self, message: S) -> Self {
        self.delete_fault = Some(message.into());
        self
    }
}

#[async_trait]
impl MessageQueue for MockQueue {
    async fn receive_one(&self, queue_url: &str) -> WorkerResult<Option<QueueMessage>> {
        self.log
            .record(RecordedCall::Receive {
                queue_url: queue_url.to_string(),
            })
            .await;

        match self.receives.lock().await.pop_front() {
            None | Some(ReceiveReply::Empty) => Ok(None),
            Some(ReceiveReply::Message(message)) => Ok(Some(message)),
            Some(ReceiveReply::Fault(message)) => Err(WorkerError::queue(message)),
        }
    }

    async fn delete_one(&self, queue_url: &str, receipt_handle: &str) -> WorkerResult<()> {
        self.log
            .record(RecordedCall::Delete {
                queue_url: queue_url.to_string(),
                receipt_handle: receipt_handle.to_string(),
            })
            .await;

        match &self.delete_fault {
            Some(message) => Err(WorkerError::queue(message.clone())),
            None => Ok(()),
        }
    }
}

/// Mock processor; can fail, or cancel a token mid-processing to simulate a
/// signal arriving while a message is in flight
#[derive(Debug, Clone)]
pub struct MockProcessor {
    log: CallLog,
    fault: Option<String>,
    cancel_on_process: Option<CancellationToken>,
}

impl MockProcessor {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fault: None,
            cancel_on_process: None,
        }
    }

    pub fn failing<S: Into<String>>(log: CallLog, message: S) -> Self {
        Self {
            fault: Some(message.into()),
            ..Self::new(log)
        }
    }

    pub fn cancelling(log: CallLog, token: CancellationToken) -> Self {
        Self {
            cancel_on_process: Some(token),
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl MessageProcessor for MockProcessor {
    async fn process(&self, body: &str) -> WorkerResult<()> {
        self.log
            .record(RecordedCall::Process {
                body: body.to_string(),
            })
            .await;

        if let Some(token) = &self.cancel_on_process {
            token.cancel();
        }

        match &self.fault {
            Some(message) => Err(WorkerError::processing(message.clone())),
            None => Ok(()),
        }
    }
}
