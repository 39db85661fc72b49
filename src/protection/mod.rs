//! Task scale-in protection
//!
//! A [`TaskProtection`] implementation asks the orchestrator to keep this task
//! alive while a message is in flight and releases that lease afterwards.
//! Denials come back as [`WorkerError::TaskProtectionDenied`] so the loop can
//! stop politely; every other failure is an ordinary fault.
//!
//! [`WorkerError::TaskProtectionDenied`]: crate::error::WorkerError::TaskProtectionDenied

use crate::error::WorkerResult;
use crate::identity::TaskIdentity;
use async_trait::async_trait;

pub mod ecs;

pub use ecs::EcsTaskProtection;

/// Lease length requested at the start of every iteration
pub const PROTECTION_EXPIRES_MINUTES: i32 = 60;

/// Protection state change to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionRequest {
    Enable { expires_in_minutes: i32 },
    Disable,
}

impl ProtectionRequest {
    /// The per-iteration lease
    pub fn lease() -> Self {
        ProtectionRequest::Enable {
            expires_in_minutes: PROTECTION_EXPIRES_MINUTES,
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, ProtectionRequest::Enable { .. })
    }

    /// Expiry is only sent when enabling
    pub fn expires_in_minutes(&self) -> Option<i32> {
        match self {
            ProtectionRequest::Enable { expires_in_minutes } => Some(*expires_in_minutes),
            ProtectionRequest::Disable => None,
        }
    }
}

/// Client for the orchestrator's task protection API
#[async_trait]
pub trait TaskProtection: Send + Sync {
    async fn set_protection(
        &self,
        cluster: &str,
        task: &TaskIdentity,
        request: ProtectionRequest,
    ) -> WorkerResult<()>;
}
