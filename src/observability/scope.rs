//! Log scoping for the polling loop
//!
//! The controller owns one [`IterationScope`] per loop iteration and runs the
//! iteration inside its span, so every line any component logs while the
//! iteration is in flight carries the same `loop_id`. The enclosing
//! [`worker_span`] adds the `task_arn` once identity is known.

use crate::identity::TaskIdentity;
use std::fmt;
use tracing::{info_span, Span};
use uuid::Uuid;

/// Correlation id of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopId(Uuid);

impl LoopId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LoopId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Logging scope for a single loop iteration
#[derive(Debug, Clone)]
pub struct IterationScope {
    id: LoopId,
    span: Span,
}

impl IterationScope {
    /// Mint a fresh loop id and open a span for it under the current span
    pub fn new() -> Self {
        let id = LoopId::new();
        let span = info_span!("loop_iteration", loop_id = %id);
        Self { id, span }
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for IterationScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Base span for everything the worker logs after identity resolution
pub fn worker_span(identity: &TaskIdentity) -> Span {
    info_span!("worker", task_arn = %identity.arn)
}
