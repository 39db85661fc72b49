//! ECS `UpdateTaskProtection` implementation of [`TaskProtection`]

use super::{ProtectionRequest, TaskProtection};
use crate::error::{WorkerError, WorkerResult};
use crate::identity::TaskIdentity;
use async_trait::async_trait;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::Failure;
use aws_sdk_ecs::Client;
use tracing::debug;

/// Reason reported when ECS returns a failure without one
const UNKNOWN_REASON: &str = "UNKNOWN";

/// Task protection backed by the ECS API
#[derive(Debug, Clone)]
pub struct EcsTaskProtection {
    client: Client,
}

impl EcsTaskProtection {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskProtection for EcsTaskProtection {
    async fn set_protection(
        &self,
        cluster: &str,
        task: &TaskIdentity,
        request: ProtectionRequest,
    ) -> WorkerResult<()> {
        let output = self
            .client
            .update_task_protection()
            .cluster(cluster)
            .tasks(task.arn.as_str())
            .protection_enabled(request.enabled())
            .set_expires_in_minutes(request.expires_in_minutes())
            .send()
            .await
            .map_err(|e| WorkerError::protection(DisplayErrorContext(e).to_string()))?;

        let failures = output.failures.unwrap_or_default();
        if let Some(reason) = denial_reason(&failures, &task.arn) {
            return Err(WorkerError::protection_denied(reason));
        }

        debug!(
            cluster = %cluster,
            protection_enabled = request.enabled(),
            expires_in_minutes = ?request.expires_in_minutes(),
            "Task protection updated"
        );
        Ok(())
    }
}

/// Reason of the failure reported for `task_arn`, if ECS refused the request.
///
/// A single-task request only ever fails for that task, but a failure without
/// a matching ARN still counts as a denial.
pub fn denial_reason(failures: &[Failure], task_arn: &str) -> Option<String> {
    let failure = failures
        .iter()
        .find(|f| f.arn() == Some(task_arn))
        .or_else(|| failures.first())?;

    Some(failure.reason().unwrap_or(UNKNOWN_REASON).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task/test-task";

    fn failure(arn: Option<&str>, reason: Option<&str>) -> Failure {
        Failure::builder()
            .set_arn(arn.map(str::to_string))
            .set_reason(reason.map(str::to_string))
            .build()
    }

    #[test]
    fn test_no_failures_is_not_a_denial() {
        assert_eq!(denial_reason(&[], ARN), None);
    }

    #[test]
    fn test_failure_for_task_is_a_denial() {
        let failures = vec![failure(Some(ARN), Some("DEPLOYMENT_BLOCKED"))];
        assert_eq!(
            denial_reason(&failures, ARN),
            Some("DEPLOYMENT_BLOCKED".to_string())
        );
    }

    #[test]
    fn test_matching_arn_is_preferred() {
        let failures = vec![
            failure(Some("arn:aws:ecs:us-east-1:123456789012:task/other"), Some("MISSING")),
            failure(Some(ARN), Some("DEPLOYMENT_BLOCKED")),
        ];
        assert_eq!(
            denial_reason(&failures, ARN),
            Some("DEPLOYMENT_BLOCKED".to_string())
        );
    }

    #[test]
    fn test_unmatched_failure_still_denies() {
        let failures = vec![failure(None, Some("DEPLOYMENT_BLOCKED"))];
        assert_eq!(
            denial_reason(&failures, ARN),
            Some("DEPLOYMENT_BLOCKED".to_string())
        );
    }

    #[test]
    fn test_missing_reason_is_reported_as_unknown() {
        let failures = vec![failure(Some(ARN), None)];
        assert_eq!(denial_reason(&failures, ARN), Some("UNKNOWN".to_string()));
    }
}
