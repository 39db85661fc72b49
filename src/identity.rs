//! Task identity resolution via the ECS task metadata endpoint (v4)

use crate::error::{WorkerError, WorkerResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Identity of the running task instance, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskIdentity {
    pub arn: String,
}

impl TaskIdentity {
    pub fn new<S: Into<String>>(arn: S) -> Self {
        Self { arn: arn.into() }
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}

/// Resolves this process's own task identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_task_identity(&self) -> WorkerResult<TaskIdentity>;
}

/// Subset of the `{metadata}/task` response the worker needs
#[derive(Debug, Deserialize)]
struct TaskMetadata {
    #[serde(rename = "TaskARN")]
    task_arn: String,
}

/// HTTP client for the task metadata endpoint
pub struct MetadataClient {
    base_uri: String,
    client: Client,
}

impl MetadataClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for the given `ECS_CONTAINER_METADATA_URI_V4` value
    pub fn new<S: Into<String>>(base_uri: S) -> WorkerResult<Self> {
        Self::with_timeout(base_uri, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout<S: Into<String>>(base_uri: S, timeout: Duration) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::metadata_fetch(e.to_string()))?;

        Ok(Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn task_url(&self) -> String {
        format!("{}/task", self.base_uri)
    }
}

#[async_trait]
impl IdentityResolver for MetadataClient {
    async fn resolve_task_identity(&self) -> WorkerResult<TaskIdentity> {
        let url = self.task_url();
        debug!(url = %url, "Fetching task metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkerError::metadata_fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::metadata_fetch(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let metadata: TaskMetadata = response
            .json()
            .await
            .map_err(|e| WorkerError::metadata_fetch(format!("Invalid metadata response: {e}")))?;

        Ok(TaskIdentity::new(metadata.task_arn))
    }
}
