//! Worker configuration
//!
//! Every setting can be supplied as a command line flag or through the
//! environment variable the container task definition publishes.

use clap::Args;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Largest batch SQS accepts for a single receive call
pub const SQS_MAX_BATCH: i32 = 10;

/// Raw settings as read from flags and environment
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// SQS queue URL to poll
    #[arg(long, env = "SQS_QUEUE_URL")]
    pub queue_url: Option<String>,

    /// ECS cluster the task runs in
    #[arg(long, env = "ECS_CLUSTER")]
    pub cluster: Option<String>,

    /// Base URI of the ECS task metadata endpoint (v4)
    #[arg(long, env = "ECS_CONTAINER_METADATA_URI_V4")]
    pub metadata_uri: Option<String>,

    /// Maximum number of messages per receive call
    #[arg(long, env = "SQS_MAX_NUMBER_OF_MESSAGES", default_value_t = 1)]
    pub max_messages: i32,

    /// Simulated processing time per message in milliseconds
    #[arg(long, env = "PROCESSING_SLEEP_DURATION_MS", default_value_t = 5000)]
    pub processing_delay_ms: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (json, pretty, compact)
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Emit span open/close events
    #[arg(long, env = "LOG_SPANS")]
    pub log_spans: bool,

    /// Override the AWS endpoint (LocalStack and similar)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub aws_endpoint_url: Option<String>,
}

/// Validated worker configuration
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkerConfig {
    pub queue_url: String,
    pub cluster: String,
    pub metadata_uri: String,
    pub max_messages: i32,
    pub processing_delay_ms: u64,
    pub log_level: String,
    pub log_format: String,
    pub log_spans: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_endpoint_url: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

impl WorkerConfig {
    /// Validate raw arguments into a usable configuration
    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let queue_url = required(args.queue_url, "SQS_QUEUE_URL")?;
        let cluster = required(args.cluster, "ECS_CLUSTER")?;
        let metadata_uri = required(args.metadata_uri, "ECS_CONTAINER_METADATA_URI_V4")?;

        if !(1..=SQS_MAX_BATCH).contains(&args.max_messages) {
            return Err(ConfigError::InvalidValue {
                name: "SQS_MAX_NUMBER_OF_MESSAGES",
                message: format!(
                    "{} is outside the accepted range 1..={SQS_MAX_BATCH}",
                    args.max_messages
                ),
            });
        }

        Ok(Self {
            queue_url,
            cluster,
            metadata_uri,
            max_messages: args.max_messages,
            processing_delay_ms: args.processing_delay_ms,
            log_level: args.log_level,
            log_format: args.log_format,
            log_spans: args.log_spans,
            aws_endpoint_url: args.aws_endpoint_url.filter(|url| !url.trim().is_empty()),
        })
    }

    /// Processing delay used by the simulated processor
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            queue_url: "https://sqs.us-east-1.amazonaws.com/123456789012/test-queue".to_string(),
            cluster: "test-cluster".to_string(),
            metadata_uri: "http://169.254.170.2/v4/abc".to_string(),
            max_messages: 1,
            processing_delay_ms: 0,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            log_spans: false,
            aws_endpoint_url: None,
        }
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}
