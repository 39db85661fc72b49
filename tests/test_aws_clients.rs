//! Integration tests for the ECS and SQS clients
//!
//! Points the AWS SDK clients at a wiremock server speaking the AWS JSON
//! protocols and checks request parameters and response interpretation.

use aws_sdk_ecs::config::{
    retry::RetryConfig as EcsRetryConfig, BehaviorVersion as EcsBehaviorVersion,
    Credentials as EcsCredentials, Region as EcsRegion,
};
use aws_sdk_sqs::config::{
    retry::RetryConfig as SqsRetryConfig, BehaviorVersion as SqsBehaviorVersion,
    Credentials as SqsCredentials, Region as SqsRegion,
};
use serde_json::{json, Value};
use sqs_ecs_worker::error::WorkerError;
use sqs_ecs_worker::identity::TaskIdentity;
use sqs_ecs_worker::protection::{EcsTaskProtection, ProtectionRequest, TaskProtection};
use sqs_ecs_worker::queue::{MessageQueue, QueueMessage, ReceiveSettings, SqsQueue};
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TASK_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task/test-task";
const CLUSTER: &str = "test-cluster";
const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/test-queue";

const ECS_TARGET: &str = "AmazonEC2ContainerServiceV20141113.UpdateTaskProtection";

fn ecs_client(endpoint: &str) -> aws_sdk_ecs::Client {
    let config = aws_sdk_ecs::Config::builder()
        .behavior_version(EcsBehaviorVersion::latest())
        .region(EcsRegion::new("us-east-1"))
        .credentials_provider(EcsCredentials::new("test", "test", None, None, "test"))
        .retry_config(EcsRetryConfig::disabled())
        .endpoint_url(endpoint)
        .build();
    aws_sdk_ecs::Client::from_conf(config)
}

fn sqs_client(endpoint: &str) -> aws_sdk_sqs::Client {
    let config = aws_sdk_sqs::Config::builder()
        .behavior_version(SqsBehaviorVersion::latest())
        .region(SqsRegion::new("us-east-1"))
        .credentials_provider(SqsCredentials::new("test", "test", None, None, "test"))
        .retry_config(SqsRetryConfig::disabled())
        .endpoint_url(endpoint)
        .build();
    aws_sdk_sqs::Client::from_conf(config)
}

fn ecs_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/x-amz-json-1.1")
        .set_body_json(body)
}

fn sqs_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/x-amz-json-1.0")
        .set_body_json(body)
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
        .collect()
}

#[tokio::test]
async fn test_ecs_enable_sends_lease_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", ECS_TARGET))
        .and(body_partial_json(json!({
            "cluster": CLUSTER,
            "tasks": [TASK_ARN],
            "protectionEnabled": true,
            "expiresInMinutes": 60
        })))
        .respond_with(ecs_response(json!({ "protectedTasks": [], "failures": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let protection = EcsTaskProtection::new(ecs_client(&server.uri()));
    protection
        .set_protection(CLUSTER, &TaskIdentity::new(TASK_ARN), ProtectionRequest::lease())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ecs_disable_omits_expiry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", ECS_TARGET))
        .respond_with(ecs_response(json!({ "protectedTasks": [], "failures": [] })))
        .mount(&server)
        .await;

    let protection = EcsTaskProtection::new(ecs_client(&server.uri()));
    protection
        .set_protection(CLUSTER, &TaskIdentity::new(TASK_ARN), ProtectionRequest::Disable)
        .await
        .unwrap();

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["protectionEnabled"], json!(false));
    assert!(bodies[0].get("expiresInMinutes").is_none());
}

#[tokio::test]
async fn test_ecs_failure_is_protection_denied() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", ECS_TARGET))
        .respond_with(ecs_response(json!({
            "protectedTasks": [],
            "failures": [{ "arn": TASK_ARN, "reason": "DEPLOYMENT_BLOCKED" }]
        })))
        .mount(&server)
        .await;

    let protection = EcsTaskProtection::new(ecs_client(&server.uri()));
    let err = protection
        .set_protection(CLUSTER, &TaskIdentity::new(TASK_ARN), ProtectionRequest::lease())
        .await
        .unwrap_err();

    assert!(err.is_protection_denied());
    assert_eq!(err.denial_reason(), Some("DEPLOYMENT_BLOCKED"));
}

#[tokio::test]
async fn test_ecs_server_error_is_ordinary_fault() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let protection = EcsTaskProtection::new(ecs_client(&server.uri()));
    let err = protection
        .set_protection(CLUSTER, &TaskIdentity::new(TASK_ARN), ProtectionRequest::lease())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Protection(_)));
    assert!(!err.is_protection_denied());
}

#[tokio::test]
async fn test_sqs_receive_sends_polling_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "AmazonSQS.ReceiveMessage"))
        .and(body_partial_json(json!({
            "QueueUrl": QUEUE_URL,
            "MaxNumberOfMessages": 1,
            "WaitTimeSeconds": 20,
            "VisibilityTimeout": 1200
        })))
        .respond_with(sqs_response(json!({
            "Messages": [{
                "MessageId": "5fea7756-0ea4-451a-a703-a558b933e274",
                "ReceiptHandle": "test-receipt-handle-1",
                "Body": "{\"body\":\"test message body\"}"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let queue = SqsQueue::new(sqs_client(&server.uri()), ReceiveSettings::default());
    let message = queue.receive_one(QUEUE_URL).await.unwrap();

    assert_eq!(
        message,
        Some(QueueMessage::new(
            "{\"body\":\"test message body\"}",
            "test-receipt-handle-1"
        ))
    );
}

#[tokio::test]
async fn test_sqs_empty_receive_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "AmazonSQS.ReceiveMessage"))
        .respond_with(sqs_response(json!({})))
        .mount(&server)
        .await;

    let queue = SqsQueue::new(sqs_client(&server.uri()), ReceiveSettings::default());
    assert_eq!(queue.receive_one(QUEUE_URL).await.unwrap(), None);
}

#[tokio::test]
async fn test_sqs_message_without_receipt_handle_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "AmazonSQS.ReceiveMessage"))
        .respond_with(sqs_response(json!({
            "Messages": [{ "MessageId": "m-1", "Body": "orphan" }]
        })))
        .mount(&server)
        .await;

    let queue = SqsQueue::new(sqs_client(&server.uri()), ReceiveSettings::default());
    assert_eq!(queue.receive_one(QUEUE_URL).await.unwrap(), None);
}

#[tokio::test]
async fn test_sqs_delete_sends_receipt_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "AmazonSQS.DeleteMessage"))
        .and(body_partial_json(json!({
            "QueueUrl": QUEUE_URL,
            "ReceiptHandle": "test-receipt-handle-1"
        })))
        .respond_with(sqs_response(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let queue = SqsQueue::new(sqs_client(&server.uri()), ReceiveSettings::default());
    queue
        .delete_one(QUEUE_URL, "test-receipt-handle-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sqs_server_error_is_queue_fault() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let queue = SqsQueue::new(sqs_client(&server.uri()), ReceiveSettings::default());
    let err = queue.receive_one(QUEUE_URL).await.unwrap_err();

    assert!(matches!(err, WorkerError::Queue(_)));
}
