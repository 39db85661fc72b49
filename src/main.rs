//! SQS ECS Worker - Main Entry Point
//!
//! Exit status is 0 when polling stops on its own (signal or protection
//! denial) and 1 for any startup or loop fault.

use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use sqs_ecs_worker::config::{ConfigArgs, WorkerConfig};
use sqs_ecs_worker::identity::MetadataClient;
use sqs_ecs_worker::observability::init_from_settings;
use sqs_ecs_worker::protection::EcsTaskProtection;
use sqs_ecs_worker::queue::{ReceiveSettings, SqsQueue};
use sqs_ecs_worker::worker::{
    spawn_shutdown_listener, LoopController, LoopSettings, SimulatedProcessor,
};
use sqs_ecs_worker::{exit_status, WorkerError, WorkerResult};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// SQS polling worker with ECS task scale-in protection
#[derive(Parser)]
#[command(name = "sqs-ecs-worker")]
#[command(about = "Drain an SQS queue while holding ECS task protection")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the queue until cancelled or denied protection (default)
    Run,
    /// Validate configuration
    Config {
        /// Show the resolved configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_from_settings(
        &cli.config.log_level,
        &cli.config.log_format,
        cli.config.log_spans,
    );

    let result = run(cli).await;
    match &result {
        Ok(()) => info!("Worker shutdown complete"),
        Err(WorkerError::Config(e)) => error!(error = %e, "Failed to load configuration"),
        Err(e) => error!(error = %e, error_detail = ?e, "Fatal error in main loop"),
    }

    process::exit(exit_status(&result));
}

async fn run(cli: Cli) -> WorkerResult<()> {
    let config = WorkerConfig::from_args(cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_worker(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    }
}

async fn run_worker(config: WorkerConfig) -> WorkerResult<()> {
    let shutdown = CancellationToken::new();
    let _listener = spawn_shutdown_listener(shutdown.clone())?;

    let controller = build_controller(&config, shutdown).await?;
    let summary = controller.run().await?;

    info!(
        iterations = summary.iterations,
        messages_processed = summary.messages_processed,
        stop_reason = %summary.stop_reason,
        "Worker stopped cleanly"
    );
    Ok(())
}

/// Bootstrap: AWS clients, metadata client and processor wired into the loop
async fn build_controller(
    config: &WorkerConfig,
    shutdown: CancellationToken,
) -> Result<
    LoopController<MetadataClient, EcsTaskProtection, SqsQueue, SimulatedProcessor>,
    WorkerError,
> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(endpoint_url) = &config.aws_endpoint_url {
        info!(endpoint_url = %endpoint_url, "Using AWS endpoint override");
        loader = loader.endpoint_url(endpoint_url);
    }
    let sdk_config = loader.load().await;

    let protection = EcsTaskProtection::new(aws_sdk_ecs::Client::new(&sdk_config));
    let queue = SqsQueue::new(
        aws_sdk_sqs::Client::new(&sdk_config),
        ReceiveSettings::with_max_messages(config.max_messages),
    );
    let resolver = MetadataClient::new(config.metadata_uri.clone())?;
    let processor = SimulatedProcessor::new(config.processing_delay());

    Ok(LoopController::new(
        LoopSettings::from_config(config),
        resolver,
        protection,
        queue,
        processor,
        shutdown,
    ))
}

fn handle_config_command(config: &WorkerConfig, show: bool) -> WorkerResult<()> {
    if show {
        match serde_json::to_string_pretty(config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => error!(error = %e, "Failed to render configuration"),
        }
    }

    info!("Configuration validation complete");
    Ok(())
}
