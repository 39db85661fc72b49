//! Translate SIGTERM / SIGINT into cooperative cancellation
//!
//! The handler only cancels the token. The polling loop notices at its next
//! iteration boundary, so the message and protection lease currently in
//! flight are always cleaned up before the process exits.

use crate::error::WorkerResult;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Install signal handlers and cancel `token` when one fires.
///
/// Registration happens before this returns so a signal delivered right after
/// startup is not lost.
pub fn spawn_shutdown_listener(token: CancellationToken) -> WorkerResult<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = sigterm.recv() => "SIGTERM",
                Some(()) = sigint.recv() => "SIGINT",
                else => return,
            };

            if token.is_cancelled() {
                info!(signal = name, "Shutdown already in progress");
            } else {
                info!(signal = name, "Shutdown signal received, initiating graceful shutdown");
                token.cancel();
            }
        }
    }))
}
