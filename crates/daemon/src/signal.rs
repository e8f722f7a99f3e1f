// SPDX-License-Identifier: MIT

//! Waits for a termination signal, then drives the supervisor's
//! reverse-dependency-order shutdown.

use crate::supervisor::Supervisor;
use std::sync::Arc;

/// Blocks until SIGTERM (Unix) or Ctrl-C is received, then shuts every
/// running service down in reverse dependency order.
pub async fn run_until_signal(supervisor: Arc<Supervisor>) {
    wait_for_signal().await;
    tracing::info!("shutdown signal received");
    supervisor.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler, waiting on Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = terminate.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
