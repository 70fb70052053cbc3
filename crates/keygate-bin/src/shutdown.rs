// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Graceful shutdown.
//!
//! A [`ShutdownCoordinator`] holds one latched flag. Both SIGTERM/SIGINT (or
//! Ctrl+C off Unix) and [`ShutdownCoordinator::initiate_shutdown`] set it,
//! and every future handed out by [`ShutdownCoordinator::shutdown_signal`]
//! resolves once it is set, including futures created afterwards.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Shared shutdown latch.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    latch: Arc<watch::Sender<bool>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            latch: Arc::new(watch::Sender::new(false)),
        }
    }

    /// A future that completes once shutdown has been initiated.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.latch.subscribe();
        async move {
            // Err means the coordinator is gone, which also ends the wait.
            let _ = receiver.wait_for(|stopping| *stopping).await;
        }
    }

    /// Sets the latch. Only the first call logs.
    pub fn initiate_shutdown(&self) {
        let first = self.latch.send_if_modified(|stopping| {
            let changed = !*stopping;
            *stopping = true;
            changed
        });
        if first {
            info!("Shutdown initiated");
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        *self.latch.borrow()
    }

    /// Waits for an OS signal or a manual initiation, then sets the latch.
    pub async fn wait_for_shutdown(&self) {
        tokio::select! {
            _ = os_signal() => {}
            _ = self.shutdown_signal() => {}
        }
        self.initiate_shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn os_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut term, mut int) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            warn!("Unix signal handlers unavailable, listening for Ctrl+C only");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = term.recv() => info!(signal = "SIGTERM", "Signal received"),
        _ = int.recv() => info!(signal = "SIGINT", "Signal received"),
    }
}

#[cfg(not(unix))]
async fn os_signal() {
    ctrl_c().await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(signal = "ctrl-c", "Signal received");
}
