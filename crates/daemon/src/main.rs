// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! signaged: digital-signage client agent

use signage_daemon::lifecycle::{self, Config};
use signage_daemon::{ExitReason, Shutdown};
use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "signaged=info,signage_daemon=info";

fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config.log_dir();
    let (file_layer, guard) = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&log_dir, "signaged.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("signaged: cannot create log directory {}: {}", log_dir.display(), e);
            (None, None)
        }
    };

    tracing_subscriber::registry().with(filter).with(stderr).with(file_layer).init();
    guard
}

/// Request shutdown on the first SIGTERM or SIGINT.
fn spawn_signal_handler(shutdown: Shutdown) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("SIGTERM received"),
            _ = sigint.recv() => tracing::info!("SIGINT received"),
            _ = shutdown.requested() => return,
        }
        shutdown.request(ExitReason::Signal);
    });
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("signaged: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = init_tracing(&config);

    let shutdown = Shutdown::new();
    if let Err(e) = spawn_signal_handler(shutdown.clone()) {
        tracing::error!(error = %e, "failed to install signal handlers");
        return ExitCode::FAILURE;
    }

    let agent = match lifecycle::startup(config, shutdown).await {
        Ok(agent) => agent,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let reason = agent.run().await;
    tracing::info!(%reason, "exiting");
    ExitCode::SUCCESS
}
