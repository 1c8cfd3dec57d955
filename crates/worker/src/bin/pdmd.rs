// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pdmd`: the poudomatic build worker daemon. Opens the worker environment
//! and task store, then runs tasks one at a time until `SIGINT`/`SIGTERM`.

use pdm_store::TaskStore;
use pdm_worker::{serve, WorkerConfig, WorkerEnv};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = WorkerConfig::load()?;
    init_logging(&config.log_filter);

    let env = WorkerEnv::open(config).await?;
    let store = Arc::new(TaskStore::open(env.db_path()).await?);

    let shutdown = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("received SIGINT"),
        }
        signal_shutdown.cancel();
    });

    serve(&env, store, shutdown).await?;
    Ok(())
}

fn init_logging(log_filter: &str) {
    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
