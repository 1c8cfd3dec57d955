// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration for the HTTP surface: same environment-then-CLI
//! precedence as `pdm-worker`'s `WorkerConfig`, plus a bind address.
//!
//! This binary opens its own `WorkerEnv` (read-mostly: it never runs a
//! build, only enqueues tasks and reads `/info`), so it needs the same
//! dataset/ports-remote inputs `pdmd` does.

use crate::error::HttpError;
use clap::Parser;
use pdm_worker::WorkerConfig;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORTS_REMOTE: &str = "https://git.freebsd.org/ports.git";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);

#[derive(Debug, Parser)]
#[command(name = "pdm-httpd", about = "poudomatic HTTP/SSE surface")]
struct Cli {
    /// Root ZFS dataset; overrides POUDOMATIC_DATASET.
    #[arg(long)]
    dataset: Option<String>,

    /// Task database path; overrides the default derived from the root
    /// dataset's mountpoint. Mainly useful for tests.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Ports tree git remote; overrides POUDOMATIC_PORTS_REMOTE.
    #[arg(long)]
    ports_remote: Option<String>,

    /// Address to bind the HTTP listener to; overrides
    /// POUDOMATIC_HTTP_BIND.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log filter directive; overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub dataset: String,
    pub db_path: Option<PathBuf>,
    pub ports_remote: String,
    pub bind_addr: SocketAddr,
    pub log_filter: String,
}

impl HttpConfig {
    pub fn load() -> Result<Self, HttpError> {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Result<Self, HttpError> {
        let dataset = cli
            .dataset
            .or_else(|| std::env::var("POUDOMATIC_DATASET").ok())
            .ok_or_else(|| HttpError::Config("POUDOMATIC_DATASET is not set; pass --dataset".to_string()))?;
        let ports_remote = cli
            .ports_remote
            .or_else(|| std::env::var("POUDOMATIC_PORTS_REMOTE").ok())
            .unwrap_or_else(|| DEFAULT_PORTS_REMOTE.to_string());
        let bind_addr = match cli.bind {
            Some(addr) => addr,
            None => std::env::var("POUDOMATIC_HTTP_BIND")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|_| HttpError::Config("POUDOMATIC_HTTP_BIND is not a valid address".to_string()))?
                .unwrap_or(DEFAULT_BIND_ADDR),
        };
        let log_filter =
            cli.log_level.or_else(|| std::env::var("RUST_LOG").ok()).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Ok(Self { dataset, db_path: cli.db_path, ports_remote, bind_addr, log_filter })
    }

    /// Build the `WorkerConfig` this surface's `WorkerEnv::open()` needs.
    /// `post_change_script` is irrelevant here: this binary never runs a
    /// build, only enqueues tasks for `pdmd` to pick up.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            dataset: self.dataset.clone(),
            db_path: self.db_path.clone(),
            ports_remote: self.ports_remote.clone(),
            log_filter: self.log_filter.clone(),
            post_change_script: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
