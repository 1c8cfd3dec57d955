// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration: environment variables first, CLI flags override.

use crate::error::WorkerError;
use clap::Parser;
use std::path::PathBuf;

const DEFAULT_PORTS_REMOTE: &str = "https://git.freebsd.org/ports.git";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "pdmd", about = "poudomatic build worker")]
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

    /// Log filter directive; overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    /// Script run (via `sh -s`) after a build publishes packages, in
    /// addition to the repository-update script; overrides
    /// POUDOMATIC_POST_CHANGE_SCRIPT.
    #[arg(long)]
    post_change_script: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub dataset: String,
    pub db_path: Option<PathBuf>,
    pub ports_remote: String,
    pub log_filter: String,
    pub post_change_script: Option<PathBuf>,
}

impl WorkerConfig {
    pub fn load() -> Result<Self, WorkerError> {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Result<Self, WorkerError> {
        let dataset = cli
            .dataset
            .or_else(|| std::env::var("POUDOMATIC_DATASET").ok())
            .ok_or_else(|| WorkerError::Environment("POUDOMATIC_DATASET is not set; pass --dataset".to_string()))?;
        let ports_remote = cli
            .ports_remote
            .or_else(|| std::env::var("POUDOMATIC_PORTS_REMOTE").ok())
            .unwrap_or_else(|| DEFAULT_PORTS_REMOTE.to_string());
        let log_filter =
            cli.log_level.or_else(|| std::env::var("RUST_LOG").ok()).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let post_change_script = cli
            .post_change_script
            .or_else(|| std::env::var_os("POUDOMATIC_POST_CHANGE_SCRIPT").map(PathBuf::from));
        Ok(Self { dataset, db_path: cli.db_path, ports_remote, log_filter, post_change_script })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
