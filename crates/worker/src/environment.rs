// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker's live environment: the root dataset, its fixed child
//! datasets, and a thin wrapper around the `poudriere(8)` CLI.
//!
//! Grounded on `original_source/poudomatic/worker/poudriere.py`'s
//! `Poudriere` class and `environment.py`'s `Environment`: a fresh
//! `Poudriere` is built per task, pointed at a scratch `poudriere.conf`
//! templated with that task's `TASK_ID` (so `poudriere bulk`'s own log
//! output lands under `<path_logs>/bulk/<jail>-<branch>/<task_id>/`, the
//! directory the follower in `build.rs` watches); `Environment.new()`
//! validates the root dataset, then dispatches to first-time `setup()` or
//! idempotent `upgrade()`.

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use pdm_core::TaskId;
use pdm_volume::{compression, no_compression, Dataset, Props, Zfs};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ENV_PROPERTY: &str = "poudomatic:environment";
const ENV_VERSION: u32 = 1;

/// Leaf name and whether it carries `compression=zstd`, in creation order.
const DATASETS: &[(&str, bool)] = &[
    (".m", false),
    ("cache", false),
    ("ccache", true),
    ("distfiles", false),
    ("etc", true),
    ("jails", false),
    ("logs", false),
    ("packages", false),
    ("ports", true),
    ("src", true),
    ("wrkdirs", false),
];

fn shquote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Wraps `poudriere -e <etc_path>` for jail/ports registration and the
/// `jget`/`jset`/`pget`/`pset` property API.
///
/// `_scratch` keeps a task-scoped `etc_path` alive for as long as any clone
/// of this `Poudriere` exists; it is `None` for the bare [`Poudriere::new`]
/// constructor, which points at a caller-owned directory instead.
#[derive(Debug, Clone)]
pub struct Poudriere {
    binary: String,
    etc_path: PathBuf,
    _scratch: Option<Arc<tempfile::TempDir>>,
}

impl Poudriere {
    pub fn new(etc_path: impl Into<PathBuf>) -> Self {
        Self { binary: "poudriere".to_string(), etc_path: etc_path.into(), _scratch: None }
    }

    /// Build a scratch `poudriere.conf`/`poudriere.d`, templated with one
    /// task's `TASK_ID`, matching the reference's per-task
    /// `Poudriere.__enter__`. Torn down automatically once every clone of
    /// the returned instance is dropped.
    pub async fn for_task(dataset: &Dataset, mountpoint: &Path, task_id: &TaskId) -> Result<Self, WorkerError> {
        let scratch = tempfile::TempDir::new()?;
        let this =
            Self { binary: "poudriere".to_string(), etc_path: scratch.path().to_path_buf(), _scratch: Some(Arc::new(scratch)) };

        let (zpool, zrootfs) = dataset
            .name
            .split_once('/')
            .map(|(pool, rest)| (pool.to_string(), format!("/{rest}")))
            .unwrap_or_else(|| (dataset.name.clone(), String::new()));
        let conf = format!(
            "ZPOOL={zpool}\nZROOTFS={zrootfs}\nBASEFS={}\nFREEBSD_HOST=https://download.freebsd.org/ftp\nNO_ZFS=no\nTASK_ID={}\n",
            mountpoint.display(),
            task_id.as_str(),
        );
        tokio::fs::write(this.path_conf(), conf).await?;
        tokio::fs::create_dir_all(this.path_jails_d()).await?;
        tokio::fs::create_dir_all(this.path_ports_d()).await?;
        Ok(this)
    }

    pub fn etc_path(&self) -> &Path {
        &self.etc_path
    }

    pub fn path_conf(&self) -> PathBuf {
        self.etc_path.join("poudriere.conf")
    }

    pub fn path_jails_d(&self) -> PathBuf {
        self.etc_path.join("poudriere.d").join("jails")
    }

    pub fn path_ports_d(&self) -> PathBuf {
        self.etc_path.join("poudriere.d").join("ports")
    }

    /// A bare `poudriere -e <etc_path> <args...>` command, for callers that
    /// want to drive it directly (e.g. streaming `jail -c -b` output).
    pub fn cmd(&self, args: impl IntoIterator<Item = impl Into<std::ffi::OsString>>) -> pdm_process::Command {
        pdm_process::Command::new(self.binary.clone())
            .arg("-e")
            .arg(self.etc_path.as_os_str())
            .args(args)
    }

    async fn api_call(&self, lines: String) -> Result<String, WorkerError> {
        let output = self.cmd(["api"]).stdin(lines).run().await?;
        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }

    async fn prop_set(&self, func: &str, name: &str, props: &[(&str, &str)]) -> Result<(), WorkerError> {
        let lines: String =
            props.iter().map(|(k, v)| format!("{func} {} {} {}\n", shquote(name), shquote(k), shquote(v))).collect();
        self.api_call(lines).await?;
        Ok(())
    }

    pub async fn jget(&self, name: &str, prop: &str) -> Result<String, WorkerError> {
        self.api_call(format!("jget {} {}\n", shquote(name), shquote(prop))).await
    }

    pub async fn jset(&self, name: &str, props: &[(&str, &str)]) -> Result<(), WorkerError> {
        self.prop_set("jset", name, props).await
    }

    pub async fn pget(&self, name: &str, prop: &str) -> Result<String, WorkerError> {
        self.api_call(format!("pget {} {}\n", shquote(name), shquote(prop))).await
    }

    pub async fn pset(&self, name: &str, props: &[(&str, &str)]) -> Result<(), WorkerError> {
        self.prop_set("pset", name, props).await
    }

    /// Register (or unregister, via drop) a ports tree's mountpoint with
    /// poudriere for the duration of an active-ports scope.
    pub async fn activate_ports(&self, name: &str, mnt: &Path, timestamp: &str) -> Result<(), WorkerError> {
        self.pset(name, &[("mnt", &mnt.display().to_string()), ("method", "null"), ("timestamp", timestamp)]).await
    }

    pub async fn deactivate_ports(&self, name: &str) -> Result<(), WorkerError> {
        let path = self.path_ports_d().join(name);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Register a jail's mountpoint, arch, and installed version with
    /// poudriere, matching `register_jail`'s `jset` call.
    pub async fn register_jail(&self, name: &str, mnt: &Path, version_longname: &str) -> Result<(), WorkerError> {
        self.jset(
            name,
            &[("mnt", &mnt.display().to_string()), ("arch", "amd64"), ("version", version_longname), ("method", "null")],
        )
        .await
    }
}

/// The worker's live environment: root dataset plus the fixed children
/// every task handler operates against.
pub struct WorkerEnv {
    pub zfs: Zfs,
    pub dataset: Dataset,
    pub path: PathBuf,
    pub etc_path: PathBuf,
    pub jails_dataset: Dataset,
    pub ports_dataset: Dataset,
    pub src_dataset: Dataset,
    pub packages_dataset: Dataset,
    pub logs_path: PathBuf,
    pub config: WorkerConfig,
}

impl WorkerEnv {
    /// Validate the configured root dataset and either run first-time
    /// `setup()` or an idempotent `upgrade()`, mirroring
    /// `Environment.new()`.
    pub async fn open(config: WorkerConfig) -> Result<Self, WorkerError> {
        let zfs = Zfs::default();
        let dataset = Dataset::new(config.dataset.clone());

        if zfs.get_dataset(&dataset.name).await?.is_none() {
            return Err(WorkerError::Environment(format!("ZFS dataset '{}' doesn't exist", dataset.name)));
        }
        if !zfs.is_filesystem(&dataset.name).await? {
            return Err(WorkerError::Environment(format!("ZFS dataset '{}' is not a filesystem", dataset.name)));
        }
        let mountpoint = zfs
            .get_property(&dataset.name, "mountpoint")
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("ZFS dataset '{}' is not mounted", dataset.name)))?;

        let path = PathBuf::from(mountpoint);
        let etc_path = path.join("etc");

        let mut env = Self {
            zfs,
            dataset: dataset.clone(),
            path,
            etc_path,
            jails_dataset: dataset.child("jails"),
            ports_dataset: dataset.child("ports"),
            src_dataset: dataset.child("src"),
            packages_dataset: dataset.child("packages"),
            logs_path: PathBuf::new(),
            config,
        };
        env.logs_path = env.path.join("logs");

        match env.zfs.get_property(&env.dataset.name, ENV_PROPERTY).await? {
            None => env.setup().await?,
            Some(version) => {
                let version: u32 = version
                    .parse()
                    .map_err(|_| WorkerError::Environment(format!("malformed {ENV_PROPERTY} value: {version:?}")))?;
                env.upgrade(version).await?;
            }
        }

        Ok(env)
    }

    /// The task database path: `$root/etc/taskdb/taskdb.sqlite` unless
    /// overridden for tests.
    pub fn db_path(&self) -> PathBuf {
        self.config.db_path.clone().unwrap_or_else(|| self.etc_path.join("taskdb").join("taskdb.sqlite"))
    }

    /// Build the per-task `Poudriere` every task handler drives its
    /// `jail`/`bulk`/`api` commands through, per `get_poudriere(task_id)`.
    pub async fn poudriere(&self, task_id: &TaskId) -> Result<Poudriere, WorkerError> {
        Poudriere::for_task(&self.dataset, &self.path, task_id).await
    }

    async fn setup(&self) -> Result<(), WorkerError> {
        if !self.zfs.direct_children(&self.dataset.name).await?.is_empty() {
            return Err(WorkerError::Environment(format!(
                "ZFS dataset '{}' has children: setup impossible",
                self.dataset.name
            )));
        }
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        if entries.next_entry().await?.is_some() {
            return Err(WorkerError::Environment(format!(
                "ZFS dataset '{}' is not empty: setup impossible",
                self.dataset.name
            )));
        }

        self.zfs.set_properties(&self.dataset.name, &no_compression()).await?;

        for (leaf, compressed) in DATASETS {
            let props = if *compressed { compression() } else { Props::new() };
            self.zfs.create_dataset(&format!("{}/{leaf}", self.dataset.name), props, true).await?;
        }

        let props = Props::new().set(ENV_PROPERTY, ENV_VERSION.to_string()).set("poudriere:type", "data");
        self.zfs.set_properties(&self.dataset.name, &props).await?;

        Ok(())
    }

    async fn upgrade(&self, old_version: u32) -> Result<(), WorkerError> {
        if old_version > ENV_VERSION {
            return Err(WorkerError::Environment(format!(
                "ZFS dataset '{}' has {ENV_PROPERTY}={old_version}, newer than this worker's {ENV_VERSION}",
                self.dataset.name
            )));
        }
        // No upgrade steps are defined yet between version 1 and itself;
        // future schema bumps add `upgrade_to_<n>` steps here.
        Ok(())
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
