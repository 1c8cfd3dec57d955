// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ports tree lookup, first-time clone, update, and the read-write
//! "activated" scratch copy a build runs against.
//!
//! Grounded on `original_source/poudomatic/worker/portstree.py`'s
//! `PortsTree.get`/`PortsTree.create` and `ActivePortsTree`, and
//! `tasks.py`'s `UpdatePortsTask.run`: a branch names either the newest
//! snapshot of a named dataset, or (with an `@timestamp` suffix) one pinned
//! snapshot; a fresh branch is a single-branch, depth-1 `git` clone
//! snapshotted and renamed to its quarterly short name; an existing branch
//! is refreshed with `git pull`, snapshotting again only if `HEAD` moved; a
//! build works against a throwaway clone of a snapshot, registered with
//! `poudriere` for the duration of the scope.

use crate::environment::{Poudriere, WorkerEnv};
use crate::error::WorkerError;
use pdm_core::PortsBranchVersion;
use pdm_process::Command;
use pdm_volume::{compression, no_atime, Dataset, Props, Snapshot, TempClone, TempDataset};
use std::path::{Path, PathBuf};

pub struct PortsTree {
    pub name: String,
    pub snapshot: Snapshot,
}

impl PortsTree {
    pub async fn get(env: &WorkerEnv, branch: &str) -> Result<Option<Self>, WorkerError> {
        let ver = PortsBranchVersion::parse(branch)?;
        let name = ver.name();

        if let Some(ts) = ver.snapshot() {
            let full = format!("{}/{name}@{ts}", env.ports_dataset.name);
            return Ok(env.zfs.get_snapshot(&full).await?.map(|snapshot| Self { name, snapshot }));
        }

        let dataset = env.ports_dataset.child(&name);
        if env.zfs.get_dataset(&dataset.name).await?.is_none() {
            return Ok(None);
        }
        let newest = env.zfs.sorted_snapshots(&dataset.name).await?.into_iter().last();
        Ok(newest.map(|snapshot| Self { name, snapshot }))
    }

    pub async fn create(env: &WorkerEnv, branch: &str) -> Result<Self, WorkerError> {
        if let Some(tree) = Self::get(env, branch).await? {
            return Ok(tree);
        }
        let name = PortsBranchVersion::parse(branch)?.name();

        let fsprops = compression() + no_atime();
        let temp = TempDataset::create(&env.zfs, &env.ports_dataset, fsprops, true).await?;
        let mountpoint = env
            .zfs
            .get_property(&temp.dataset().name, "mountpoint")
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("ports dataset '{}' is not mounted", temp.dataset().name)))?;

        Command::new("git")
            .args(["clone", "--depth", "1", "--single-branch", "--branch", branch, &env.config.ports_remote, &mountpoint])
            .run()
            .await?;

        let log_output =
            Command::new("git").args(["-C", &mountpoint, "log", "-1", "--format=%H%x09%ct"]).run().await?;
        let log_line = String::from_utf8_lossy(&log_output);
        let (sha, committed) = log_line
            .trim()
            .split_once('\t')
            .ok_or_else(|| WorkerError::Environment(format!("unexpected 'git log' output: {log_line:?}")))?;

        let props = Props::new().set("poudomatic:gitsha", sha).set("poudomatic:timestamp", committed);
        env.zfs.set_properties(&temp.dataset().name, &props).await?;

        env.zfs.create_snapshot(&temp.dataset().name, "0").await?;
        let dataset = temp.keep();
        let renamed = env.zfs.rename_dataset(&dataset.name, &format!("{}/{name}", env.ports_dataset.name)).await?;
        let snapshot = env
            .zfs
            .get_snapshot(&format!("{}@0", renamed.name))
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("snapshot '{}@0' missing after rename", renamed.name)))?;

        Ok(Self { name, snapshot })
    }

    /// Refresh an existing ports tree branch: `git pull` its checkout and
    /// snapshot again only if `HEAD` moved. A branch never before seen is
    /// cloned fresh, same as [`PortsTree::create`]. Unlike `create` (also
    /// used for first-time, build-time resolution), a known branch is
    /// never just handed back unchanged — the `UpdatePorts` task always
    /// re-pulls.
    pub async fn update(env: &WorkerEnv, branch: &str) -> Result<Self, WorkerError> {
        let ver = PortsBranchVersion::parse(branch)?;
        let name = ver.name();
        let dataset = env.ports_dataset.child(&name);

        let Some(existing) = env.zfs.get_dataset(&dataset.name).await? else {
            return Self::create(env, branch).await;
        };

        let mountpoint = env
            .zfs
            .get_property(&existing.name, "mountpoint")
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("ports dataset '{}' is not mounted", existing.name)))?;

        let before_output = Command::new("git").args(["-C", &mountpoint, "rev-parse", "HEAD"]).run().await?;
        let before_sha = String::from_utf8_lossy(&before_output).trim().to_string();

        Command::new("git").args(["-C", &mountpoint, "pull"]).run().await?;

        let after_output = Command::new("git").args(["-C", &mountpoint, "log", "-1", "--format=%H%x09%ct"]).run().await?;
        let after_line = String::from_utf8_lossy(&after_output);
        let (after_sha, committed) = after_line
            .trim()
            .split_once('\t')
            .ok_or_else(|| WorkerError::Environment(format!("unexpected 'git log' output: {after_line:?}")))?;

        let snapshot = if after_sha != before_sha {
            let props = Props::new().set("poudomatic:gitsha", after_sha).set("poudomatic:timestamp", committed);
            env.zfs.set_properties(&dataset.name, &props).await?;
            env.zfs.create_snapshot(&dataset.name, committed).await?
        } else {
            env.zfs
                .sorted_snapshots(&dataset.name)
                .await?
                .into_iter()
                .last()
                .ok_or_else(|| WorkerError::Environment(format!("ports dataset '{}' has no snapshots", dataset.name)))?
        };

        Ok(Self { name, snapshot })
    }

    /// Clone this tree's snapshot into a read-write scratch dataset and
    /// register its mountpoint with `poudriere` for the duration of the
    /// returned scope.
    pub async fn activate(&self, env: &WorkerEnv, poudriere: &Poudriere) -> Result<ActivePortsTree, WorkerError> {
        let fsprops = compression() + no_atime();
        let clone = TempClone::create(&env.zfs, &self.snapshot, fsprops, true).await?;
        let mountpoint = env
            .zfs
            .get_property(&clone.dataset().name, "mountpoint")
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("ports clone '{}' is not mounted", clone.dataset().name)))?;
        let path = PathBuf::from(&mountpoint);
        let workdir = tempfile::Builder::new().prefix("work-").tempdir_in(&path)?;
        let timestamp = env.zfs.get_property(&clone.dataset().name, "poudomatic:timestamp").await?.unwrap_or_default();

        poudriere.activate_ports(&self.name, &path, &timestamp).await?;

        Ok(ActivePortsTree {
            poudriere: poudriere.clone(),
            name: self.name.clone(),
            dataset: clone.dataset().clone(),
            path,
            workdir,
            clone: Some(clone),
            closed: false,
        })
    }
}

/// A ports tree clone registered with `poudriere` for the duration of one
/// build. Closing unregisters it and destroys the clone; dropping without
/// closing does the same on a best-effort basis.
pub struct ActivePortsTree {
    poudriere: Poudriere,
    name: String,
    dataset: Dataset,
    path: PathBuf,
    workdir: tempfile::TempDir,
    clone: Option<TempClone>,
    closed: bool,
}

impl ActivePortsTree {
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    pub async fn close(mut self) -> Result<(), WorkerError> {
        self.closed = true;
        self.poudriere.deactivate_ports(&self.name).await?;
        if let Some(clone) = self.clone.take() {
            clone.close().await?;
        }
        Ok(())
    }
}

impl Drop for ActivePortsTree {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        let poudriere = self.poudriere.clone();
        let name = self.name.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = poudriere.deactivate_ports(&name).await {
                        tracing::warn!(%name, %err, "failed to deactivate ports tree on drop");
                    }
                });
            }
            Err(_) => tracing::warn!(%name, "active ports tree dropped outside a tokio runtime; not cleaned up"),
        }
        // `self.clone`, if still present, drops here too and runs its own
        // best-effort dataset teardown.
    }
}
