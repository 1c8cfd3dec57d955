// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FreeBSD source tree lookup, first-time clone, and the snapshot+clone
//! activation a jail build runs against.
//!
//! Grounded on `original_source/poudomatic/worker/srctree.py`'s
//! `SourceTree.create_or_update`/`activate`: a dataset named after the
//! release's digits-only short form (`$root/src/<shortrelease>`) holds a
//! single-branch `git` checkout of `releng/<release>`; `create_or_update`
//! either clones it fresh or `git pull`s an existing checkout, and
//! `activate` hands back a throwaway clone of the snapshot tagged for the
//! requested branch level.
//!
//! The reference walks the full commit history of `sys/conf/newvers.sh` to
//! retroactively tag every past branch transition with its own snapshot;
//! this crate only tags the one snapshot the requested version actually
//! needs, a simplification noted in `DESIGN.md`.

use crate::environment::WorkerEnv;
use crate::error::WorkerError;
use pdm_core::FreeBSDVersion;
use pdm_process::Command;
use pdm_volume::{compression, no_atime, TempClone, TempDataset};

const SRC_REMOTE: &str = "https://git.freebsd.org/src.git";

pub struct SourceTree {
    pub name: String,
}

impl SourceTree {
    /// Resolve (cloning or pulling as needed) the dataset backing
    /// `version`'s upstream release branch, and ensure a snapshot tagged
    /// for this exact version exists.
    pub async fn create_or_update(env: &WorkerEnv, version: &FreeBSDVersion) -> Result<Self, WorkerError> {
        let shortrelease = version.release().replace('.', "");
        let dataset = env.src_dataset.child(&shortrelease);
        let tag = version.branch_tag();

        if let Some(existing) = env.zfs.get_dataset(&dataset.name).await? {
            let mountpoint = env
                .zfs
                .get_property(&existing.name, "mountpoint")
                .await?
                .ok_or_else(|| WorkerError::Environment(format!("source dataset '{}' is not mounted", existing.name)))?;
            Command::new("git").args(["-C", mountpoint.as_str(), "pull"]).run().await?;
            ensure_snapshot(env, &existing.name, &tag).await?;
            return Ok(Self { name: dataset.name });
        }

        let fsprops = (compression() + no_atime()).set("mountpoint", "/usr/obj");
        let temp = TempDataset::create(&env.zfs, &env.src_dataset, fsprops, true).await?;
        let mountpoint = env
            .zfs
            .get_property(&temp.dataset().name, "mountpoint")
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("source dataset '{}' is not mounted", temp.dataset().name)))?;

        let branch = format!("releng/{}", version.release());
        Command::new("git")
            .args(["clone", "--depth", "1", "--single-branch", "--branch", branch.as_str(), SRC_REMOTE, mountpoint.as_str()])
            .run()
            .await?;

        ensure_snapshot(env, &temp.dataset().name, &tag).await?;

        let dset = temp.keep();
        let renamed = env.zfs.rename_dataset(&dset.name, &dataset.name).await?;

        Ok(Self { name: renamed.name })
    }

    /// Clone the snapshot tagged for `version` into a read-write scratch
    /// dataset.
    pub async fn activate(env: &WorkerEnv, version: &FreeBSDVersion) -> Result<TempClone, WorkerError> {
        let tree = Self::create_or_update(env, version).await?;
        let tag = version.branch_tag();
        let full = format!("{}@{tag}", tree.name);
        let snapshot = env
            .zfs
            .get_snapshot(&full)
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("source tree snapshot '{full}' missing after activation")))?;

        let fsprops = compression() + no_atime();
        let clone = TempClone::create(&env.zfs, &snapshot, fsprops, true).await?;
        Ok(clone)
    }
}

async fn ensure_snapshot(env: &WorkerEnv, dataset: &str, tag: &str) -> Result<(), WorkerError> {
    if env.zfs.get_snapshot(&format!("{dataset}@{tag}")).await?.is_some() {
        return Ok(());
    }
    env.zfs.create_snapshot(dataset, tag).await?;
    Ok(())
}
