// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jail dataset lookup and first-time creation.
//!
//! Grounded on `original_source/poudomatic/worker/tasks.py`'s
//! `CreateJailTask.run`: a temporary dataset under the jails root, the
//! requested release's source tree activated via
//! [`crate::srctree::SourceTree`], then `poudriere jail -c -b -j <temp> -f
//! none -m src=<src_mountpoint>` building the jail straight from that
//! source clone, and a rename of the temp dataset straight to the
//! version's canonical short name.

use crate::environment::WorkerEnv;
use crate::error::WorkerError;
use crate::log_sink::StoreLogSink;
use crate::srctree::SourceTree;
use pdm_core::{FreeBSDVersion, TaskId};
use pdm_process::LogSink;
use pdm_store::TaskStore;
use pdm_volume::{compression, no_atime, Dataset, TempDataset};
use std::sync::Arc;
use tokio::sync::watch;

pub struct Jail {
    pub name: String,
    pub dataset: Dataset,
    pub version: FreeBSDVersion,
}

impl Jail {
    pub async fn get(env: &WorkerEnv, version: &str) -> Result<Option<Self>, WorkerError> {
        let ver = FreeBSDVersion::parse(version)?;
        let name = ver.shortname();
        let dataset = env.jails_dataset.child(&name);
        Ok(match env.zfs.get_dataset(&dataset.name).await? {
            Some(dataset) => Some(Self { name, dataset, version: ver }),
            None => None,
        })
    }

    pub async fn create(
        env: &WorkerEnv,
        store: &Arc<TaskStore>,
        task_id: &TaskId,
        version: &str,
    ) -> Result<Self, WorkerError> {
        if let Some(jail) = Self::get(env, version).await? {
            return Ok(jail);
        }
        let ver = FreeBSDVersion::parse(version)?;

        let src_clone = SourceTree::activate(env, &ver).await?;
        let src_mountpoint = env
            .zfs
            .get_property(&src_clone.dataset().name, "mountpoint")
            .await?
            .ok_or_else(|| WorkerError::Environment(format!("source clone '{}' is not mounted", src_clone.dataset().name)))?;

        let fsprops = compression() + no_atime();
        let temp = TempDataset::create(&env.zfs, &env.jails_dataset, fsprops, true).await?;
        let name = temp
            .dataset()
            .name
            .rsplit_once('/')
            .map(|(_, leaf)| leaf.to_string())
            .unwrap_or_else(|| temp.dataset().name.clone());

        let poudriere = env.poudriere(task_id).await?;
        let sink: Arc<dyn LogSink> = Arc::new(StoreLogSink::new(store.clone(), task_id.clone()));
        let (_tx, cancel) = watch::channel(false);
        poudriere
            .cmd(["jail", "-c", "-b", "-j", name.as_str(), "-f", "none", "-m", &format!("src={src_mountpoint}")])
            .pipe_to(sink, cancel)
            .await?;

        src_clone.close().await?;

        let newname = ver.shortname();
        let dataset = temp.keep();
        let renamed = env.zfs.rename_dataset(&dataset.name, &format!("{}/{newname}", env.jails_dataset.name)).await?;

        Ok(Self { name: newname, dataset: renamed, version: ver })
    }
}
