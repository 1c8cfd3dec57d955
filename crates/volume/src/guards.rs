// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped handles that tear themselves down: temporary datasets, snapshots,
//! and clones created for the duration of one build step, plus a mount
//! guard for borrowing an existing dataset.
//!
//! Grounded on `original_source/poudomatic/worker/util/zfs.py`'s
//! `temp_dataset`/`temp_clone` context managers — retry-on-collision
//! 8-character temp names, `finally`-block teardown that ignores "already
//! gone" errors. `@contextmanager`'s `finally` becomes an explicit async
//! `close()` here (the checked path); [`Drop`] provides a best-effort
//! fallback for the unchecked path, matching the corpus's Drop-based guard
//! convention for resources that need async cleanup.

use crate::dataset::{Dataset, Snapshot};
use crate::error::VolumeError;
use crate::props::Props;
use crate::zfs::Zfs;
use rand::Rng;

const TEMP_NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789_";
const TEMP_NAME_LEN: usize = 8;
const MAX_NAME_ATTEMPTS: u32 = 64;

fn random_name(rng: &mut impl Rng) -> String {
    (0..TEMP_NAME_LEN)
        .map(|_| TEMP_NAME_ALPHABET[rng.gen_range(0..TEMP_NAME_ALPHABET.len())] as char)
        .collect()
}

fn spawn_best_effort_cleanup(resource: &'static str, name: String, fut: impl std::future::Future<Output = Result<(), VolumeError>> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = fut.await {
                    tracing::warn!(%name, %err, "failed to clean up {resource} on drop");
                }
            });
        }
        Err(_) => tracing::warn!(%name, "{resource} dropped outside a tokio runtime; not cleaned up"),
    }
}

/// A dataset created under `root` with a randomly generated name, destroyed
/// when the guard closes or drops.
pub struct TempDataset {
    zfs: Zfs,
    dataset: Dataset,
    closed: bool,
}

impl TempDataset {
    pub async fn create(zfs: &Zfs, root: &Dataset, props: Props, mount: bool) -> Result<Self, VolumeError> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = root.child(&random_name(&mut rng));
            match zfs.create_dataset(&candidate.name, props.clone(), mount).await {
                Ok(dataset) => return Ok(Self { zfs: zfs.clone(), dataset, closed: false }),
                Err(VolumeError::Exists(_)) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(VolumeError::NamesExhausted(root.name.clone(), MAX_NAME_ATTEMPTS))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub async fn close(mut self) -> Result<(), VolumeError> {
        self.closed = true;
        self.zfs.destroy_dataset(&self.dataset.name).await
    }

    /// Disarm the guard without destroying its dataset — for callers that
    /// renamed or otherwise adopted it permanently (e.g. after promoting a
    /// freshly built jail dataset to its canonical name).
    pub fn keep(mut self) -> Dataset {
        self.closed = true;
        self.dataset.clone()
    }
}

impl Drop for TempDataset {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        let zfs = self.zfs.clone();
        let name = self.dataset.name.clone();
        spawn_best_effort_cleanup("temporary dataset", name.clone(), async move { zfs.destroy_dataset(&name).await });
    }
}

/// A clone of `snapshot` under `snapshot`'s parent pool, with a randomly
/// generated name, destroyed when the guard closes or drops.
pub struct TempClone {
    zfs: Zfs,
    dataset: Dataset,
    closed: bool,
}

impl TempClone {
    pub async fn create(zfs: &Zfs, snapshot: &Snapshot, props: Props, mount: bool) -> Result<Self, VolumeError> {
        let prefix = snapshot
            .dataset
            .rsplit_once('/')
            .map(|(parent, _)| parent.to_string())
            .unwrap_or_else(|| snapshot.dataset.clone());
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = format!("{prefix}/{}", random_name(&mut rng));
            match zfs.create_clone(snapshot, &candidate, props.clone(), mount).await {
                Ok(dataset) => return Ok(Self { zfs: zfs.clone(), dataset, closed: false }),
                Err(VolumeError::Exists(_)) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(VolumeError::NamesExhausted(prefix, MAX_NAME_ATTEMPTS))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub async fn close(mut self) -> Result<(), VolumeError> {
        self.closed = true;
        self.zfs.destroy_dataset(&self.dataset.name).await
    }
}

impl Drop for TempClone {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        let zfs = self.zfs.clone();
        let name = self.dataset.name.clone();
        spawn_best_effort_cleanup("temporary clone", name.clone(), async move { zfs.destroy_dataset(&name).await });
    }
}

/// A snapshot taken for the duration of one scope (e.g. to roll back to on
/// build failure), destroyed when the guard closes or drops.
pub struct TempSnapshot {
    zfs: Zfs,
    snapshot: Snapshot,
    closed: bool,
}

impl TempSnapshot {
    pub async fn create(zfs: &Zfs, dataset: &str, name: &str) -> Result<Self, VolumeError> {
        let snapshot = zfs.create_snapshot(dataset, name).await?;
        Ok(Self { zfs: zfs.clone(), snapshot, closed: false })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub async fn close(mut self) -> Result<(), VolumeError> {
        self.closed = true;
        self.zfs.destroy_snapshot(&self.snapshot).await
    }
}

impl Drop for TempSnapshot {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        let zfs = self.zfs.clone();
        let snapshot = self.snapshot.clone();
        let name = snapshot.full_name();
        spawn_best_effort_cleanup("temporary snapshot", name, async move { zfs.destroy_snapshot(&snapshot).await });
    }
}

/// Mounts an existing dataset for the duration of a scope, unmounting (but
/// not destroying) it on close or drop.
pub struct TempMount {
    zfs: Zfs,
    dataset: Dataset,
    closed: bool,
}

impl TempMount {
    pub async fn create(zfs: &Zfs, dataset: Dataset) -> Result<Self, VolumeError> {
        zfs.mount(&dataset.name).await?;
        Ok(Self { zfs: zfs.clone(), dataset, closed: false })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub async fn close(mut self) -> Result<(), VolumeError> {
        self.closed = true;
        self.zfs.unmount(&self.dataset.name).await
    }
}

impl Drop for TempMount {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        let zfs = self.zfs.clone();
        let name = self.dataset.name.clone();
        spawn_best_effort_cleanup("temporary mount", name.clone(), async move { zfs.unmount(&name).await });
    }
}

#[cfg(test)]
#[path = "guards_tests.rs"]
mod tests;
