// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed façade over the `zfs`/`zpool` CLIs.
//!
//! Grounded on `original_source/poudomatic/worker/util/zfs.py`, which
//! drives the same operations through `libzfs`'s native bindings. No crate
//! in this workspace (or the retrieval pack it was built from) wraps
//! `libzfs`, so this shells out through [`pdm_process::Command`] and parses
//! `-H -p` tabular output instead — the texture the corpus already uses for
//! every other external tool.

use crate::dataset::{Dataset, Snapshot};
use crate::error::VolumeError;
use crate::props::Props;
use pdm_process::Command;

const NOT_EXIST_MARKERS: [&str; 2] = ["dataset does not exist", "could not find any snapshots"];
const NOT_MOUNTED_MARKER: &str = "not currently mounted";

fn looks_like_missing(output: &[u8]) -> bool {
    let text = String::from_utf8_lossy(output);
    NOT_EXIST_MARKERS.iter().any(|marker| text.contains(marker))
}

fn looks_like_not_mounted(output: &[u8]) -> bool {
    String::from_utf8_lossy(output).contains(NOT_MOUNTED_MARKER)
}

/// Lines of tab-separated `-H -p` output, trimmed and with blanks dropped.
fn parse_lines(output: &[u8]) -> Vec<Vec<String>> {
    String::from_utf8_lossy(output)
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Zfs {
    zfs_bin: String,
}

impl Default for Zfs {
    fn default() -> Self {
        Self { zfs_bin: "zfs".to_string() }
    }
}

impl Zfs {
    pub fn new(zfs_bin: impl Into<String>) -> Self {
        Self { zfs_bin: zfs_bin.into() }
    }

    fn cmd(&self) -> Command {
        Command::new(self.zfs_bin.clone())
    }

    pub async fn get_dataset(&self, name: &str) -> Result<Option<Dataset>, VolumeError> {
        let cmd = self.cmd().args(["list", "-H", "-p", "-o", "name", name]).exit_ok([0, 1]);
        match cmd.run().await {
            Ok(_) => Ok(Some(Dataset::new(name))),
            Err(pdm_process::ProcessError::ExitStatus { output, .. }) if looks_like_missing(&output) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn create_dataset(&self, name: &str, props: Props, mount: bool) -> Result<Dataset, VolumeError> {
        let mut args = vec!["create".to_string()];
        args.extend(props.as_create_args());
        if !mount {
            args.push("-u".to_string());
        }
        args.push(name.to_string());
        match self.cmd().args(args).run().await {
            Ok(_) => Ok(Dataset::new(name)),
            Err(pdm_process::ProcessError::ExitStatus { output, .. })
                if String::from_utf8_lossy(&output).contains("dataset already exists") =>
            {
                Err(VolumeError::Exists(name.to_string()))
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn rename_dataset(&self, old: &str, new: &str) -> Result<Dataset, VolumeError> {
        self.cmd().args(["rename", old, new]).run().await?;
        Ok(Dataset::new(new))
    }

    pub async fn set_properties(&self, name: &str, props: &Props) -> Result<(), VolumeError> {
        for (key, value) in props.iter() {
            self.cmd().args(["set", &format!("{key}={value}"), name]).run().await?;
        }
        Ok(())
    }

    pub async fn get_property(&self, name: &str, key: &str) -> Result<Option<String>, VolumeError> {
        let output = self.cmd().args(["get", "-H", "-p", "-o", "value", key, name]).run().await?;
        let value = String::from_utf8_lossy(&output).trim().to_string();
        if value.is_empty() || value == "-" {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    pub async fn get_snapshot(&self, full_name: &str) -> Result<Option<Snapshot>, VolumeError> {
        let cmd = self.cmd().args(["list", "-t", "snapshot", "-H", "-p", "-o", "name", full_name]).exit_ok([0, 1]);
        match cmd.run().await {
            Ok(_) => Ok(Snapshot::parse(full_name)),
            Err(pdm_process::ProcessError::ExitStatus { output, .. }) if looks_like_missing(&output) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn create_snapshot(&self, dataset: &str, name: &str) -> Result<Snapshot, VolumeError> {
        let full = format!("{dataset}@{name}");
        self.cmd().args(["snapshot", &full]).run().await?;
        Ok(Snapshot { dataset: dataset.to_string(), name: name.to_string() })
    }

    /// Direct snapshots of `dataset`, oldest (lowest creation txg) first.
    pub async fn sorted_snapshots(&self, dataset: &str) -> Result<Vec<Snapshot>, VolumeError> {
        let output = self
            .cmd()
            .args(["list", "-t", "snapshot", "-H", "-p", "-d", "1", "-s", "createtxg", "-o", "name", dataset])
            .exit_ok([0, 1])
            .run()
            .await;
        let output = match output {
            Ok(output) => output,
            Err(pdm_process::ProcessError::ExitStatus { output, .. }) if looks_like_missing(&output) => {
                return Ok(Vec::new());
            }
            Err(other) => return Err(other.into()),
        };
        Ok(parse_lines(&output)
            .into_iter()
            .filter_map(|mut row| row.pop())
            .filter_map(|name| Snapshot::parse(&name))
            .collect())
    }

    pub async fn rollback_snapshot(&self, snapshot: &Snapshot) -> Result<(), VolumeError> {
        self.cmd().args(["rollback", &snapshot.full_name()]).run().await?;
        Ok(())
    }

    pub async fn create_clone(&self, snapshot: &Snapshot, name: &str, props: Props, mount: bool) -> Result<Dataset, VolumeError> {
        let mut args = vec!["clone".to_string()];
        args.extend(props.as_create_args());
        if !mount {
            args.push("-u".to_string());
        }
        args.push(snapshot.full_name());
        args.push(name.to_string());
        self.cmd().args(args).run().await?;
        Ok(Dataset::new(name))
    }

    pub async fn mount(&self, name: &str) -> Result<(), VolumeError> {
        self.cmd().args(["mount", name]).run().await?;
        Ok(())
    }

    pub async fn unmount(&self, name: &str) -> Result<(), VolumeError> {
        let cmd = self.cmd().args(["unmount", "-f", name]).exit_ok([0, 1]);
        match cmd.run().await {
            Ok(_) => Ok(()),
            Err(pdm_process::ProcessError::ExitStatus { output, .. }) if looks_like_not_mounted(&output) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    /// True if `name` names a filesystem-type dataset (as opposed to a
    /// volume or a snapshot) — the test the destruction policy applies
    /// before attempting to unmount.
    pub async fn is_filesystem(&self, name: &str) -> Result<bool, VolumeError> {
        let output = self.cmd().args(["list", "-H", "-p", "-o", "type", name]).run().await?;
        Ok(String::from_utf8_lossy(&output).trim() == "filesystem")
    }

    /// Immediate child datasets of `name` (one level deep), not including
    /// `name` itself — used to check "has this root already been set up".
    pub async fn direct_children(&self, name: &str) -> Result<Vec<String>, VolumeError> {
        let output = self
            .cmd()
            .args(["list", "-H", "-p", "-r", "-d", "1", "-o", "name", name])
            .run()
            .await?;
        Ok(parse_lines(&output)
            .into_iter()
            .filter_map(|mut row| row.pop())
            .filter(|child| child != name)
            .collect())
    }

    /// Direct and indirect filesystem/volume descendants of `name`, deepest
    /// first — the order the destruction policy tears them down in.
    async fn dependents(&self, name: &str) -> Result<Vec<(String, bool)>, VolumeError> {
        let cmd = self
            .cmd()
            .args(["list", "-H", "-p", "-r", "-t", "filesystem,volume", "-o", "name,type", name])
            .exit_ok([0, 1]);
        let output = match cmd.run().await {
            Ok(output) => output,
            Err(pdm_process::ProcessError::ExitStatus { output, .. }) if looks_like_missing(&output) => {
                return Ok(Vec::new());
            }
            Err(other) => return Err(other.into()),
        };
        let mut rows: Vec<(String, bool)> = parse_lines(&output)
            .into_iter()
            .filter_map(|row| {
                let mut row = row.into_iter();
                let dataset_name = row.next()?;
                let kind = row.next()?;
                Some((dataset_name, kind == "filesystem"))
            })
            .filter(|(dataset_name, _)| dataset_name != name)
            .collect();
        rows.reverse();
        Ok(rows)
    }

    /// Destroy `name`, tearing down any filesystem/volume dependents first
    /// in deepest-first order. Ignores "does not exist" errors so repeated
    /// calls during nested scope teardown are safe.
    pub async fn destroy_dataset(&self, name: &str) -> Result<(), VolumeError> {
        for (dependent, is_fs) in self.dependents(name).await? {
            if is_fs {
                self.unmount(&dependent).await?;
            }
            self.destroy_one(&dependent).await?;
        }
        self.unmount(name).await?;
        self.destroy_one(name).await
    }

    async fn destroy_one(&self, name: &str) -> Result<(), VolumeError> {
        let cmd = self.cmd().args(["destroy", name]).exit_ok([0, 1]);
        match cmd.run().await {
            Ok(_) => Ok(()),
            Err(pdm_process::ProcessError::ExitStatus { output, .. }) if looks_like_missing(&output) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn destroy_snapshot(&self, snapshot: &Snapshot) -> Result<(), VolumeError> {
        self.destroy_one(&snapshot.full_name()).await
    }
}

#[cfg(test)]
#[path = "zfs_tests.rs"]
mod tests;
