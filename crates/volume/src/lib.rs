// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pdm-volume: a typed façade over the copy-on-write volume manager
//! (`zfs`/`zpool`) that jails, ports trees, and package sets are stored on.
//!
//! No crate in the workspace binds `libzfs` natively, so every operation
//! here shells out through `pdm-process` and parses `-H -p` tabular output.

mod dataset;
mod error;
mod guards;
mod props;
mod zfs;

pub use dataset::{Dataset, Snapshot};
pub use error::VolumeError;
pub use guards::{TempClone, TempDataset, TempMount, TempSnapshot};
pub use props::{compression, no_atime, no_compression, Props};
pub use zfs::Zfs;
