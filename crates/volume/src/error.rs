// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("dataset does not exist: {0}")]
    NotFound(String),

    #[error("dataset already exists: {0}")]
    Exists(String),

    #[error("no free temporary name under {0} after {1} attempts")]
    NamesExhausted(String, u32),

    #[error(transparent)]
    Process(#[from] pdm_process::ProcessError),

    #[error("could not parse zfs output: {0}")]
    Parse(String),
}
