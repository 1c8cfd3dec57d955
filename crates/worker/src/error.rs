// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Core(#[from] pdm_core::PdmError),

    #[error(transparent)]
    Store(#[from] pdm_store::StoreError),

    #[error(transparent)]
    Volume(#[from] pdm_volume::VolumeError),

    #[error(transparent)]
    Process(#[from] pdm_process::ProcessError),

    #[error(transparent)]
    Follow(#[from] pdm_follow::FollowError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("builder reported errors: {0}")]
    BuildError(String),

    #[error("environment setup error: {0}")]
    Environment(String),

    #[error("interrupted")]
    Interrupted,
}

impl WorkerError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WorkerError::Interrupted)
            || matches!(self, WorkerError::Process(pdm_process::ProcessError::Interrupted(_)))
    }
}
