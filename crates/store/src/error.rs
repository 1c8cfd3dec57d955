// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use pdm_core::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task already exists: {0}")]
    AlreadyExists(TaskId),

    #[error("no such task: {0}")]
    NotFound(TaskId),

    #[error("log record for {0} already terminated")]
    AlreadyTerminated(TaskId),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("watching WAL file: {0}")]
    Watch(#[from] notify::Error),

    #[error("store is closed")]
    Closed,

    #[error("corrupt task id in store: {0:?}")]
    Corrupt(String),
}
