// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use pdm_store::TaskStore;
use pdm_worker::WorkerEnv;
use std::sync::Arc;

/// Handlers see only `Arc`s: the store for task I/O, the environment for
/// the static dataset listing behind `/info`. Handlers never mutate the
/// environment directly; all writes go through the store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub env: Arc<WorkerEnv>,
}
