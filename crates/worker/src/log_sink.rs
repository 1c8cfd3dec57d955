// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges the subprocess driver's [`LogSink`] trait to the task store's
//! append-only log, so a running builder's combined stdout/stderr lands in
//! the task's durable log as it's produced.

use async_trait::async_trait;
use pdm_core::TaskId;
use pdm_process::LogSink;
use pdm_store::TaskStore;
use std::sync::Arc;

pub struct StoreLogSink {
    store: Arc<TaskStore>,
    task_id: TaskId,
}

impl StoreLogSink {
    pub fn new(store: Arc<TaskStore>, task_id: TaskId) -> Self {
        Self { store, task_id }
    }
}

#[async_trait]
impl LogSink for StoreLogSink {
    async fn write_line(&self, line: &[u8]) {
        if let Err(err) = self.store.enqueue_log(&self.task_id, line.to_vec()).await {
            tracing::warn!(task_id = %self.task_id, %err, "failed to append builder output to task log");
        }
    }
}
