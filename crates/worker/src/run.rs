// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The main worker loop: claim a task, dispatch it, record the result,
//! repeat. Single-threaded by construction — one task runs to completion
//! before the next is claimed, matching the builder/volume/directory-
//! follower state this crate threads through a `RunBuild`.

use crate::dispatch::dispatch;
use crate::environment::WorkerEnv;
use crate::error::WorkerError;
use pdm_core::{TaskKind, TaskResult};
use pdm_store::TaskStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run tasks until `shutdown` fires. Returns `Ok(())` on a clean shutdown;
/// an interrupted in-flight task's error propagates so the caller can exit
/// non-zero, leaving that task `RUNNING` for an operator to reconcile.
pub async fn serve(env: &WorkerEnv, store: Arc<TaskStore>, shutdown: CancellationToken) -> Result<(), WorkerError> {
    loop {
        let next_task = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            next_task = store.start_next_task() => next_task?,
        };

        let (task_id, payload) = match next_task {
            Some(claimed) => claimed,
            None => {
                tokio::select! {
                    _ = shutdown.cancelled() => return Ok(()),
                    res = store.wait_for_changes() => res?,
                }
                continue;
            }
        };

        let kind = match TaskKind::from_payload(&payload) {
            Ok(kind) => kind,
            Err(err) => {
                tracing::error!(task_id = %task_id, %err, "malformed task payload");
                let result = TaskResult::Error { detail: err.to_string() };
                store.end_task(&task_id, serde_json::to_vec(&result)?).await?;
                continue;
            }
        };

        tracing::info!(task_id = %task_id, "starting task");
        match dispatch(env, &store, &task_id, kind).await {
            Ok(detail) => {
                tracing::info!(task_id = %task_id, "task finished");
                let result = TaskResult::Success { detail };
                store.end_task(&task_id, serde_json::to_vec(&result)?).await?;
            }
            Err(err) if err.is_interrupted() => {
                tracing::warn!(task_id = %task_id, "interrupted; leaving task RUNNING for operator reconciliation");
                return Err(err);
            }
            Err(err) => {
                tracing::error!(task_id = %task_id, %err, "task failed");
                let result = TaskResult::Error { detail: err.to_string() };
                store.end_task(&task_id, serde_json::to_vec(&result)?).await?;
            }
        }
    }
}
