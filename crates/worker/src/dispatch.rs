// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes a decoded task payload to its handler and returns the `detail`
//! value stored alongside the task's final status.

use crate::build;
use crate::depends;
use crate::environment::WorkerEnv;
use crate::error::WorkerError;
use crate::jail::Jail;
use crate::portstree::PortsTree;
use pdm_core::{TaskId, TaskKind};
use pdm_store::TaskStore;
use std::sync::Arc;

/// Run one task's payload to completion, returning the JSON value to store
/// as its result detail.
pub async fn dispatch(
    env: &WorkerEnv,
    store: &Arc<TaskStore>,
    task_id: &TaskId,
    kind: TaskKind,
) -> Result<serde_json::Value, WorkerError> {
    match kind {
        TaskKind::CreateJail(task) => {
            let jail = Jail::create(env, store, task_id, &task.version).await?;
            Ok(serde_json::json!({ "name": jail.name }))
        }
        TaskKind::UpdatePorts(task) => {
            let tree = PortsTree::update(env, &task.branch).await?;
            Ok(serde_json::json!({ "name": tree.name }))
        }
        TaskKind::RunBuild(task) => {
            build::run_build(
                env,
                store,
                task_id,
                &task.jail_version,
                &task.ports_branch,
                &task.portja_targets,
                &task.origins,
            )
            .await
        }
        TaskKind::GetDepends(task) => {
            let portja_targets: Vec<String> = task.portja_target.into_iter().collect();
            depends::get_depends(env, task_id, &task.jail_version, &task.ports_branch, &portja_targets, &task.origin).await
        }
    }
}
