// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route handlers. Each PUT handler deserializes the task kind's own wire
//! struct straight out of the request body (the same `CreateJail`,
//! `UpdatePorts`, `RunBuild`, `GetDepends` shapes `pdm-worker` dispatches
//! on) and enqueues it unchanged; there's no separate HTTP-layer DTO to
//! keep in sync.

use crate::error::HttpError;
use crate::sse;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json, Response};
use pdm_core::{CreateJail, GetDepends, RunBuild, TaskId, TaskKind, UpdatePorts};
use pdm_store::TaskStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn parse_task_id(id: &str) -> Result<TaskId, HttpError> {
    TaskId::parse(id).map_err(HttpError::InvalidTaskId)
}

async fn enqueue(state: &AppState, task_id: TaskId, kind: TaskKind) -> Result<Json<Value>, HttpError> {
    let payload = kind.to_payload()?;
    state.store.enqueue(task_id, payload).await?;
    Ok(Json(json!("ok")))
}

pub async fn info(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    let jails = dataset_children(&state, &state.env.jails_dataset.name).await?;
    let portsbranches = dataset_children(&state, &state.env.ports_dataset.name).await?;
    Ok(Json(json!({ "portsbranches": portsbranches, "jails": jails })))
}

async fn dataset_children(state: &AppState, dataset: &str) -> Result<Vec<String>, HttpError> {
    let children = state.env.zfs.direct_children(dataset).await.map_err(pdm_worker::WorkerError::from)?;
    Ok(children.into_iter().filter_map(|full| full.rsplit_once('/').map(|(_, leaf)| leaf.to_string())).collect())
}

pub async fn create_jail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreateJail>,
) -> Result<Json<Value>, HttpError> {
    let task_id = parse_task_id(&id)?;
    enqueue(&state, task_id, TaskKind::CreateJail(body)).await
}

pub async fn update_ports(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePorts>,
) -> Result<Json<Value>, HttpError> {
    let task_id = parse_task_id(&id)?;
    enqueue(&state, task_id, TaskKind::UpdatePorts(body)).await
}

pub async fn run_build(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RunBuild>,
) -> Result<Json<Value>, HttpError> {
    let task_id = parse_task_id(&id)?;
    enqueue(&state, task_id, TaskKind::RunBuild(body)).await
}

pub async fn get_depends(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GetDepends>,
) -> Result<Json<Value>, HttpError> {
    let task_id = parse_task_id(&id)?;
    enqueue(&state, task_id, TaskKind::GetDepends(body)).await
}

pub async fn result(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, HttpError> {
    let task_id = parse_task_id(&id)?;
    let (status, result) = state.store.get_result(&task_id).await?.ok_or(HttpError::NotFound)?;
    let result_value = match result {
        Some(bytes) => serde_json::from_slice(&bytes)?,
        None => Value::Null,
    };
    Ok(Json(json!([status.as_i32(), result_value])))
}

pub async fn log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let task_id = parse_task_id(&id)?;
    let since = params.get("since").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);

    let wants_sse = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("text/event-stream"))
        .unwrap_or(false);

    if wants_sse {
        return Ok(sse::log_stream(state.store.clone(), task_id, since).into_response());
    }

    // `since` asks for a snapshot of whatever's buffered now; without it the
    // caller wants the finished log, so wait for the terminator.
    let records = if params.contains_key("since") {
        state.store.get_log(&task_id, since).await?.0
    } else {
        wait_for_completed_log(&state.store, &task_id, since).await?
    };
    let entries: Vec<Value> = records
        .iter()
        .filter(|record| !record.is_terminator())
        .map(|record| {
            let data = record.data.as_deref().unwrap_or_default();
            let data = serde_json::from_slice(data).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(data).into_owned()));
            json!({ "rowid": record.rowid, "data": data })
        })
        .collect();
    Ok(Json(Value::Array(entries)).into_response())
}

async fn wait_for_completed_log(
    store: &Arc<TaskStore>,
    id: &TaskId,
    since: i64,
) -> Result<Vec<pdm_core::LogRecord>, HttpError> {
    loop {
        let (records, terminated) = store.get_log(id, since).await?;
        if terminated {
            return Ok(records);
        }
        store.wait_for_changes().await?;
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
