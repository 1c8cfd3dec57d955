// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pdm_core::{TaskId, TaskStatus};
use std::time::Duration;

fn id(hex: &str) -> TaskId {
    TaskId::parse(hex).expect("valid test id")
}

async fn open_temp() -> (TaskStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path().join("tasks.db")).await.expect("open");
    (store, dir)
}

#[tokio::test]
async fn enqueue_then_start_next_task_claims_it() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000001");
    store.enqueue(tid.clone(), b"payload".to_vec()).await.expect("enqueue");

    let (claimed, payload) = store.start_next_task().await.expect("query").expect("a task");
    assert_eq!(claimed, tid);
    assert_eq!(payload, b"payload");

    assert!(store.start_next_task().await.expect("query").is_none());
}

#[tokio::test]
async fn enqueue_rejects_duplicate_id() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000002");
    store.enqueue(tid.clone(), b"a".to_vec()).await.expect("first enqueue");
    let err = store.enqueue(tid.clone(), b"b".to_vec()).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(got) if got == tid));
}

#[tokio::test]
async fn start_next_task_returns_oldest_first() {
    let (store, _dir) = open_temp().await;
    let first = id("00000000000000000000000000000003");
    let second = id("00000000000000000000000000000004");
    store.enqueue(first.clone(), b"1".to_vec()).await.expect("enqueue");
    store.enqueue(second.clone(), b"2".to_vec()).await.expect("enqueue");

    let (claimed, _) = store.start_next_task().await.expect("query").expect("a task");
    assert_eq!(claimed, first);
}

#[tokio::test]
async fn end_task_sets_result_and_terminates_log() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000005");
    store.enqueue(tid.clone(), b"payload".to_vec()).await.expect("enqueue");
    store.start_next_task().await.expect("query");
    store.enqueue_log(&tid, b"building\n".to_vec()).await.expect("log");
    store.end_task(&tid, b"ok".to_vec()).await.expect("end");

    let (status, result) = store.get_result(&tid).await.expect("query").expect("found");
    assert_eq!(status, TaskStatus::Done);
    assert_eq!(result, Some(b"ok".to_vec()));

    let (records, terminated) = store.get_log(&tid, 0).await.expect("query");
    assert!(terminated);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].data, Some(b"building\n".to_vec()));
    assert!(records[1].is_terminator());
}

#[tokio::test]
async fn end_task_rejects_unknown_id() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000006");
    let err = store.end_task(&tid, b"ok".to_vec()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(got) if got == tid));
}

#[tokio::test]
async fn get_log_respects_since_rowid() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000007");
    store.enqueue(tid.clone(), b"p".to_vec()).await.expect("enqueue");
    store.enqueue_log(&tid, b"line one\n".to_vec()).await.expect("log");
    let (first_batch, terminated) = store.get_log(&tid, 0).await.expect("query");
    assert!(!terminated);
    let watermark = first_batch.last().expect("one record").rowid;

    store.enqueue_log(&tid, b"line two\n".to_vec()).await.expect("log");
    let (second_batch, _) = store.get_log(&tid, watermark).await.expect("query");
    assert_eq!(second_batch.len(), 1);
    assert_eq!(second_batch[0].data, Some(b"line two\n".to_vec()));
}

#[tokio::test]
async fn get_result_returns_none_for_unknown_id() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000008");
    assert!(store.get_result(&tid).await.expect("query").is_none());
}

#[tokio::test]
async fn wait_for_changes_wakes_on_write() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000009");

    let mut rx = store.changes.clone();
    let waiter = tokio::spawn(async move { tokio::time::timeout(Duration::from_secs(5), rx.changed()).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    store.enqueue(tid, b"payload".to_vec()).await.expect("enqueue");

    let result = waiter.await.expect("task joins");
    assert!(result.is_ok(), "expected a change notification before the timeout");
}
