// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures_util::StreamExt;
use pdm_core::TaskId;
use std::time::Duration;

fn id(hex: &str) -> TaskId {
    TaskId::parse(hex).expect("valid test id")
}

async fn open_temp() -> (Arc<TaskStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path().join("tasks.db")).await.expect("open");
    (Arc::new(store), dir)
}

#[tokio::test]
async fn yields_log_records_in_order_then_ends_at_terminator() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000011");
    store.enqueue(tid.clone(), b"payload".to_vec()).await.expect("enqueue");
    store.start_next_task().await.expect("claim").expect("a task");
    store.enqueue_log(&tid, b"line one".to_vec()).await.expect("log");
    store.enqueue_log(&tid, b"line two".to_vec()).await.expect("log");
    store.end_task(&tid, b"{}".to_vec()).await.expect("end");

    let stream = log_entries(store.clone(), tid, 0);
    futures_util::pin_mut!(stream);

    let (first_rowid, first_data) = stream.next().await.expect("first entry").expect("no store error");
    assert_eq!(first_data, "line one");
    let (second_rowid, second_data) = stream.next().await.expect("second entry").expect("no store error");
    assert_eq!(second_data, "line two");
    assert!(second_rowid > first_rowid);

    assert!(stream.next().await.is_none(), "stream must end once the terminator is read");
}

#[tokio::test]
async fn waits_for_a_change_before_yielding_a_late_log_line() {
    let (store, _dir) = open_temp().await;
    let tid = id("00000000000000000000000000000012");
    store.enqueue(tid.clone(), b"payload".to_vec()).await.expect("enqueue");
    store.start_next_task().await.expect("claim").expect("a task");

    let reader_store = store.clone();
    let reader_id = tid.clone();
    let reader = tokio::spawn(async move {
        let stream = log_entries(reader_store, reader_id, 0);
        futures_util::pin_mut!(stream);
        tokio::time::timeout(Duration::from_secs(5), stream.next()).await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    store.enqueue_log(&tid, b"finally".to_vec()).await.expect("log");

    let (_rowid, data) = reader.await.expect("task joins").expect("no timeout").expect("an entry").expect("no store error");
    assert_eq!(data, "finally");
}
