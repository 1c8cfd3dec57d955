// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios that exercise the crates composing the worker
//! without needing a live `zfs`/`poudriere` host. Scenarios that do
//! (jail creation, a real `RunBuild`) aren't runnable in this harness and
//! are covered at the unit level inside `pdm-worker` instead.

use futures_util::StreamExt;
use pdm_core::{FreeBSDVersion, PdmError, PortsBranchVersion, TaskId};
use pdm_follow::DirectoryFollower;
use pdm_store::TaskStore;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

async fn next_with_timeout(follower: &mut DirectoryFollower) -> Option<(String, String)> {
    tokio::time::timeout(Duration::from_secs(5), follower.next()).await.ok().flatten()
}

fn task_id(hex: &str) -> TaskId {
    TaskId::parse(hex).expect("valid task id")
}

/// Scenario: directory follower. `f1` gets two complete lines, `f2` gets
/// one partial line; closing drains exactly `[(f1,"a"), (f1,"b"), (f2,"c")]`.
#[tokio::test]
async fn directory_follower_yields_lines_in_write_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut follower = DirectoryFollower::new(dir.path()).await.expect("watch");

    let mut f1 = tokio::fs::File::create(dir.path().join("f1")).await.expect("create f1");
    f1.write_all(b"a\nb\n").await.expect("write f1");
    f1.flush().await.expect("flush f1");

    assert_eq!(next_with_timeout(&mut follower).await, Some(("f1".to_string(), "a".to_string())));
    assert_eq!(next_with_timeout(&mut follower).await, Some(("f1".to_string(), "b".to_string())));

    let mut f2 = tokio::fs::File::create(dir.path().join("f2")).await.expect("create f2");
    f2.write_all(b"c").await.expect("write f2");
    f2.flush().await.expect("flush f2");
    tokio::time::sleep(Duration::from_millis(200)).await;

    follower.close();
    assert_eq!(next_with_timeout(&mut follower).await, Some(("f2".to_string(), "c".to_string())));
    assert_eq!(next_with_timeout(&mut follower).await, None);
}

/// Scenario: version parse. Short-form rendering and a rejected input.
#[test]
fn version_parsing_renders_short_forms_and_rejects_garbage() {
    let version = FreeBSDVersion::parse("13.2-RELEASE-p4").expect("parses");
    assert_eq!(version.shortname(), "132p4");

    let branch = PortsBranchVersion::parse("2023Q4").expect("parses");
    assert_eq!(branch.name(), "2023Q4");

    let err = FreeBSDVersion::parse("13.2-FOO").unwrap_err();
    assert!(matches!(err, PdmError::InvalidVersion(_)));
}

/// Scenario: queue FIFO plus the single-active invariant. Two enqueued
/// tasks are claimed oldest-first, and a claimed task can't be claimed
/// again until it's ended.
#[tokio::test]
async fn store_claims_tasks_fifo_and_single_active() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path().join("taskdb.sqlite")).await.expect("open store");

    let a = task_id("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let b = task_id("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    store.enqueue(a.clone(), b"payload-a".to_vec()).await.expect("enqueue a");
    store.enqueue(b.clone(), b"payload-b".to_vec()).await.expect("enqueue b");

    let (first_id, _) = store.start_next_task().await.expect("claim").expect("some task");
    assert_eq!(first_id, a);

    // `a` is RUNNING now; the next claim must skip it and return `b`, not
    // hand `a` out again.
    let (second_id, _) = store.start_next_task().await.expect("claim").expect("some task");
    assert_eq!(second_id, b);

    assert!(store.start_next_task().await.expect("claim").is_none());
}

/// Scenario: log monotonicity and termination. Rowids strictly increase,
/// and ending a task appends exactly one NULL terminator.
#[tokio::test]
async fn store_log_rowids_increase_and_terminate_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::open(dir.path().join("taskdb.sqlite")).await.expect("open store");

    let id = task_id("cccccccccccccccccccccccccccccccc");
    store.enqueue(id.clone(), b"payload".to_vec()).await.expect("enqueue");
    store.start_next_task().await.expect("claim").expect("some task");

    store.enqueue_log(&id, b"line one".to_vec()).await.expect("log 1");
    store.enqueue_log(&id, b"line two".to_vec()).await.expect("log 2");

    let (records, terminated) = store.get_log(&id, 0).await.expect("read log");
    assert!(!terminated);
    assert_eq!(records.len(), 2);
    assert!(records[0].rowid < records[1].rowid);

    store
        .end_task(&id, br#"{"status":"success","detail":{}}"#.to_vec())
        .await
        .expect("end task");

    let (records, terminated) = store.get_log(&id, 0).await.expect("read log after end");
    assert!(terminated);
    assert_eq!(records.len(), 3);
    assert!(records.last().expect("terminator").is_terminator());
}
