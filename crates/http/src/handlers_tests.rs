// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_task_id_accepts_32_lowercase_hex_chars() {
    let id = parse_task_id("0123456789abcdef0123456789abcdef").expect("valid id");
    assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
}

#[test]
fn parse_task_id_rejects_wrong_length() {
    assert!(parse_task_id("abc").is_err());
}

#[test]
fn parse_task_id_rejects_uppercase_hex() {
    assert!(parse_task_id("0123456789ABCDEF0123456789abcdef").is_err());
}

#[tokio::test]
async fn enqueue_stores_the_payload_the_task_kind_would_dispatch_on() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(TaskStore::open(dir.path().join("tasks.db")).await.expect("open store"));
    let env = test_worker_env(&dir);
    let state = AppState { store: store.clone(), env };

    let task_id = parse_task_id("0123456789abcdef0123456789abcdef").expect("valid id");
    let kind = TaskKind::CreateJail(CreateJail { version: "13.2-RELEASE".to_string() });
    enqueue(&state, task_id.clone(), kind).await.expect("enqueue");

    let (claimed, payload) = store.start_next_task().await.expect("claim").expect("a task");
    assert_eq!(claimed, task_id);
    let decoded = TaskKind::from_payload(&payload).expect("decodes");
    assert!(matches!(decoded, TaskKind::CreateJail(task) if task.version == "13.2-RELEASE"));
}

#[tokio::test]
async fn log_with_since_returns_a_snapshot_without_waiting_for_completion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(TaskStore::open(dir.path().join("tasks.db")).await.expect("open store"));
    let env = test_worker_env(&dir);
    let state = AppState { store: store.clone(), env };

    let task_id = parse_task_id("0123456789abcdef0123456789abcdef").expect("valid id");
    store.enqueue(task_id.clone(), TaskKind::CreateJail(CreateJail { version: "13.2-RELEASE".to_string() }).to_payload().expect("payload")).await.expect("enqueue");
    store.enqueue_log(&task_id, b"\"building\"".to_vec()).await.expect("log line");

    let mut params = HashMap::new();
    params.insert("since".to_string(), "0".to_string());
    let response = log(State(state), Path(task_id.as_str().to_string()), Query(params), HeaderMap::new())
        .await
        .expect("log")
        .into_response();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

/// A `WorkerEnv` is mostly unusable without a live `zfs`/`poudriere` host;
/// `enqueue()` never touches it, so the struct is built by hand here
/// rather than through `WorkerEnv::open()`.
fn test_worker_env(dir: &tempfile::TempDir) -> Arc<pdm_worker::WorkerEnv> {
    use pdm_volume::{Dataset, Zfs};
    use pdm_worker::{WorkerConfig, WorkerEnv};

    let config = WorkerConfig {
        dataset: "zroot/poudomatic".to_string(),
        db_path: Some(dir.path().join("tasks.db")),
        ports_remote: "https://git.freebsd.org/ports.git".to_string(),
        log_filter: "info".to_string(),
        post_change_script: None,
    };
    let dataset = Dataset::new(config.dataset.clone());
    let path = dir.path().to_path_buf();
    let etc_path = path.join("etc");
    Arc::new(WorkerEnv {
        zfs: Zfs::default(),
        dataset: dataset.clone(),
        path: path.clone(),
        etc_path: etc_path.clone(),
        jails_dataset: dataset.child("jails"),
        ports_dataset: dataset.child("ports"),
        src_dataset: dataset.child("src"),
        packages_dataset: dataset.child("packages"),
        logs_path: path.join("logs"),
        config,
    })
}
