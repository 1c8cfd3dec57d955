// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable task queue: a single `rusqlite` connection shared behind a
//! mutex, with change notification driven off the WAL side-file instead of
//! in-process pub/sub — so a reader in a different process (or a
//! differently-scheduled task in this one) still wakes up.
//!
//! The reference implementation holds a single APSW/SQLite connection the
//! same way; `pdm-store` plays the same "one writer, WAL readers" role, just
//! marshalled onto a dedicated blocking task so the async reactor never
//! blocks on a `rusqlite` call.

use crate::error::StoreError;
use crate::schema;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use pdm_core::{LogRecord, TaskId, TaskStatus};
use rusqlite::OptionalExtension;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

type Conn = Arc<parking_lot::Mutex<rusqlite::Connection>>;

pub struct TaskStore {
    conn: Conn,
    changes: watch::Receiver<u64>,
    _watcher: RecommendedWatcher,
}

impl TaskStore {
    /// Open (creating if absent) the task database at `path`, switch it to
    /// WAL journaling, and start watching its `-wal` side-file for writes.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let conn_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<rusqlite::Connection, StoreError> {
            let conn = rusqlite::Connection::open(&conn_path)?;
            schema::init(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::Closed)??;
        let conn = Arc::new(parking_lot::Mutex::new(conn));

        let (watcher, changes) = watch_wal_file(&path)?;

        Ok(Self { conn, changes, _watcher: watcher })
    }

    async fn with_conn<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|_| StoreError::Closed)?
        .map_err(StoreError::from)
    }

    pub async fn enqueue(&self, id: TaskId, payload: Vec<u8>) -> Result<(), StoreError> {
        let tid = id.as_str().to_string();
        let inserted = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO tasks (tid, data, status) VALUES (?1, ?2, 1)",
                    (&tid, &payload),
                )
            })
            .await?;
        if inserted == 0 {
            return Err(StoreError::AlreadyExists(id));
        }
        Ok(())
    }

    /// Atomically claim the oldest pending task, if any, moving it to
    /// `RUNNING`.
    pub async fn start_next_task(&self) -> Result<Option<(TaskId, Vec<u8>)>, StoreError> {
        let row = self
            .with_conn(|conn| {
                conn.query_row(
                    "UPDATE tasks SET status = 2 \
                     WHERE tid = (SELECT tid FROM tasks WHERE status = 1 ORDER BY rowid LIMIT 1) \
                     RETURNING tid, data",
                    (),
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
                )
                .optional()
            })
            .await?;
        Ok(match row {
            Some((tid, data)) => {
                let id = TaskId::parse(tid.clone()).map_err(|_| StoreError::Corrupt(tid))?;
                Some((id, data))
            }
            None => None,
        })
    }

    /// Mark a task done, store its result, and append the NULL log
    /// terminator.
    pub async fn end_task(&self, id: &TaskId, result: Vec<u8>) -> Result<(), StoreError> {
        let tid = id.as_str().to_string();
        let tid_for_log = tid.clone();
        let updated = self
            .with_conn(move |conn| {
                let tx = conn.unchecked_transaction()?;
                let updated = tx.execute("UPDATE tasks SET status = 3, result = ?2 WHERE tid = ?1", (&tid, &result))?;
                if updated > 0 {
                    tx.execute("INSERT INTO log (tid, data) VALUES (?1, NULL)", (&tid_for_log,))?;
                }
                tx.commit()?;
                Ok(updated)
            })
            .await?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    /// Append one non-terminal log record for a running task.
    pub async fn enqueue_log(&self, id: &TaskId, data: Vec<u8>) -> Result<(), StoreError> {
        let tid = id.as_str().to_string();
        let inserted = self
            .with_conn(move |conn| conn.execute("INSERT INTO log (tid, data) VALUES (?1, ?2)", (&tid, &data)))
            .await?;
        debug_assert_eq!(inserted, 1);
        Ok(())
    }

    pub async fn get_result(&self, id: &TaskId) -> Result<Option<(TaskStatus, Option<Vec<u8>>)>, StoreError> {
        let tid = id.as_str().to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT status, result FROM tasks WHERE tid = ?1",
                    (&tid,),
                    |row| Ok((row.get::<_, i32>(0)?, row.get::<_, Option<Vec<u8>>>(1)?)),
                )
                .optional()
            })
            .await?;
        Ok(row.and_then(|(status, result)| TaskStatus::from_i32(status).map(|status| (status, result))))
    }

    /// All log records for `id` with rowid greater than `since_rowid`, in
    /// ascending order, plus whether the NULL terminator has been seen.
    pub async fn get_log(&self, id: &TaskId, since_rowid: i64) -> Result<(Vec<LogRecord>, bool), StoreError> {
        let tid = id.as_str().to_string();
        let owned_id = id.clone();
        let rows = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare("SELECT rowid, data FROM log WHERE tid = ?1 AND rowid > ?2 ORDER BY rowid")?;
                let rows = stmt
                    .query_map((&tid, since_rowid), |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<Vec<u8>>>(1)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        let terminated = rows.iter().any(|(_, data)| data.is_none());
        let records = rows
            .into_iter()
            .map(|(rowid, data)| LogRecord { task_id: owned_id.clone(), rowid, data })
            .collect();
        Ok((records, terminated))
    }

    /// Await the next write to the underlying database (observed via its
    /// WAL side-file). Does not replay changes that happened before this
    /// call started.
    pub async fn wait_for_changes(&self) -> Result<(), StoreError> {
        let mut rx = self.changes.clone();
        rx.changed().await.map_err(|_| StoreError::Closed)
    }
}

fn watch_wal_file(db_path: &Path) -> Result<(RecommendedWatcher, watch::Receiver<u64>), StoreError> {
    let dir = db_path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let mut wal_name = db_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("")).to_os_string();
    wal_name.push("-wal");

    let (tx, rx) = watch::channel(0u64);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            if event_touches(&event, &wal_name) {
                tx.send_modify(|v| *v = v.wrapping_add(1));
            }
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

fn event_touches(event: &Event, wal_name: &OsString) -> bool {
    event.paths.iter().any(|p| p.file_name() == Some(wal_name.as_os_str()))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
