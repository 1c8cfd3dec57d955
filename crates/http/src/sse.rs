// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `/log/{id}` SSE branch: one `Event` per log record, `id` set to the
//! record's rowid, ending when the store's NULL terminator is read. A
//! client disconnecting drops the response body future, which drops this
//! stream and its in-flight `wait_for_changes()` await with it.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use pdm_core::TaskId;
use pdm_store::{StoreError, TaskStore};
use std::sync::Arc;
use std::time::Duration;

struct Cursor {
    store: Arc<TaskStore>,
    id: TaskId,
    since_rowid: i64,
}

/// One undelivered log line: rowid plus its raw log-record bytes decoded
/// as UTF-8 (lossily — log payloads are always the JSON text
/// `pdm-worker` wrote, so this never actually hits the replacement-char
/// path in practice). Kept separate from `axum::response::sse::Event` so
/// the polling logic can be tested without depending on `Event`'s
/// otherwise write-only internals.
fn log_entries(store: Arc<TaskStore>, id: TaskId, since_rowid: i64) -> impl Stream<Item = Result<(i64, String), StoreError>> {
    let cursor = Cursor { store, id, since_rowid };
    stream::unfold(Some(cursor), |cursor| async move {
        let mut cursor = cursor?;
        loop {
            let (records, _terminated) = match cursor.store.get_log(&cursor.id, cursor.since_rowid).await {
                Ok(v) => v,
                Err(err) => return Some((Err(err), None)),
            };
            if let Some(record) = records.into_iter().next() {
                if record.is_terminator() {
                    return None;
                }
                cursor.since_rowid = record.rowid;
                let data = String::from_utf8_lossy(&record.data.unwrap_or_default()).into_owned();
                return Some((Ok((record.rowid, data)), Some(cursor)));
            }
            if let Err(err) = cursor.store.wait_for_changes().await {
                return Some((Err(err), None));
            }
        }
    })
}

pub fn log_stream(store: Arc<TaskStore>, id: TaskId, since_rowid: i64) -> Sse<impl Stream<Item = Result<Event, StoreError>>> {
    let events = log_entries(store, id, since_rowid)
        .map(|entry| entry.map(|(rowid, data)| Event::default().id(rowid.to_string()).data(data)));
    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)).text("keepalive"))
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
