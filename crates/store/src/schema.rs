// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DDL for the task queue. Two tables: a task row per enqueued task, an
//! append-only log keyed by task id.

pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    tid    TEXT PRIMARY KEY,
    data   BLOB NOT NULL,
    status INTEGER NOT NULL DEFAULT 1 CHECK (status IN (1, 2, 3)),
    result BLOB
);

CREATE TABLE IF NOT EXISTS log (
    rowid INTEGER PRIMARY KEY AUTOINCREMENT,
    tid   TEXT NOT NULL,
    data  BLOB
);

CREATE INDEX IF NOT EXISTS log_tid_rowid ON log (tid, rowid);
";

pub fn init(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.execute_batch(CREATE_TABLES)
}
