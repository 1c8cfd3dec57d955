// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identity and the durable task/log record shapes.

use crate::error::PdmError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A client-chosen 32-character lowercase hex task id.
///
/// Unlike the generated ids elsewhere in this codebase, `TaskId`s are supplied by
/// the caller and merely validated, not minted here; collisions are the caller's
/// problem (see the data model's collision-free assumption).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Validate and wrap a client-supplied id string.
    pub fn parse(id: impl Into<String>) -> Result<Self, PdmError> {
        let id = id.into();
        let valid = id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase());
        if valid {
            Ok(Self(id))
        } else {
            Err(PdmError::InvalidVersion(format!(
                "task id must be 32 lowercase hex characters: {id:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = PdmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a task row.
///
/// Monotonically non-decreasing for a given task: PENDING → RUNNING → DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum TaskStatus {
    Pending = 1,
    Running = 2,
    Done = 3,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Running => "running",
        Done => "done",
    }
}

impl TaskStatus {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Self::Pending),
            2 => Some(Self::Running),
            3 => Some(Self::Done),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// A stored task row: opaque payload bytes in, opaque result bytes out.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub payload: Vec<u8>,
    pub status: TaskStatus,
    pub result: Option<Vec<u8>>,
}

/// One append-only log record for a task.
///
/// `data: None` is the NULL sentinel marking end-of-stream; at most one may exist
/// per task, and only as the last record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub task_id: TaskId,
    pub rowid: i64,
    pub data: Option<Vec<u8>>,
}

impl LogRecord {
    pub fn is_terminator(&self) -> bool {
        self.data.is_none()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
