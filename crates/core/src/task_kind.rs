// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for the recognized task kinds.
//!
//! These are pure data: strict JSON decoding with a `kind` discriminator. The
//! `run(env, task_id)` behavior the data model describes lives in `pdm-worker`,
//! which owns the environment types these tasks are driven against — keeping that
//! dependency one-directional (worker depends on core, not the reverse).

use serde::{Deserialize, Serialize};

/// A task's parsed payload, tagged by `kind` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    CreateJail(CreateJail),
    UpdatePorts(UpdatePorts),
    RunBuild(RunBuild),
    GetDepends(GetDepends),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJail {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePorts {
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBuild {
    pub jail_version: String,
    pub ports_branch: String,
    #[serde(default)]
    pub origins: Vec<String>,
    #[serde(default)]
    pub portja_targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDepends {
    pub jail_version: String,
    pub ports_branch: String,
    pub origin: String,
    #[serde(default)]
    pub portja_target: Option<String>,
}

impl TaskKind {
    /// Parse a task's opaque payload bytes into a typed task kind.
    pub fn from_payload(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    /// Serialize back to the opaque payload bytes stored by the task store.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// The outcome of a finished task, stored as the task's `result` bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskResult {
    Success { detail: serde_json::Value },
    Error { detail: String },
}

#[cfg(test)]
#[path = "task_kind_tests.rs"]
mod tests;
