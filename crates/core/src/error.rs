// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error kind for the worker core.

use thiserror::Error;

/// Errors surfaced by task handlers and the components they drive.
///
/// Each lower-level crate (`pdm-store`, `pdm-process`, `pdm-volume`, `pdm-follow`)
/// defines its own `thiserror` enum and converts into this one at the boundary
/// where a task handler calls it, so a task's final error message stays readable
/// without leaking every crate's internal variant names.
#[derive(Debug, Error)]
pub enum PdmError {
    /// A dataset, snapshot, jail, or ports tree that was expected to exist is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A temporary name collided with an existing dataset; callers retry internally,
    /// so this should only surface if retries are exhausted.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A version or branch string failed to parse against its expected format.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// A child process exited with a code outside the caller's accepted set.
    #[error("command failed: {0}")]
    CommandError(String),

    /// The builder reported non-empty `Error:` lines during a dry run.
    #[error("build error: {0}")]
    BuildError(String),

    /// The task store failed to read or write.
    #[error("storage error: {0}")]
    StorageError(String),

    /// The worker received a shutdown signal mid-task.
    #[error("interrupted")]
    Interrupted,
}

impl PdmError {
    /// True for errors whose teardown should be swallowed during scope cleanup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PdmError::NotFound(_))
    }
}
