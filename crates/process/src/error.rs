// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command:?} exited with status {code:?}")]
    ExitStatus {
        command: String,
        code: Option<i32>,
        output: Vec<u8>,
    },

    #[error("io error communicating with {command:?}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to signal {command:?}: {source}")]
    Signal {
        command: String,
        #[source]
        source: nix::Error,
    },

    #[error("interrupted waiting for {0:?}")]
    Interrupted(String),
}
