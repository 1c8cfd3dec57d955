// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destinations for a running command's combined stdout/stderr.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receives output lines as a command runs.
///
/// Implemented by the task store's log appender and, in tests, by an
/// in-memory buffer. Lines are delivered without a trailing newline.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn write_line(&self, line: &[u8]);
}

/// Collects every line into memory, in order. Used by [`super::Command::run`]
/// and in tests that just want the combined output back.
#[derive(Debug, Default)]
pub struct BufferSink {
    inner: parking_lot::Mutex<Vec<u8>>,
}

#[async_trait]
impl LogSink for BufferSink {
    async fn write_line(&self, line: &[u8]) {
        let mut buf = self.inner.lock();
        buf.extend_from_slice(line);
        buf.push(b'\n');
    }
}

impl BufferSink {
    pub fn into_inner(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

/// Forwards each line over an mpsc channel, for callers that want to stream
/// output as it arrives (e.g. the HTTP log endpoint) rather than buffer it.
pub struct ChannelSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl LogSink for ChannelSink {
    async fn write_line(&self, line: &[u8]) {
        let _ = self.tx.send(line.to_vec()).await;
    }
}
