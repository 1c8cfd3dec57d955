// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watches a directory for new regular files and tails each one as it
//! grows, yielding `(filename, line)` pairs.
//!
//! Grounded on the reference implementation's kqueue-based `follow()`
//! coroutine, substituting the cross-platform `notify` crate for the
//! platform-specific wakeup source (see the corpus's own agent log
//! watcher, which does the same substitution for the same reason).

use crate::error::FollowError;
use crate::lines;
use futures_util::stream::Stream;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

enum Ctl {
    Remove(String),
    Close,
}

struct Tailed {
    file: File,
    offset: u64,
    buf: Vec<u8>,
}

/// A live directory follower. Drop cancels the background task; prefer
/// calling [`DirectoryFollower::close`] and draining the stream so buffered
/// lines aren't lost.
pub struct DirectoryFollower {
    cmd_tx: mpsc::UnboundedSender<Ctl>,
    lines: ReceiverStream<(String, String)>,
    _watcher: RecommendedWatcher,
    _task: JoinHandle<()>,
}

impl DirectoryFollower {
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, FollowError> {
        let path = path.into();
        let (notify_tx, mut notify_rx) = mpsc::channel::<()>(64);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if res.is_ok() {
                let _ = notify_tx.blocking_send(());
            }
        })
        .map_err(|source| FollowError::Watch { path: path.clone(), source })?;
        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|source| FollowError::Watch { path: path.clone(), source })?;

        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Ctl>();
        let (line_tx, line_rx) = mpsc::channel::<(String, String)>(256);

        let task_path = path.clone();
        let task = tokio::spawn(async move {
            let mut files: HashMap<String, Tailed> = HashMap::new();
            let mut closing = false;
            let mut cmd_open = true;

            scan(&task_path, &mut files, &line_tx).await;

            loop {
                if closing && files.is_empty() {
                    break;
                }
                tokio::select! {
                    event = notify_rx.recv() => {
                        if event.is_none() {
                            closing = true;
                            continue;
                        }
                        scan(&task_path, &mut files, &line_tx).await;
                    }
                    ctl = cmd_rx.recv(), if cmd_open => {
                        match ctl {
                            Some(Ctl::Remove(name)) => {
                                if let Some(tailed) = files.remove(&name) {
                                    flush_final(&name, tailed, &line_tx).await;
                                }
                            }
                            Some(Ctl::Close) => closing = true,
                            None => { cmd_open = false; closing = true; }
                        }
                    }
                }
            }

            for (name, tailed) in files.drain() {
                flush_final(&name, tailed, &line_tx).await;
            }
        });

        Ok(Self {
            cmd_tx,
            lines: ReceiverStream::new(line_rx),
            _watcher: watcher,
            _task: task,
        })
    }

    /// Request graceful shutdown: no new files are picked up, already-open
    /// files drain their remaining buffered lines and close.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Ctl::Close);
    }

    /// Request early close of one tailed file, typically after its
    /// sentinel end-of-build line has been seen.
    pub fn remove(&self, filename: impl Into<String>) {
        let _ = self.cmd_tx.send(Ctl::Remove(filename.into()));
    }
}

impl Stream for DirectoryFollower {
    type Item = (String, String);

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.lines).poll_next(cx)
    }
}

async fn scan(path: &Path, files: &mut HashMap<String, Tailed>, out: &mpsc::Sender<(String, String)>) {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(source) => {
            tracing::warn!(path = %path.display(), %source, "failed to scan directory");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let file_type = match entry.file_type().await {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if files.contains_key(&name) {
            continue;
        }
        match File::open(entry.path()).await {
            Ok(file) => {
                files.insert(name, Tailed { file, offset: 0, buf: Vec::new() });
            }
            Err(source) => {
                tracing::warn!(file = %name, %source, "failed to open tailed file");
            }
        }
    }

    for (name, tailed) in files.iter_mut() {
        read_new_bytes(name, tailed, out).await;
    }
}

async fn read_new_bytes(name: &str, tailed: &mut Tailed, out: &mpsc::Sender<(String, String)>) {
    if let Err(source) = tailed.file.seek(std::io::SeekFrom::Start(tailed.offset)).await {
        tracing::warn!(file = name, %source, "failed to seek tailed file");
        return;
    }
    let mut chunk = Vec::new();
    match tailed.file.read_to_end(&mut chunk).await {
        Ok(n) => {
            tailed.offset += n as u64;
            for line in lines::feed(&mut tailed.buf, &chunk) {
                let _ = out.send((name.to_string(), line)).await;
            }
        }
        Err(source) => {
            tracing::warn!(file = name, %source, "failed to read tailed file");
        }
    }
}

async fn flush_final(name: &str, mut tailed: Tailed, out: &mpsc::Sender<(String, String)>) {
    read_new_bytes(name, &mut tailed, out).await;
    if !tailed.buf.is_empty() {
        let line = String::from_utf8_lossy(&tailed.buf).into_owned();
        let _ = out.send((name.to_string(), line)).await;
    }
}

#[cfg(test)]
#[path = "follower_tests.rs"]
mod tests;
