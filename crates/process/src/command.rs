// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin, cancellable wrapper around [`tokio::process::Command`].
//!
//! Mirrors the worker's own subprocess helper: build up a command, feed it
//! optional stdin, stream combined stdout/stderr line-by-line to a
//! [`LogSink`], and tear it down with a configurable stop signal instead of
//! a bare kill.

use crate::error::ProcessError;
use crate::sink::{BufferSink, LogSink};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::watch;

/// A not-yet-spawned command, built up fluently.
#[derive(Debug, Clone)]
pub struct Command {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
    exit_ok: HashSet<i32>,
    stop_signal: Signal,
    stdin_data: Option<Vec<u8>>,
}

impl Command {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            exit_ok: HashSet::from([0]),
            stop_signal: Signal::SIGINT,
            stdin_data: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Exit codes that count as success. Defaults to `{0}`.
    pub fn exit_ok(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.exit_ok = codes.into_iter().collect();
        self
    }

    /// Signal sent to the child when the caller cancels a [`Command::pipe_to`] run.
    pub fn stop_signal(mut self, signal: Signal) -> Self {
        self.stop_signal = signal;
        self
    }

    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin_data = Some(data.into());
        self
    }

    fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().to_string()));
        parts.join(" ")
    }

    fn build(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(if self.stdin_data.is_some() { Stdio::piped() } else { Stdio::null() });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Run to completion, collecting combined stdout/stderr, with no way to
    /// cancel early. Convenience wrapper over [`Command::pipe_to`].
    pub async fn run(&self) -> Result<Vec<u8>, ProcessError> {
        let (_tx, rx) = watch::channel(false);
        let sink = Arc::new(BufferSink::default());
        self.pipe_to(sink.clone(), rx).await?;
        Ok(Arc::try_unwrap(sink).unwrap_or_default().into_inner())
    }

    /// Run to completion, streaming each combined stdout/stderr line to
    /// `sink` as it arrives. If `cancel` ever reads `true`, `stop_signal` is
    /// sent to the child; the call still waits for it to exit afterwards.
    pub async fn pipe_to(
        &self,
        sink: Arc<dyn LogSink>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<(), ProcessError> {
        let command = self.display();
        let mut child: Child = self.build().spawn().map_err(|source| ProcessError::Spawn {
            command: command.clone(),
            source,
        })?;

        if let Some(data) = &self.stdin_data {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data).await.map_err(|source| ProcessError::Io {
                    command: command.clone(),
                    source,
                })?;
            }
        }

        let pid = child.id();
        // build() always sets Stdio::piped() for both streams.
        #[allow(clippy::expect_used)]
        let mut stdout = BufReader::new(child.stdout.take().expect("piped stdout")).lines();
        #[allow(clippy::expect_used)]
        let mut stderr = BufReader::new(child.stderr.take().expect("piped stderr")).lines();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut signalled = false;

        loop {
            if stdout_done && stderr_done {
                break;
            }
            tokio::select! {
                line = stdout.next_line(), if !stdout_done => {
                    match line.map_err(|source| ProcessError::Io { command: command.clone(), source })? {
                        Some(line) => sink.write_line(line.as_bytes()).await,
                        None => stdout_done = true,
                    }
                }
                line = stderr.next_line(), if !stderr_done => {
                    match line.map_err(|source| ProcessError::Io { command: command.clone(), source })? {
                        Some(line) => sink.write_line(line.as_bytes()).await,
                        None => stderr_done = true,
                    }
                }
                changed = cancel.changed(), if !signalled => {
                    if changed.is_ok() && *cancel.borrow() {
                        signalled = true;
                        if let Some(pid) = pid {
                            signal::kill(Pid::from_raw(pid as i32), self.stop_signal).map_err(|source| {
                                ProcessError::Signal { command: command.clone(), source }
                            })?;
                        }
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|source| ProcessError::Io {
            command: command.clone(),
            source,
        })?;

        if signalled {
            return Err(ProcessError::Interrupted(command));
        }
        match status.code() {
            Some(code) if self.exit_ok.contains(&code) => Ok(()),
            code => Err(ProcessError::ExitStatus {
                command,
                code,
                output: Vec::new(),
            }),
        }
    }
}
