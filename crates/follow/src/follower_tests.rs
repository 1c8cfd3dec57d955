// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures_util::StreamExt;
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::AsyncWriteExt;

async fn next_with_timeout(follower: &mut DirectoryFollower) -> Option<(String, String)> {
    tokio::time::timeout(Duration::from_secs(5), follower.next()).await.ok().flatten()
}

#[tokio::test]
async fn tails_appended_lines_from_new_file() {
    let dir = tempdir().expect("tempdir");
    let mut follower = DirectoryFollower::new(dir.path()).await.expect("watch");

    let file_path = dir.path().join("port-a.log");
    let mut file = tokio::fs::File::create(&file_path).await.expect("create");
    file.write_all(b"building\n").await.expect("write");
    file.flush().await.expect("flush");

    let (name, line) = next_with_timeout(&mut follower).await.expect("line");
    assert_eq!(name, "port-a.log");
    assert_eq!(line, "building");

    file.write_all(b"done\n").await.expect("write");
    file.flush().await.expect("flush");
    let (name, line) = next_with_timeout(&mut follower).await.expect("line");
    assert_eq!(name, "port-a.log");
    assert_eq!(line, "done");

    follower.close();
}

#[tokio::test]
async fn remove_flushes_partial_line_before_dropping_file() {
    let dir = tempdir().expect("tempdir");
    let mut follower = DirectoryFollower::new(dir.path()).await.expect("watch");

    let file_path = dir.path().join("port-b.log");
    let mut file = tokio::fs::File::create(&file_path).await.expect("create");
    // No trailing newline: the line stays buffered as a partial line until
    // `remove` forces it to flush.
    file.write_all(b"build time: 1m").await.expect("write");
    file.flush().await.expect("flush");
    tokio::time::sleep(Duration::from_millis(200)).await;

    follower.remove("port-b.log");
    let (name, line) = next_with_timeout(&mut follower).await.expect("flushed partial line");
    assert_eq!(name, "port-b.log");
    assert_eq!(line, "build time: 1m");

    follower.close();
    assert!(next_with_timeout(&mut follower).await.is_none());
}

#[tokio::test]
async fn close_with_no_files_drains_immediately() {
    let dir = tempdir().expect("tempdir");
    let mut follower = DirectoryFollower::new(dir.path()).await.expect("watch");
    follower.close();
    assert!(next_with_timeout(&mut follower).await.is_none());
}
