// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn detects_missing_dataset_message() {
    assert!(looks_like_missing(b"cannot open 'zroot/nope': dataset does not exist\n"));
    assert!(!looks_like_missing(b"cannot open 'zroot/nope': permission denied\n"));
}

#[test]
fn detects_missing_snapshot_message() {
    assert!(looks_like_missing(b"could not find any snapshots to destroy; check snapname\n"));
}

#[test]
fn detects_not_mounted_message() {
    assert!(looks_like_not_mounted(b"cannot unmount 'zroot/x': not currently mounted\n"));
}

#[test]
fn parses_tab_separated_rows() {
    let rows = parse_lines(b"zroot/a\tfilesystem\nzroot/a/b\tfilesystem\n\n");
    assert_eq!(
        rows,
        vec![
            vec!["zroot/a".to_string(), "filesystem".to_string()],
            vec!["zroot/a/b".to_string(), "filesystem".to_string()],
        ]
    );
}

#[test]
fn parses_single_column_rows() {
    let rows = parse_lines(b"zroot/a@snap1\nzroot/a@snap2\n");
    assert_eq!(rows, vec![vec!["zroot/a@snap1".to_string()], vec!["zroot/a@snap2".to_string()]]);
}
