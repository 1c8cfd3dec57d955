// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn splits_on_lf() {
    let mut buf = Vec::new();
    let lines = feed(&mut buf, b"one\ntwo\n");
    assert_eq!(lines, vec!["one", "two"]);
    assert!(buf.is_empty());
}

#[test]
fn splits_on_cr_and_crlf() {
    let mut buf = Vec::new();
    let lines = feed(&mut buf, b"one\rtwo\r\nthree");
    assert_eq!(lines, vec!["one", "two"]);
    assert_eq!(buf, b"three");
}

#[test]
fn retains_partial_line_across_calls() {
    let mut buf = Vec::new();
    assert!(feed(&mut buf, b"partial").is_empty());
    assert_eq!(buf, b"partial");
    let lines = feed(&mut buf, b" line\n");
    assert_eq!(lines, vec!["partial line"]);
}

#[test]
fn empty_chunk_yields_nothing() {
    let mut buf = b"carry".to_vec();
    assert!(feed(&mut buf, b"").is_empty());
    assert_eq!(buf, b"carry");
}
