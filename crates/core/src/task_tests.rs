// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn accepts_32_lowercase_hex() {
    let id = TaskId::parse("0123456789abcdef0123456789abcdef").expect("valid");
    assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
}

#[test]
fn rejects_wrong_length() {
    assert!(TaskId::parse("abc").is_err());
}

#[test]
fn rejects_uppercase() {
    assert!(TaskId::parse("0123456789ABCDEF0123456789abcdef").is_err());
}

#[test]
fn rejects_non_hex() {
    assert!(TaskId::parse("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_err());
}

#[test]
fn status_roundtrips_through_i32() {
    for s in [TaskStatus::Pending, TaskStatus::Running, TaskStatus::Done] {
        assert_eq!(TaskStatus::from_i32(s.as_i32()), Some(s));
    }
}

#[test]
fn terminator_record_has_no_data() {
    let id = TaskId::parse("0123456789abcdef0123456789abcdef").expect("valid");
    let rec = LogRecord { task_id: id, rowid: 1, data: None };
    assert!(rec.is_terminator());
}
