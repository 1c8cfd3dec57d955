// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn pool_is_first_path_segment() {
    assert_eq!(Dataset::new("zroot/poudomatic/jails").pool(), "zroot");
}

#[test]
fn child_joins_with_slash() {
    assert_eq!(Dataset::new("zroot/poudomatic").child("jails").name, "zroot/poudomatic/jails");
}

#[test]
fn snapshot_parses_and_reassembles() {
    let snap = Snapshot::parse("zroot/poudomatic/jails@13.2-RELEASE-p4").expect("parses");
    assert_eq!(snap.dataset, "zroot/poudomatic/jails");
    assert_eq!(snap.name, "13.2-RELEASE-p4");
    assert_eq!(snap.full_name(), "zroot/poudomatic/jails@13.2-RELEASE-p4");
}

#[test]
fn snapshot_parse_rejects_missing_at() {
    assert!(Snapshot::parse("zroot/poudomatic/jails").is_none());
}
