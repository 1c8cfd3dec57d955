// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn add_merges_with_right_hand_precedence() {
    let combined = no_atime() + compression();
    assert_eq!(combined.iter().collect::<Vec<_>>(), vec![("atime", "off"), ("compression", "zstd")]);
}

#[test]
fn add_overrides_same_key() {
    let combined = compression() + no_compression();
    assert_eq!(combined.iter().collect::<Vec<_>>(), vec![("compression", "off")]);
}

#[test]
fn create_args_pair_each_entry() {
    let props = no_atime().set("mountpoint", "none");
    assert_eq!(
        props.as_create_args(),
        vec!["-o".to_string(), "atime=off".to_string(), "-o".to_string(), "mountpoint=none".to_string()]
    );
}

#[test]
fn empty_props_has_no_create_args() {
    assert!(Props::new().as_create_args().is_empty());
}
