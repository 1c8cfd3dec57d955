// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_release_with_patch() {
    let v = FreeBSDVersion::parse("13.2-RELEASE-p4").expect("parses");
    assert_eq!(v.shortname(), "132p4");
}

#[test]
fn parses_release_without_patch() {
    let v = FreeBSDVersion::parse("13.2-RELEASE").expect("parses");
    assert_eq!(v.shortname(), "132p0");
}

#[test]
fn parses_beta() {
    let v = FreeBSDVersion::parse("14.0-BETA2").expect("parses");
    assert_eq!(v.shortname(), "140b2");
}

#[test]
fn release_is_the_digits_only_git_branch_suffix() {
    let v = FreeBSDVersion::parse("13.2-RELEASE-p4").expect("parses");
    assert_eq!(v.release(), "13.2");
    assert_eq!(v.branch_tag(), "p4");
    assert_eq!(v.longname(), "13.2-RELEASE-p4");
}

#[test]
fn longname_round_trips_release_without_patch() {
    let v = FreeBSDVersion::parse("13.2-RELEASE").expect("parses");
    assert_eq!(v.longname(), "13.2-RELEASE");
}

#[test]
fn longname_round_trips_beta() {
    let v = FreeBSDVersion::parse("14.0-BETA2").expect("parses");
    assert_eq!(v.longname(), "14.0-BETA2");
    assert_eq!(v.branch_tag(), "b2");
}

#[test]
fn rejects_unknown_type() {
    let err = FreeBSDVersion::parse("13.2-FOO").unwrap_err();
    assert!(matches!(err, PdmError::InvalidVersion(_)));
}

#[test]
fn parses_ports_branch() {
    let v = PortsBranchVersion::parse("2023Q4").expect("parses");
    assert_eq!(v.name(), "2023Q4");
    assert_eq!(v.snapshot(), None);
}

#[test]
fn parses_ports_branch_with_snapshot() {
    let v = PortsBranchVersion::parse("2023Q4@1699999999").expect("parses");
    assert_eq!(v.name(), "2023Q4");
    assert_eq!(v.snapshot(), Some(1699999999));
}

#[test]
fn rejects_bad_branch() {
    assert!(PortsBranchVersion::parse("2023-Q4").is_err());
    assert!(PortsBranchVersion::parse("1999Q1").is_err());
}

proptest::proptest! {
    #[test]
    fn shortname_is_idempotent_for_release(major in 1u32..30, minor in 0u32..10, patch in 0u32..50) {
        let input = if patch == 0 {
            format!("{major}.{minor}-RELEASE")
        } else {
            format!("{major}.{minor}-RELEASE-p{patch}")
        };
        let parsed = FreeBSDVersion::parse(&input);
        if let Ok(v) = parsed {
            let short = v.shortname();
            // shortname is stable under re-deriving the same fields
            prop_assert_eq!(short.clone(), v.shortname());
            prop_assert!(short.starts_with(&format!("{major}{minor}")));
        }
    }
}
