// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn cli(dataset: Option<&str>) -> Cli {
    Cli {
        dataset: dataset.map(str::to_string),
        db_path: None,
        ports_remote: None,
        log_level: None,
        post_change_script: None,
    }
}

#[test]
#[serial]
fn cli_flag_takes_precedence_over_env() {
    std::env::set_var("POUDOMATIC_DATASET", "zroot/from-env");
    let config = WorkerConfig::from_cli(cli(Some("zroot/from-cli"))).expect("loads");
    assert_eq!(config.dataset, "zroot/from-cli");
    std::env::remove_var("POUDOMATIC_DATASET");
}

#[test]
#[serial]
fn falls_back_to_env_when_no_flag() {
    std::env::set_var("POUDOMATIC_DATASET", "zroot/from-env");
    let config = WorkerConfig::from_cli(cli(None)).expect("loads");
    assert_eq!(config.dataset, "zroot/from-env");
    std::env::remove_var("POUDOMATIC_DATASET");
}

#[test]
#[serial]
fn errors_when_dataset_unset_everywhere() {
    std::env::remove_var("POUDOMATIC_DATASET");
    let err = WorkerConfig::from_cli(cli(None)).unwrap_err();
    assert!(matches!(err, WorkerError::Environment(_)));
}

#[test]
#[serial]
fn defaults_ports_remote_and_log_filter_when_unset() {
    std::env::remove_var("POUDOMATIC_DATASET");
    std::env::remove_var("POUDOMATIC_PORTS_REMOTE");
    std::env::remove_var("RUST_LOG");
    let config = WorkerConfig::from_cli(cli(Some("zroot/poudomatic"))).expect("loads");
    assert_eq!(config.ports_remote, DEFAULT_PORTS_REMOTE);
    assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
}
