// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn cli(dataset: Option<&str>, bind: Option<&str>) -> Cli {
    Cli {
        dataset: dataset.map(str::to_string),
        db_path: None,
        ports_remote: None,
        bind: bind.map(|s| s.parse().expect("valid addr")),
        log_level: None,
    }
}

#[test]
#[serial]
fn cli_flag_takes_precedence_over_env() {
    std::env::set_var("POUDOMATIC_DATASET", "zroot/from-env");
    let config = HttpConfig::from_cli(cli(Some("zroot/from-cli"), None)).expect("loads");
    assert_eq!(config.dataset, "zroot/from-cli");
    std::env::remove_var("POUDOMATIC_DATASET");
}

#[test]
#[serial]
fn errors_when_dataset_unset_everywhere() {
    std::env::remove_var("POUDOMATIC_DATASET");
    let err = HttpConfig::from_cli(cli(None, None)).unwrap_err();
    assert!(matches!(err, HttpError::Config(_)));
}

#[test]
#[serial]
fn defaults_bind_addr_ports_remote_and_log_filter_when_unset() {
    std::env::remove_var("POUDOMATIC_DATASET");
    std::env::remove_var("POUDOMATIC_PORTS_REMOTE");
    std::env::remove_var("POUDOMATIC_HTTP_BIND");
    std::env::remove_var("RUST_LOG");
    let config = HttpConfig::from_cli(cli(Some("zroot/poudomatic"), None)).expect("loads");
    assert_eq!(config.ports_remote, DEFAULT_PORTS_REMOTE);
    assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
}

#[test]
#[serial]
fn cli_bind_flag_overrides_default() {
    std::env::remove_var("POUDOMATIC_HTTP_BIND");
    let config = HttpConfig::from_cli(cli(Some("zroot/poudomatic"), Some("127.0.0.1:9999"))).expect("loads");
    assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9999");
}

#[test]
fn worker_config_carries_dataset_and_drops_post_change_script() {
    let config = HttpConfig {
        dataset: "zroot/poudomatic".to_string(),
        db_path: None,
        ports_remote: DEFAULT_PORTS_REMOTE.to_string(),
        bind_addr: DEFAULT_BIND_ADDR,
        log_filter: DEFAULT_LOG_FILTER.to_string(),
    };
    let worker_config = config.worker_config();
    assert_eq!(worker_config.dataset, "zroot/poudomatic");
    assert!(worker_config.post_change_script.is_none());
}
