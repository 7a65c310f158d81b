use chrono::{NaiveDate, Weekday};
use comic_workflow::config::{ENV_DATABASE, ENV_HTTP_ADDR, ENV_LOG_FILTER};
use comic_workflow::{AppConfig, ConfigError, MemoryStore, RetentionPolicy, WorkflowService};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_are_valid() {
    let config = AppConfig::default();
    config.validate().unwrap();
    assert_eq!(config.socket_addr().unwrap().port(), 3000);
    assert_eq!(config.log_filter, "info");
    assert_eq!(config.retention, RetentionPolicy::KeepStepState);
    assert!(config.database_path.is_none());
}

#[test]
fn file_values_fill_missing_fields_with_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "http_addr": "127.0.0.1:8088",
            "progress_tolerance": 0.25,
            "retention": "replace",
            "calendar": {{ "working_days": ["Mon", "Tue", "Wed", "Thu", "Fri"], "holidays": ["2025-12-25"] }}
        }}"#
    )
    .unwrap();

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.http_addr, "127.0.0.1:8088");
    assert_eq!(config.progress_tolerance, 0.25);
    assert_eq!(config.retention, RetentionPolicy::Replace);
    assert_eq!(config.log_filter, "info");

    let calendar = config.work_calendar().unwrap();
    assert!(!calendar.is_available(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()));
    assert!(!calendar.is_available(NaiveDate::from_ymd_opt(2025, 12, 27).unwrap()));
    assert_eq!(config.calendar.working_days().len(), 5);
    assert_eq!(config.calendar.working_days()[0], Weekday::Mon);
}

#[test]
fn environment_overrides_file_values() {
    let mut config = AppConfig::default();
    config.apply_overrides(lookup_from(&[
        (ENV_HTTP_ADDR, "127.0.0.1:9000"),
        (ENV_DATABASE, "/var/lib/comics/workflow.db"),
        (ENV_LOG_FILTER, "comic_workflow=debug"),
        ("RUST_LOG", "warn"),
    ]));
    assert_eq!(config.http_addr, "127.0.0.1:9000");
    assert_eq!(
        config.database_path,
        Some(PathBuf::from("/var/lib/comics/workflow.db"))
    );
    assert_eq!(config.log_filter, "comic_workflow=debug");
}

#[test]
fn rust_log_is_the_fallback_filter() {
    let mut config = AppConfig::default();
    config.apply_overrides(lookup_from(&[("RUST_LOG", "warn")]));
    assert_eq!(config.log_filter, "warn");
}

#[test]
fn invalid_values_are_reported() {
    let config = AppConfig {
        http_addr: "not an address".to_string(),
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidAddress(addr)) if addr == "not an address"
    ));

    let config = AppConfig {
        progress_tolerance: 1.5,
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTolerance(_))
    ));
}

#[test]
fn unreadable_and_malformed_files_fail() {
    assert!(matches!(
        AppConfig::from_file("/definitely/not/here.json"),
        Err(ConfigError::Read { .. })
    ));

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(
        AppConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn service_picks_up_calendar_from_config() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "calendar": {{ "working_days": [] }} }}"#).unwrap();
    let config = AppConfig::from_file(file.path()).unwrap();
    let result = WorkflowService::from_config(Arc::new(MemoryStore::new()), &config);
    assert!(matches!(result, Err(ConfigError::NoWorkingDays)));

    let config = AppConfig::default();
    let service = WorkflowService::from_config(Arc::new(MemoryStore::new()), &config).unwrap();
    assert!(
        service
            .calendar()
            .is_available(NaiveDate::from_ymd_opt(2025, 1, 4).unwrap())
    );
}
