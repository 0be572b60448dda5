//! Config loading tests
//!
//! Env-var tests share process state, so they run under one lock.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use portal_access::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "PORTAL_ACCESS_ADMIN_ROLES",
    "PORTAL_ACCESS_DEBOUNCE_MS",
    "PORTAL_ACCESS_BIND",
    "PORTAL_ACCESS_LOG",
];

fn clear_env() {
    for v in VARS {
        std::env::remove_var(v);
    }
}

#[test]
fn defaults() {
    let c = AccessConfig::default();
    assert_eq!(c.admin_roles, vec!["admin".to_string()]);
    assert_eq!(c.debounce(), Duration::from_millis(300));
    assert_eq!(c.server.bind, DEFAULT_BIND);
    assert!(c.validate().is_ok());
}

#[test]
fn partial_toml_keeps_defaults() {
    let c = AccessConfig::from_toml(
        r#"
        admin_roles = ["admin", "hr_manager"]

        [server]
        bind = "0.0.0.0:8080"
        "#,
    )
    .unwrap();
    assert_eq!(c.admin_roles, vec!["admin".to_string(), "hr_manager".to_string()]);
    assert_eq!(c.server.bind, "0.0.0.0:8080");
    assert_eq!(c.search_debounce_ms, DEFAULT_DEBOUNCE_MS);
}

#[test]
fn bad_toml_is_an_error() {
    let err = AccessConfig::from_toml("search_debounce_ms = \"soon\"").unwrap_err();
    assert!(matches!(err, AccessError::Toml(_)));
}

#[test]
fn empty_admin_roles_fail_validation() {
    let c = AccessConfig { admin_roles: Vec::new(), ..Default::default() };
    assert!(matches!(c.validate(), Err(AccessError::Config(_))));
}

#[test]
fn load_from_missing_file_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let c = AccessConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(c, AccessConfig::default());
}

#[test]
fn env_overrides_file() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "search_debounce_ms = 150\nlog_filter = \"debug\"").unwrap();

    std::env::set_var("PORTAL_ACCESS_ADMIN_ROLES", "owner, admin ,");
    std::env::set_var("PORTAL_ACCESS_BIND", "127.0.0.1:9999");
    let c = AccessConfig::load_from(file.path());
    clear_env();

    let c = c.unwrap();
    assert_eq!(c.admin_roles, vec!["owner".to_string(), "admin".to_string()]);
    assert_eq!(c.server.bind, "127.0.0.1:9999");
    assert_eq!(c.search_debounce_ms, 150);
    assert_eq!(c.log_filter, "debug");
}

#[test]
fn non_numeric_debounce_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    clear_env();
    std::env::set_var("PORTAL_ACCESS_DEBOUNCE_MS", "fast");
    let mut c = AccessConfig::default();
    let r = c.apply_env_vars();
    clear_env();
    assert!(matches!(r, Err(AccessError::Config(_))));
}

#[test]
fn empty_role_list_from_env_fails_load() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    clear_env();
    std::env::set_var("PORTAL_ACCESS_ADMIN_ROLES", " , ");
    let dir = tempfile::tempdir().unwrap();
    let r = AccessConfig::load_from(dir.path().join("none.toml"));
    clear_env();
    assert!(r.is_err());
}
