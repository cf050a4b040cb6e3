use crate::config::{
    StorageConfig,
    constants::{DEFAULT_APP_TITLE, DEFAULT_ENDPOINT, DEFAULT_LISTEN_ADDR, DEFAULT_MODEL},
};

use super::*;

#[test]
fn test_load_configuration() {
    let config = load_configuration("./testdata/config.toml").expect("failed to load config");

    assert_eq!(config.general.verbose, true);

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("debug"));
    let log_filters = log.filters.as_deref().unwrap_or_default();
    assert_eq!(log_filters.len(), 1);
    assert_eq!(log_filters[0].module.as_deref(), Some("chatport::backend"));
    assert_eq!(log_filters[0].level.as_deref(), Some("trace"));

    let log_file = log.file.as_ref().expect("log file should be set");
    assert_eq!(log_file.path, "/var/log/chatport.log");
    assert_eq!(log_file.append, true);

    let backend = &config.backend;
    assert_eq!(backend.endpoint, "https://openrouter.ai/api");
    assert_eq!(backend.api_key(), Some("sk-or-test".to_string()));
    assert_eq!(backend.model, "openai/gpt-4o-mini");
    assert_eq!(backend.timeout_secs, Some(60));
    assert_eq!(
        backend.timeout(),
        Some(std::time::Duration::from_secs(60))
    );
    assert_eq!(backend.referer.as_deref(), Some("https://example.com"));
    assert_eq!(backend.app_title.as_deref(), Some("Chatport"));

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => {
            assert_eq!(sqlite.path.as_deref(), Some("/var/lib/chatport/chat.db"));
        }
    }

    assert_eq!(config.server.listen, "0.0.0.0:8080");
}

#[test]
fn test_load_configuration_with_some_default_fields() {
    let config =
        load_configuration("./testdata/config_with_default.toml").expect("failed to load config");

    assert_eq!(config.general.verbose, false);

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("info"));
    assert!(log.file.is_none());

    let backend = &config.backend;
    assert_eq!(backend.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(backend.model, DEFAULT_MODEL);
    assert_eq!(backend.timeout_secs, Some(30));
    assert_eq!(backend.app_title.as_deref(), Some(DEFAULT_APP_TITLE));

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => assert!(sqlite.path.is_none()),
    }

    assert_eq!(config.server.listen, DEFAULT_LISTEN_ADDR);
}

#[test]
fn test_load_configuration_missing_file() {
    let err = load_configuration("./testdata/does_not_exist.toml").unwrap_err();
    assert!(err.to_string().contains("reading"));
}

#[test]
fn test_api_key_prefers_configured_value() {
    let backend = crate::config::BackendConfig {
        api_key: Some("configured".to_string()),
        ..Default::default()
    };
    assert_eq!(backend.api_key(), Some("configured".to_string()));
}

#[test]
fn test_resolve_path() {
    let ret = resolve_path("$CHATPORT_TEST_DIR/${CHATPORT_TEST_SUB}/chat.db")
        .expect("failed to resolve path");
    assert_eq!(ret, "//chat.db");

    let dir = "/tmp/chatport";
    let sub = "data";
    unsafe {
        std::env::set_var("CHATPORT_TEST_DIR", dir);
        std::env::set_var("CHATPORT_TEST_SUB", sub);
    }
    let ret = resolve_path("$CHATPORT_TEST_DIR/${CHATPORT_TEST_SUB}/chat.db")
        .expect("failed to resolve path");
    assert_eq!(ret, format!("{dir}/{sub}/chat.db"));
}

#[test]
fn test_basename() {
    assert_eq!(basename("src/backend/openrouter.rs"), "openrouter.rs");
    assert_eq!(basename("main.rs"), "main.rs");
}
