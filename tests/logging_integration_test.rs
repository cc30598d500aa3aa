//! Integration tests for logging functionality

use permit_export::config::LoggingConfig;
use permit_export::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "/var/log/permit-export");
}

#[test]
fn test_unknown_level_is_rejected() {
    let config = LoggingConfig {
        local_enabled: false,
        local_path: String::new(),
        local_rotation: "daily".to_string(),
    };
    assert!(init_logging("verbose", &config).is_err());
}

// A process holds one global subscriber, so initialization is exercised in a
// single test.
#[test]
fn test_file_logging_creates_directory_and_initializes_once() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("debug", &config).expect("first initialization succeeds");
    assert!(log_path.is_dir());

    tracing::info!(submission_id = 1, "Logging from integration test");

    assert!(init_logging("info", &config).is_err());
    drop(guard);
}
