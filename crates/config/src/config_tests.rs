use crate::{Config, ConfigManager, ConfigOverrides, OutputFormat};
use porygo_core::Error;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_defaults_are_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.concurrency, 5);
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.retry, 3);
    assert_eq!(config.backoff.base_delay, Duration::from_secs(1));
    assert!(config.backoff.jitter);
    assert_eq!(config.database.expiration, Duration::from_secs(86_400));
}

#[test]
fn test_validate_reports_every_violation() {
    let mut config = Config::default();
    config.concurrency = 0;
    config.timeout = Duration::ZERO;
    config.retry = 0;
    config.backoff.base_delay = Duration::ZERO;

    let err = config.validate().unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    let message = err.to_string();
    assert!(message.contains("concurrency must be greater than 0"));
    assert!(message.contains("timeout must be greater than 0"));
    assert!(message.contains("retry must be at least 1"));
    assert!(message.contains("base_delay must be greater than 0"));
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::new(temp_dir.path().join("nested").join("config.toml"));

    let mut config = Config::default();
    config.concurrency = 12;
    config.backoff.base_delay = Duration::from_millis(250);
    config.selectors.select = vec!["a@href".to_string()];
    config.format = OutputFormat::Text;
    manager.save(&config).unwrap();

    let loaded = manager.load().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        "concurrency = 2\n\n[backoff]\nbase_delay = \"500ms\"\n\n[database]\nexpiration = \"2h\"\n",
    )
    .unwrap();

    let config = ConfigManager::new(&path).load_from_file(&path).unwrap();
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.backoff.base_delay, Duration::from_millis(500));
    assert!(config.backoff.jitter);
    assert_eq!(config.database.expiration, Duration::from_secs(7_200));
    assert_eq!(config.timeout, Duration::from_secs(10));
}

#[test]
fn test_malformed_file_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "timeout = \"forever\"\n").unwrap();

    let err = ConfigManager::new(&path).load().unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::new(temp_dir.path().join("absent.toml"));
    assert_eq!(manager.load().unwrap(), Config::default());
}

#[test]
fn test_save_failure_names_the_target() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let manager = ConfigManager::new(blocker.join("config.toml"));

    let err = manager.save(&Config::default()).unwrap_err();
    assert!(err.to_string().starts_with("failed to save"));
    match err {
        Error::Context { source, .. } => assert!(matches!(*source, Error::FileSystem { .. })),
        other => panic!("expected context error, got {other:?}"),
    }
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    let manager = ConfigManager::new(&path);

    manager.init_defaults(false).unwrap();
    fs::write(&path, "concurrency = 9\n").unwrap();

    assert!(manager.init_defaults(false).is_err());
    assert_eq!(manager.load().unwrap().concurrency, 9);

    manager.init_defaults(true).unwrap();
    assert_eq!(manager.load().unwrap(), Config::default());
}

#[test]
fn test_overrides_win_over_file_values() {
    let mut config = Config::default();
    config.selectors.pattern = vec!["\\d+".to_string()];

    config.apply(ConfigOverrides {
        concurrency: Some(1),
        retry: Some(7),
        jitter: Some(false),
        select: vec!["h1".to_string()],
        ..Default::default()
    });

    assert_eq!(config.concurrency, 1);
    assert_eq!(config.retry, 7);
    assert!(!config.backoff.jitter);
    assert_eq!(config.selectors.select, vec!["h1".to_string()]);
    // untouched values survive
    assert_eq!(config.selectors.pattern, vec!["\\d+".to_string()]);
    assert_eq!(config.timeout, Duration::from_secs(10));
}

#[test]
fn test_fetch_settings_projection() {
    let mut config = Config::default();
    config.force = true;
    let settings = config.fetch_settings();

    assert_eq!(settings.concurrency, 5);
    assert_eq!(settings.max_attempts, 3);
    assert_eq!(settings.cache_ttl, Duration::from_secs(86_400));
    assert!(settings.force_refresh);
    assert!(settings.validate().is_ok());

    let policy = settings.retry_policy();
    assert_eq!(policy.max_attempts, 3);
    assert!(policy.jitter);
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    assert!("csv".parse::<OutputFormat>().is_err());
}
