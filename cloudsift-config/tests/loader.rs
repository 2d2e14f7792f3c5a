use std::collections::HashMap;
use std::path::PathBuf;

use cloudsift_config::sources::EnvConfig;
use cloudsift_config::{ConfigLoadError, ConfigLoader, ConfigValidationError, LogFormat};

fn env(vars: &[(&str, &str)]) -> EnvConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvConfig::from_lookup(|name| vars.get(name).cloned())
}

fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("cloudsift.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn file_values_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
        max_workers = 6
        log_format = "json"

        [scan]
        regions = ["us-east-1", "eu-west-1"]
        scanners = ["ebs-volumes"]
        days_unused = 30
        inventory = "fixtures/inventory.json"
        accounts = [
          { id = "111111111111", name = "dev" },
          { id = "222222222222" },
        ]
        ignore_resource_ids = ["vol-keep"]

        [output]
        dir = "reports"

        [pricing]
        endpoint = "https://pricing-gateway.internal"

        [rate_limit]
        requests_per_second = 5.0
        max_retries = 3
        "#,
    );

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_with_env(EnvConfig::default())
        .unwrap();
    let config = load.config;

    assert_eq!(config.max_workers, 6);
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.scan.regions, vec!["us-east-1", "eu-west-1"]);
    assert_eq!(config.scan.days_unused, 30);
    assert_eq!(config.scan.accounts[1].name, "222222222222");
    assert_eq!(config.scan.inventory, PathBuf::from("fixtures/inventory.json"));
    assert_eq!(config.output.dir, PathBuf::from("reports"));
    assert_eq!(
        config.pricing.endpoint.as_deref(),
        Some("https://pricing-gateway.internal")
    );
    assert_eq!(config.rate_limit.requests_per_second, 5.0);
    assert_eq!(config.rate_limit.max_retries, 3);
    assert_eq!(config.rate_limit.base_delay_ms, 100);
    assert_eq!(config.metadata.config_path(), Some(path.as_path()));
    assert!(load.warnings.is_empty());
}

#[test]
fn environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
        max_workers = 6
        [scan]
        regions = ["us-east-1"]
        days_unused = 30
        "#,
    );

    let config = ConfigLoader::new()
        .with_config_path(&path)
        .load_with_env(env(&[
            ("CLOUDSIFT_MAX_WORKERS", "12"),
            ("CLOUDSIFT_SCAN_REGIONS", "ap-south-1,eu-north-1"),
            ("CLOUDSIFT_PRICE_CACHE", "/tmp/prices.json"),
            ("CLOUDSIFT_PRICING_ENDPOINT", "http://localhost:8089"),
        ]))
        .unwrap()
        .config;

    assert_eq!(config.max_workers, 12);
    assert_eq!(config.scan.regions, vec!["ap-south-1", "eu-north-1"]);
    assert_eq!(config.scan.days_unused, 30);
    assert_eq!(config.pricing.cache_file, PathBuf::from("/tmp/prices.json"));
    assert_eq!(
        config.pricing.endpoint.as_deref(),
        Some("http://localhost:8089")
    );
}

#[test]
fn missing_default_config_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let load = ConfigLoader::new()
        .with_search_paths(vec![dir.path().join("cloudsift.toml")])
        .load_with_env(EnvConfig::default())
        .unwrap();

    assert!(load.config.metadata.config_path.is_none());
    assert_eq!(load.warnings.len(), 1);
    assert!(load.warnings.items[0].hint.is_some());
    assert!(load.config.max_workers >= 8);
    assert_eq!(load.config.scan.days_unused, 90);
    assert!(load.config.pricing.endpoint.is_none());
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .load_with_env(EnvConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "max_workers = \"many\"");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_with_env(EnvConfig::default())
        .unwrap_err();
    match err {
        ConfigLoadError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_workers_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "max_workers = 0");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_with_env(EnvConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::Validation(ConfigValidationError::ZeroWorkers)
    ));
}

#[test]
fn unknown_log_format_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::new()
        .with_search_paths(vec![dir.path().join("cloudsift.toml")])
        .load_with_env(env(&[("CLOUDSIFT_LOG_FORMAT", "xml")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::InvalidValue { key: "log_format", .. }
    ));
}

#[test]
fn env_config_path_is_used_when_no_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "log_level = \"debug\"");

    let config = ConfigLoader::new()
        .load_with_env(env(&[("CLOUDSIFT_CONFIG", path.to_str().unwrap())]))
        .unwrap()
        .config;
    assert_eq!(config.log_level, "debug");
}
