// Configuration tests - defaults, file creation and validation

use spacetraders_ship::config::{Backend, FlightFailurePolicy, ReliefAccounting, TraderConfig};
use spacetraders_ship::TraderError;

fn valid() -> TraderConfig {
    let mut config = TraderConfig::default();
    config.ship.id = "ship-1".to_string();
    config
}

#[test]
fn test_defaults() {
    let config = TraderConfig::default();

    assert_eq!(config.transport.backend, Backend::Http);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.rate_limit_grace_seconds, 3);
    assert_eq!(config.flight.arrival_grace_seconds, 5);
    assert_eq!(config.flight.max_plan_attempts, 3);
    assert_eq!(config.flight.failure_policy, FlightFailurePolicy::SkipStop);
    assert_eq!(config.flight.failed_cycle_backoff_seconds, 30);
    assert_eq!(config.fuel.fuel_good, "FUEL");
    assert_eq!(config.fuel.relief_accounting, ReliefAccounting::Volume);
    assert_eq!(config.logging.format, "pretty");
}

#[test]
fn test_load_or_create_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("trader.toml");
    let path = path.to_str().unwrap();

    let created = TraderConfig::load_or_create(path).unwrap();
    assert!(std::path::Path::new(path).exists());

    let loaded = TraderConfig::load_or_create(path).unwrap();
    assert_eq!(created, loaded);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trader.toml");
    std::fs::write(
        &path,
        r#"
[ship]
id = "ship-7"

[transport]
backend = "queue"

[flight]
failure_policy = "escalate"

[fuel]
relief_accounting = "quantity"
"#,
    )
    .unwrap();

    let config = TraderConfig::load_or_create(path.to_str().unwrap()).unwrap();
    assert_eq!(config.ship.id, "ship-7");
    assert_eq!(config.transport.backend, Backend::Queue);
    assert_eq!(config.transport.poll_interval_ms, 500);
    assert_eq!(config.flight.failure_policy, FlightFailurePolicy::Escalate);
    assert_eq!(config.flight.max_plan_attempts, 3);
    assert_eq!(config.fuel.relief_accounting, ReliefAccounting::Quantity);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trader.toml");
    std::fs::write(&path, "[flight]\nmax_plan_attempts = \"many\"\n").unwrap();

    assert!(matches!(
        TraderConfig::load_or_create(path.to_str().unwrap()),
        Err(TraderError::Config(_))
    ));
}

#[test]
fn test_validation_rejects_nonsense() {
    assert!(valid().validate().is_ok());
    assert!(TraderConfig::default().validate().is_err(), "ship id is required");

    let mut config = valid();
    config.retry.max_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = valid();
    config.retry.backoff_factor = 0.5;
    assert!(config.validate().is_err());

    let mut config = valid();
    config.flight.max_plan_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = valid();
    config.transport.backend = Backend::Queue;
    config.transport.queue_addr.clear();
    assert!(config.validate().is_err());

    let mut config = valid();
    config.fuel.fuel_good = " ".to_string();
    assert!(config.validate().is_err());
}
