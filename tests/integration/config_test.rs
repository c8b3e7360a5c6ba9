//! Configuration loading tests

use price_hub::config::Config;
use price_hub::telemetry::LogFormat;

#[test]
fn test_config_example_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.server.bind.port(), 8080);
    assert_eq!(config.server.outbox_capacity, 64);
    assert_eq!(config.catalog.instruments.len(), 3);
    assert!(!config.catalog.strict);
    assert_eq!(config.source.timeout_secs, 10);
    assert_eq!(config.poller.interval_secs, 10);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert_eq!(config.telemetry.metrics_port, None);
}

#[test]
fn test_config_example_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let loaded = Config::load(path).unwrap();
    let defaults = Config::default();

    assert_eq!(loaded.server.bind, defaults.server.bind);
    assert_eq!(loaded.catalog.instruments, defaults.catalog.instruments);
    assert_eq!(loaded.source.base_url, defaults.source.base_url);
    assert_eq!(
        loaded.poller.max_concurrent_fetches,
        defaults.poller.max_concurrent_fetches
    );
}
