use casevac::config::{Config, ConfigError};

#[test]
fn full_scenario_yaml_parses_and_validates() {
    let yaml = r#"
geometry:
  speed_kmh: 200.0
stream:
  count: 50
  horizon_hours: 48.0
  zone_weights: [0.25, 0.25, 0.25, 0.25]
  severity_weights: [0.6, 0.3, 0.1]
reward:
  routine_utility: 0.0
learning:
  gamma: 0.95
  epsilon: 0.2
  epochs: 10
"#;
    let cfg = Config::from_yaml_str(yaml).expect("scenario must parse");
    assert_eq!(cfg.geometry.speed_kmh, 200.0);
    assert_eq!(cfg.stream.count, 50);
    assert_eq!(cfg.reward.routine_utility, 0.0);
    assert_eq!(cfg.learning.gamma, 0.95);
    // Untouched tables come from the built-in defaults.
    assert_eq!(cfg.geometry.zones.len(), 4);
    assert_eq!(cfg.fleet.coverage.len(), 4);
}

#[test]
fn invalid_scenario_fails_validation_not_parsing() {
    let yaml = "learning:\n  gamma: 1.5\n";
    match Config::from_yaml_str(yaml) {
        Err(ConfigError::ValidationError { field, .. }) => {
            assert_eq!(field, "learning.gamma");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let yaml = "stream: [not, a, map]";
    assert!(matches!(
        Config::from_yaml_str(yaml),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn missing_scenario_file_is_an_io_error() {
    assert!(matches!(
        Config::from_yaml_file("/definitely/not/a/real/path.yaml"),
        Err(ConfigError::IoError { .. })
    ));
}
