use gridpilot::config::Config;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.tibber.access_token = "secret-token".to_string();
    cfg.home_assistant.pv_sensor = "sensor.roof_pv_power".to_string();
    cfg.charging.charge_hours = 5;

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.tibber.access_token, "secret-token");
    assert_eq!(loaded.home_assistant.pv_sensor, "sensor.roof_pv_power");
    assert_eq!(loaded.charging.charge_hours, 5);
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "tibber:\n  access_token: abc\ncharging:\n  charge_hours: 2\n",
    )
    .unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(cfg.tibber.access_token, "abc");
    assert_eq!(cfg.charging.charge_hours, 2);
    // Untouched sections keep their defaults
    assert_eq!(cfg.charging.pv_threshold_watts, 50);
    assert_eq!(cfg.cycle_interval_secs, 60);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    cfg.tibber.access_token = "token".to_string();
    assert!(cfg.validate().is_ok());

    // Missing access token
    cfg.tibber.access_token.clear();
    assert!(cfg.validate().is_err());

    // Empty entity id
    cfg = Config::default();
    cfg.tibber.access_token = "token".to_string();
    cfg.home_assistant.export_limit_switch.clear();
    assert!(cfg.validate().is_err());

    // Zero charge hours
    cfg = Config::default();
    cfg.tibber.access_token = "token".to_string();
    cfg.charging.charge_hours = 0;
    assert!(cfg.validate().is_err());

    // Zero cycle interval
    cfg = Config::default();
    cfg.tibber.access_token = "token".to_string();
    cfg.cycle_interval_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn invalid_yaml_is_an_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");
    std::fs::write(&path, "charging: [not, a, map]").unwrap();
    assert!(Config::from_file(&path).is_err());
}
