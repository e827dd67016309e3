use pretty_assertions::assert_eq;
use vayal_editor_bridge::{BridgeConfig, ConfigError};

#[test]
fn empty_object_is_the_default_config() {
    let config = BridgeConfig::from_json_str("{}").unwrap();

    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.upload_folder, "vayal");
    assert!(config.queue_until_ready);
    assert_eq!(config.queue_capacity, 16);
    assert!(config.page.show_toolbar);
}

#[test]
fn notices_can_be_overridden_one_at_a_time() {
    let config = BridgeConfig::from_json_str(
        r#"{"notices":{"upload_failed":"படத்தை பதிவேற்ற முடியவில்லை"}}"#,
    )
    .unwrap();

    assert_eq!(config.notices.upload_failed, "படத்தை பதிவேற்ற முடியவில்லை");
    assert_eq!(
        config.notices.permission_denied,
        BridgeConfig::default().notices.permission_denied
    );
}

#[test]
fn page_options_are_read() {
    let config = BridgeConfig::from_json_str(
        r#"{"page":{"title":"Field notes","lang":"ta","show_toolbar":false}}"#,
    )
    .unwrap();

    assert_eq!(config.page.title, "Field notes");
    assert_eq!(config.page.lang, "ta");
    assert!(!config.page.show_toolbar);
    assert_eq!(config.page.placeholder, "");
}

#[test]
fn invalid_values_are_rejected() {
    for raw in [r#"{"queue_capacity":0}"#, r#"{"upload_folder":" "}"#] {
        assert!(matches!(
            BridgeConfig::from_json_str(raw),
            Err(ConfigError::Invalid(_))
        ));
    }
    assert!(matches!(
        BridgeConfig::from_json_str(r#"{"queue_capacity":"many"}"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn config_round_trips_through_json() {
    let config = BridgeConfig {
        upload_folder: "crop-notes".to_string(),
        queue_capacity: 4,
        ..BridgeConfig::default()
    };
    let raw = serde_json::to_string(&config).unwrap();
    assert_eq!(BridgeConfig::from_json_str(&raw).unwrap(), config);
}
