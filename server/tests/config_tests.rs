use server::config::ServerConfig;

#[test]
fn parses_the_full_config_shape() {
    let yaml = r#"
models:
  iqa:
    model_path: models/foot_quality.pt
    labels_path: models/foot_quality_labels.json
    input_size: 224
  condition:
    model_path: models/condition_classifier.pt
    labels_path: models/condition_labels.json
    input_size: 300
persistence:
  enabled: true
  data_root: data/predictions
"#;
    let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.models.iqa.input_size, 224);
    assert_eq!(config.models.condition.input_size, 300);
    assert!(config.persistence.enabled);
    assert_eq!(config.persistence.data_root, "data/predictions");
}

#[test]
fn rejects_a_config_missing_a_model_entry() {
    let yaml = r#"
models:
  iqa:
    model_path: models/foot_quality.pt
    labels_path: models/foot_quality_labels.json
    input_size: 224
persistence:
  enabled: false
  data_root: data
"#;
    assert!(serde_yaml::from_str::<ServerConfig>(yaml).is_err());
}
