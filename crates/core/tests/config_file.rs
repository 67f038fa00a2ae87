use sheetsense_core::{Archetype, ConfigError, DetectorConfig, StructureDetector};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_overrides() {
    let file = write_config(
        ".yaml",
        "titleSparsity: 0.25\nmaxHeaderRows: 4\narchetypeThresholds:\n  pivot: 0.6\nbudgetKeywords:\n  budget: [plan]\n",
    );
    let config = DetectorConfig::from_path(file.path()).unwrap();

    assert_eq!(config.title_sparsity, 0.25);
    assert_eq!(config.max_header_rows, 4);
    assert_eq!(config.threshold(Archetype::Pivot), 0.6);
    assert_eq!(config.threshold(Archetype::Hierarchical), 0.5);
    assert_eq!(config.budget_keywords.budget, vec!["plan".to_string()]);
    assert!(config.budget_keywords.actual.contains(&"actual".to_string()));
    assert_eq!(config.data_density, DetectorConfig::default().data_density);
}

#[test]
fn test_load_json() {
    let file = write_config(
        ".json",
        r#"{"rateKeywords": ["QoQ"], "scoring": {"base": 0.5}}"#,
    );
    let config = DetectorConfig::from_path(file.path()).unwrap();

    assert_eq!(config.rate_keywords, vec!["QoQ".to_string()]);
    assert_eq!(config.scoring.base, 0.5);
    assert_eq!(config.scoring.header_weight, 0.3);
    assert!(StructureDetector::new(config).is_ok());
}

#[test]
fn test_out_of_range_value_rejected() {
    let file = write_config(".yml", "dataDensity: 1.5\n");
    let err = DetectorConfig::from_path(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "dataDensity"));
}

#[test]
fn test_unsupported_extension() {
    let file = write_config(".toml", "titleSparsity = 0.2\n");
    let err = DetectorConfig::from_path(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn test_missing_file() {
    let err = DetectorConfig::from_path("/nonexistent/sheetsense.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_yaml() {
    let file = write_config(".yaml", "titleSparsity: [not, a, number]\n");
    let err = DetectorConfig::from_path(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::Yaml(_)));
}
