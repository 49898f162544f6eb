use serde::Deserialize;
use std::path::PathBuf;

use crate::core::preprocess::Normalization;
use crate::core::stabilizer::LabelCase;

use super::category::CategoryMode;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5001
///
/// models:
///   dir: "./models"
///   onnx_num_threads: 2
///
/// sessions:
///   idle_timeout_seconds: 300
///   reap_interval_seconds: 60
///
/// cors:
///   allowed_origins:
///     - "http://localhost:3000"
///
/// categories:
///   # A preset, used as-is
///   - name: letters
///   # A preset with overrides
///   - name: days
///     confidence_threshold: 0.65
///     model_input_width: 126
///   # A new category based on a preset
///   - name: greetings
///     preset: static_words
///     model_path: greetings/model.onnx
///     labels_path: greetings/labels.txt
///   # A category defined from scratch
///   - name: phrases
///     mode: sequence
///     model_path: phrases/model.onnx
///     labels_path: phrases/labels.json
///     frame_width: 1629
///     sequence_length: 45
///     normalization: robust
///     label_case: title
///     stability:
///       enabled: false
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub models: Option<ModelsYaml>,
    pub sessions: Option<SessionsYaml>,
    pub cors: Option<CorsYaml>,
    pub categories: Vec<CategoryYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Model loading configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ModelsYaml {
    pub dir: Option<String>,
    pub onnx_num_threads: Option<usize>,
}

/// Session lifecycle configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionsYaml {
    pub idle_timeout_seconds: Option<u64>,
    pub reap_interval_seconds: Option<u64>,
}

/// CORS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CorsYaml {
    pub allowed_origins: Option<Vec<String>>,
}

/// Stability gating overrides from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StabilityYaml {
    pub enabled: Option<bool>,
    pub window_size: Option<usize>,
    pub variance_threshold: Option<f32>,
}

/// One recognition category from YAML
///
/// When `name` matches a preset (or `preset` is given) unspecified fields come
/// from that preset; otherwise `mode`, `model_path`, `labels_path` and
/// `frame_width` are required.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryYaml {
    pub name: String,
    pub preset: Option<String>,
    pub model_path: Option<String>,
    pub labels_path: Option<String>,
    pub stats_path: Option<String>,
    pub mode: Option<CategoryMode>,
    pub frame_width: Option<usize>,
    pub model_input_width: Option<usize>,
    pub sequence_length: Option<usize>,
    pub normalization: Option<Normalization>,
    pub label_case: Option<LabelCase>,
    pub confidence_threshold: Option<f32>,
    pub history_size: Option<usize>,
    pub min_consistent: Option<usize>,
    pub stability: Option<StabilityYaml>,
    pub cooldown_frames: Option<u32>,
    pub stable_window: Option<u32>,
    pub min_stable_count: Option<u32>,
    pub min_nonzero_ratio: Option<f32>,
    pub pad_or_truncate_width: Option<bool>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080

models:
  dir: "/srv/models"
  onnx_num_threads: 2

sessions:
  idle_timeout_seconds: 120
  reap_interval_seconds: 10

cors:
  allowed_origins:
    - "http://localhost:3000"

categories:
  - name: letters
  - name: phrases
    mode: sequence
    model_path: phrases/model.onnx
    labels_path: phrases/labels.json
    frame_width: 1629
    sequence_length: 45
    normalization: robust
    label_case: title
    stability:
      enabled: false
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            config.server.as_ref().unwrap().host,
            Some("127.0.0.1".to_string())
        );
        assert_eq!(config.server.as_ref().unwrap().port, Some(8080));
        assert_eq!(
            config.models.as_ref().unwrap().dir,
            Some("/srv/models".to_string())
        );
        assert_eq!(config.models.as_ref().unwrap().onnx_num_threads, Some(2));
        assert_eq!(
            config.sessions.as_ref().unwrap().idle_timeout_seconds,
            Some(120)
        );
        assert_eq!(
            config.cors.as_ref().unwrap().allowed_origins,
            Some(vec!["http://localhost:3000".to_string()])
        );
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].name, "letters");

        let phrases = &config.categories[1];
        assert_eq!(phrases.mode, Some(CategoryMode::Sequence));
        assert_eq!(phrases.sequence_length, Some(45));
        assert_eq!(phrases.normalization, Some(Normalization::Robust));
        assert_eq!(phrases.label_case, Some(LabelCase::Title));
        assert_eq!(phrases.stability.as_ref().unwrap().enabled, Some(false));
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
server:
  port: 9000
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.as_ref().unwrap().port, Some(9000));
        assert!(config.server.as_ref().unwrap().host.is_none());
        assert!(config.models.is_none());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("").unwrap_or_default();
        assert!(config.server.is_none());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn test_example_config_parses() {
        let example = include_str!("../../config.example.yaml");
        let config: YamlConfig = serde_yaml::from_str(example).unwrap();
        assert_eq!(config.categories.len(), 7);

        // The commented word categories are valid once uncommented.
        let block = &example[example.find("# Word models").unwrap()..];
        let uncommented: String = block
            .lines()
            .filter_map(|line| line.strip_prefix("  # "))
            .filter(|line| line.starts_with("- ") || line.starts_with("  "))
            .map(|line| format!("  {line}\n"))
            .collect();
        let words: YamlConfig =
            serde_yaml::from_str(&format!("categories:\n{uncommented}")).unwrap();
        let names: Vec<_> = words.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a_z_words", "motion_words", "greetings"]);
        assert_eq!(words.categories[1].model_input_width, Some(1629));
        assert_eq!(words.categories[1].pad_or_truncate_width, Some(true));
        assert_eq!(words.categories[0].sequence_length, Some(30));
    }

    #[test]
    fn test_yaml_unknown_category_field_rejected() {
        let yaml = r#"
categories:
  - name: letters
    confidense_threshold: 0.5
"#;
        assert!(serde_yaml::from_str::<YamlConfig>(yaml).is_err());
    }

    #[test]
    fn test_yaml_invalid_enum_rejected() {
        let yaml = r#"
categories:
  - name: letters
    normalization: fancy
"#;
        assert!(serde_yaml::from_str::<YamlConfig>(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "server:\n  port: 7000\n").unwrap();

        let config = YamlConfig::from_file(&path).unwrap();
        assert_eq!(config.server.unwrap().port, Some(7000));
    }

    #[test]
    fn test_from_file_missing() {
        let result = YamlConfig::from_file(&PathBuf::from("/nonexistent/config.yaml"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
