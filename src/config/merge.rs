use std::env;
use std::path::PathBuf;

use super::ServerConfig;
use super::category::{CategoryConfig, CategoryMode};
use super::utils::parse_list;
use super::yaml::{CategoryYaml, YamlConfig};
use crate::core::preprocess::Normalization;
use crate::core::stabilizer::{LabelCase, StabilityConfig};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// Categories come from the YAML `categories` list when it is non-empty,
/// otherwise from the `CATEGORIES` preset list.
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
///
/// # Returns
/// * `Result<ServerConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for parsed values: YAML > ENV (parsed) > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $ty:ty, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => match env::var($env_var) {
                    Ok(raw) => raw
                        .trim()
                        .parse::<$ty>()
                        .map_err(|e| format!("Invalid {} environment variable: {e}", $env_var))?,
                    Err(_) => $default,
                },
            }
        };
    }

    // Server configuration
    let host = get_value!(
        "HOST",
        yaml.server.as_ref().and_then(|s| s.host.clone()),
        "0.0.0.0"
    );
    let port = get_parsed!(
        "PORT",
        yaml.server.as_ref().and_then(|s| s.port),
        u16,
        super::DEFAULT_PORT
    );

    // Model loading
    let models_dir = PathBuf::from(get_value!(
        "MODELS_DIR",
        yaml.models.as_ref().and_then(|m| m.dir.clone()),
        super::DEFAULT_MODELS_DIR
    ));
    let onnx_num_threads = match yaml.models.as_ref().and_then(|m| m.onnx_num_threads) {
        Some(threads) => Some(threads),
        None => env::var("ONNX_NUM_THREADS")
            .ok()
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|e| format!("Invalid ONNX_NUM_THREADS environment variable: {e}"))
            })
            .transpose()?,
    };

    // Session lifecycle
    let session_idle_timeout_seconds = get_parsed!(
        "SESSION_IDLE_TIMEOUT_SECONDS",
        yaml.sessions.as_ref().and_then(|s| s.idle_timeout_seconds),
        u64,
        super::DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS
    );
    let session_reap_interval_seconds = get_parsed!(
        "SESSION_REAP_INTERVAL_SECONDS",
        yaml.sessions.as_ref().and_then(|s| s.reap_interval_seconds),
        u64,
        super::DEFAULT_SESSION_REAP_INTERVAL_SECONDS
    );

    // CORS
    let cors_allowed_origins = yaml
        .cors
        .as_ref()
        .and_then(|c| c.allowed_origins.clone())
        .or_else(|| env::var("CORS_ALLOWED_ORIGINS").ok().map(|v| parse_list(&v)))
        .unwrap_or_else(|| vec!["*".to_string()]);

    // Categories
    let categories = if yaml.categories.is_empty() {
        let names =
            env::var("CATEGORIES").unwrap_or_else(|_| super::DEFAULT_CATEGORIES.to_string());
        presets_from_list(&names)?
    } else {
        yaml.categories
            .into_iter()
            .map(resolve_category)
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(ServerConfig {
        host,
        port,
        models_dir,
        categories,
        session_idle_timeout_seconds,
        session_reap_interval_seconds,
        onnx_num_threads,
        cors_allowed_origins,
    })
}

/// Resolve a comma-separated list of preset names
pub fn presets_from_list(list: &str) -> Result<Vec<CategoryConfig>, Box<dyn std::error::Error>> {
    let mut categories = Vec::new();
    for name in parse_list(list) {
        let Some(preset) = CategoryConfig::preset(&name) else {
            return Err(format!(
                "Unknown category preset '{name}' (available: {})",
                super::category::PRESET_NAMES.join(", ")
            )
            .into());
        };
        categories.push(preset);
    }
    Ok(categories)
}

/// Build a full category from a YAML definition
///
/// The base is the named `preset`, else the preset matching `name`, else a
/// from-scratch definition that must name its mode, model, labels and width.
pub fn resolve_category(yaml: CategoryYaml) -> Result<CategoryConfig, Box<dyn std::error::Error>> {
    let name = yaml.name.trim().to_string();
    if name.is_empty() {
        return Err("Category entries require a name".into());
    }

    let base = match yaml.preset.as_deref() {
        Some(preset) => Some(
            CategoryConfig::preset(preset)
                .ok_or_else(|| format!("{name}: unknown preset '{preset}'"))?,
        ),
        None => CategoryConfig::preset(&name),
    };

    let mut config = match base {
        Some(base) => base,
        None => {
            let missing = |field: &str| format!("{name}: '{field}' is required without a preset");
            let mode = yaml.mode.ok_or_else(|| missing("mode"))?;
            let model_path = yaml.model_path.clone().ok_or_else(|| missing("model_path"))?;
            let labels_path = yaml
                .labels_path
                .clone()
                .ok_or_else(|| missing("labels_path"))?;
            let frame_width = yaml.frame_width.ok_or_else(|| missing("frame_width"))?;
            CategoryConfig {
                name: name.clone(),
                model_path: PathBuf::from(model_path),
                labels_path: PathBuf::from(labels_path),
                stats_path: None,
                mode,
                frame_width,
                model_input_width: None,
                sequence_length: None,
                normalization: match mode {
                    CategoryMode::Static => Normalization::None,
                    CategoryMode::Sequence => Normalization::Robust,
                },
                label_case: LabelCase::AsIs,
                confidence_threshold: 0.7,
                history_size: 10,
                min_consistent: 2,
                stability: StabilityConfig {
                    enabled: mode == CategoryMode::Static,
                    ..StabilityConfig::default()
                },
                cooldown_frames: 3,
                stable_window: 3,
                min_stable_count: 2,
                min_nonzero_ratio: match mode {
                    CategoryMode::Static => 0.3,
                    CategoryMode::Sequence => 0.0,
                },
                pad_or_truncate_width: false,
            }
        }
    };

    config.name = name;
    if let Some(path) = yaml.model_path {
        config.model_path = PathBuf::from(path);
    }
    if let Some(path) = yaml.labels_path {
        config.labels_path = PathBuf::from(path);
    }
    if let Some(path) = yaml.stats_path {
        config.stats_path = Some(PathBuf::from(path));
    }
    if let Some(mode) = yaml.mode {
        config.mode = mode;
    }
    if let Some(width) = yaml.frame_width {
        config.frame_width = width;
    }
    if let Some(width) = yaml.model_input_width {
        config.model_input_width = Some(width);
    }
    if let Some(length) = yaml.sequence_length {
        config.sequence_length = Some(length);
    }
    if let Some(normalization) = yaml.normalization {
        config.normalization = normalization;
    }
    if let Some(label_case) = yaml.label_case {
        config.label_case = label_case;
    }
    if let Some(threshold) = yaml.confidence_threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(size) = yaml.history_size {
        config.history_size = size;
    }
    if let Some(min) = yaml.min_consistent {
        config.min_consistent = min;
    }
    if let Some(stability) = yaml.stability {
        if let Some(enabled) = stability.enabled {
            config.stability.enabled = enabled;
        }
        if let Some(window_size) = stability.window_size {
            config.stability.window_size = window_size;
        }
        if let Some(threshold) = stability.variance_threshold {
            config.stability.variance_threshold = threshold;
        }
    }
    if let Some(frames) = yaml.cooldown_frames {
        config.cooldown_frames = frames;
    }
    if let Some(window) = yaml.stable_window {
        config.stable_window = window;
    }
    if let Some(count) = yaml.min_stable_count {
        config.min_stable_count = count;
    }
    if let Some(ratio) = yaml.min_nonzero_ratio {
        config.min_nonzero_ratio = ratio;
    }
    if let Some(allow) = yaml.pad_or_truncate_width {
        config.pad_or_truncate_width = allow;
    }

    Ok(config)
}
