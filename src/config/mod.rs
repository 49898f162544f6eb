//! Configuration module for the EduSign recognition server
//!
//! This module handles server configuration from various sources: YAML files and
//! environment variables. YAML values take priority over environment variables,
//! which take priority over defaults.
//!
//! # Modules
//! - `category`: Recognition category definitions and built-in presets
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use edusign::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallbacks
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod category;
mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use category::{CategoryConfig, CategoryMode, PRESET_NAMES};

use crate::core::classifier::OnnxConfig;

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_MODELS_DIR: &str = "./models";
const DEFAULT_CATEGORIES: &str = "letters";
const DEFAULT_SESSION_IDLE_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_SESSION_REAP_INTERVAL_SECONDS: u64 = 60;

/// Server configuration
///
/// Contains all configuration needed to run the recognition server:
/// - Server settings (host, port)
/// - Model directory and ONNX Runtime threading
/// - The enabled recognition categories
/// - Session lifecycle (idle timeout, reaper interval)
/// - CORS origins
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Models
    pub models_dir: PathBuf,
    pub categories: Vec<CategoryConfig>,
    pub onnx_num_threads: Option<usize>,

    // Sessions
    pub session_idle_timeout_seconds: u64,
    pub session_reap_interval_seconds: u64,

    // CORS; "*" allows any origin
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable fallbacks
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - A category references an unknown preset or misses required fields
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // The YAML file is the source of truth; .env is not loaded here.
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;

        validation::validate_categories(&config.categories)?;
        validation::validate_sessions(
            config.session_idle_timeout_seconds,
            config.session_reap_interval_seconds,
        )?;

        Ok(config)
    }

    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// ONNX Runtime options shared by every category
    pub fn onnx_config(&self) -> OnnxConfig {
        OnnxConfig {
            num_threads: self.onnx_num_threads,
            ..OnnxConfig::default()
        }
    }

    /// Look up a configured category by name (case-insensitive)
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories
            .iter()
            .find(|category| category.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Whether any CORS origin is allowed
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|origin| origin == "*")
    }
}
