use super::ServerConfig;
use super::merge::merge_config;
use super::validation::{validate_categories, validate_sessions};

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// Recognized variables: `HOST`, `PORT`, `MODELS_DIR`, `CATEGORIES`
    /// (comma-separated preset names), `ONNX_NUM_THREADS`,
    /// `SESSION_IDLE_TIMEOUT_SECONDS`, `SESSION_REAP_INTERVAL_SECONDS` and
    /// `CORS_ALLOWED_ORIGINS`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A numeric variable is malformed
    /// - `CATEGORIES` names an unknown preset
    /// - Configuration validation fails
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;

        validate_categories(&config.categories)?;
        validate_sessions(
            config.session_idle_timeout_seconds,
            config.session_reap_interval_seconds,
        )?;

        Ok(config)
    }
}
