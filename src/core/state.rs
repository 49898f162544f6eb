use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::recognizer::Recognizer;
use crate::core::session_store::SessionStore;

/// Core-specific shared state for the application.
///
/// Holds the loaded recognition categories and the registry of live sessions.
pub struct CoreState {
    /// Loaded categories, in configuration order
    recognizers: Vec<Arc<Recognizer>>,
    /// Live sessions across all categories
    pub sessions: Arc<SessionStore>,
}

impl CoreState {
    /// Load every configured category.
    ///
    /// Any category that fails to load aborts startup.
    pub async fn new(config: &ServerConfig) -> Result<Arc<Self>> {
        let onnx_config = config.onnx_config();
        let mut recognizers = Vec::with_capacity(config.categories.len());

        for category in &config.categories {
            let recognizer =
                Recognizer::load(category.clone(), &config.models_dir, &onnx_config).await?;
            recognizers.push(recognizer);
        }

        info!("Loaded {} recognition categories", recognizers.len());
        Ok(Self::from_recognizers(recognizers))
    }

    /// Core state around categories built elsewhere, such as in tests.
    pub fn from_recognizers(recognizers: Vec<Recognizer>) -> Arc<Self> {
        Arc::new(Self {
            recognizers: recognizers.into_iter().map(Arc::new).collect(),
            sessions: Arc::new(SessionStore::new()),
        })
    }

    /// Look up a category by name (case-insensitive).
    pub fn recognizer(&self, name: &str) -> Option<Arc<Recognizer>> {
        let name = name.trim();
        self.recognizers
            .iter()
            .find(|recognizer| recognizer.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn recognizers(&self) -> &[Arc<Recognizer>] {
        &self.recognizers
    }
}
