use std::sync::Arc;

use anyhow::Result;

use crate::config::ServerConfig;
use crate::core::CoreState;
use crate::core::recognizer::Recognizer;
use crate::core::session_store::SessionStore;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state: loaded categories and live sessions
    pub core_state: Arc<CoreState>,
}

impl AppState {
    /// Load every configured category; fails if any of them cannot be served.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>> {
        let core_state = CoreState::new(&config).await?;
        Ok(Arc::new(Self { config, core_state }))
    }

    /// Application state around categories built elsewhere, such as in tests.
    pub fn with_recognizers(config: ServerConfig, recognizers: Vec<Recognizer>) -> Arc<Self> {
        Arc::new(Self {
            config,
            core_state: CoreState::from_recognizers(recognizers),
        })
    }

    /// Look up a category by name (case-insensitive)
    pub fn recognizer(&self, name: &str) -> Option<Arc<Recognizer>> {
        self.core_state.recognizer(name)
    }

    /// Get a handle to the live session registry
    pub fn sessions(&self) -> Arc<SessionStore> {
        self.core_state.sessions.clone()
    }
}
