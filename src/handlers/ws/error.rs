//! WebSocket error types and handling
//!
//! This module defines custom error types for WebSocket operations,
//! providing better error context and type safety.

use thiserror::Error;

/// WebSocket handler error types
#[derive(Debug, Error)]
pub enum WebSocketError {
    /// Text frame that is not a known message
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Predict message carrying neither `landmarks` nor `sequence`
    #[error("No landmarks provided")]
    MissingLandmarks,

    /// Binary frames carry no meaning on this protocol
    #[error("Binary messages are not supported")]
    BinaryUnsupported,

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl WebSocketError {
    /// Convert error to outgoing message format
    pub fn to_message(&self) -> String {
        self.to_string()
    }
}
