//! HTTP and WebSocket request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Liveness, readiness and category listing
//! - `predict` - One-shot REST prediction
//! - `ws` - WebSocket continuous recognition

pub mod api;
pub mod predict;
pub mod ws;

// Re-export commonly used handlers for convenient access
pub use predict::predict_handler;
pub use ws::ws_recognition_handler;
