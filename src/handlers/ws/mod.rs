//! # WebSocket Recognition Handler Module
//!
//! This module provides a WebSocket interface for continuous sign recognition.
//! Each connection serves one category and owns one stabilization session.
//!
//! ## WebSocket API
//!
//! ### Connection Flow
//! 1. Client connects to `/ws/{category}`, optionally with `?session_id=...`
//! 2. Server sends a `connected` message describing the category
//! 3. Client streams `predict` messages, one per captured frame (or window)
//! 4. Server answers every `predict` with exactly one `prediction` event
//! 5. Closing the socket discards the session
//!
//! ### Message Types
//!
//! **Incoming Messages:**
//! - `{"type": "predict", "landmarks": [...], "target": "A"}` - One flat frame of landmark coordinates
//! - `{"type": "predict", "sequence": [[...], ...]}` - A window of frames for sequence categories
//! - `{"type": "reset"}` - Clear history, stability and confirmation progress
//!
//! `null` coordinates are accepted and treated as missing. When both
//! `sequence` and `landmarks` are present, `sequence` wins.
//!
//! **Outgoing Messages:**
//! - `{"type": "connected", "session_id": "...", "category": "letters", "input_width": 126, "sequence_length": null, "labels": [...]}`
//! - `{"type": "prediction", ...}` - See below
//! - `{"type": "reset_response", "success": true}`
//! - `{"type": "error", "message": "..."}` - Frames that are not prediction requests
//!
//! **Prediction Event:**
//! ```json
//! {
//!   "type": "prediction",
//!   "success": true,
//!   "label": "A",
//!   "confidence": 0.93,
//!   "stable": true,
//!   "confirmed": false,
//!   "stableCount": 2,
//!   "all_predictions": {"A": 0.93, "B": 0.04, "C": 0.03},
//!   "status": "ok"
//! }
//! ```
//!
//! `status` is one of `ok`, `no_detection`, `cooldown`, `unstable`,
//! `building_history`, `invalid_input`, `below_threshold` or
//! `classifier_error`. Only `ok` and `no_detection` carry `success: true`.

pub mod error;
pub mod handler;
pub mod messages;
pub mod processor;
pub mod state;


// Re-export commonly used items
pub use handler::ws_recognition_handler;
