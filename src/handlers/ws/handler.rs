//! Axum WebSocket handler
//!
//! This module contains the WebSocket upgrade handler for a recognition
//! category and the connection loop behind it.

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::recognizer::Recognizer;
use crate::errors::AppError;
use crate::state::AppState;

use super::{
    error::WebSocketError,
    messages::{IncomingMessage, OutgoingMessage, PredictionEvent},
    processor::handle_incoming_message,
    state::ConnectionState,
};

const CHANNEL_BUFFER_SIZE: usize = 64;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Reuse a session id chosen by the client; generated when absent
    pub session_id: Option<String>,
}

/// WebSocket recognition handler
///
/// Unknown categories are rejected with 404 before the upgrade.
pub async fn ws_recognition_handler(
    ws: WebSocketUpgrade,
    Path(category): Path<String>,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(recognizer) = state.recognizer(&category) else {
        return AppError::NotFound(format!("Unknown category '{category}'")).into_response();
    };

    let session_id = params
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(
        "WebSocket upgrade requested for category {} (session {})",
        recognizer.name(),
        session_id
    );
    ws.on_upgrade(move |socket| handle_recognition_socket(socket, state, recognizer, session_id))
}

async fn handle_recognition_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    recognizer: Arc<Recognizer>,
    session_id: String,
) {
    let (mut sender, mut receiver) = socket.split();

    let mut state = ConnectionState::open(session_id, recognizer, app_state.sessions());
    let (message_tx, mut message_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_BUFFER_SIZE);

    let sender_task = tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            let json_str = match serde_json::to_string(&message) {
                Ok(json_str) => json_str,
                Err(e) => {
                    error!("Failed to serialize outgoing message: {}", e);
                    continue;
                }
            };

            if let Err(e) = sender.send(Message::Text(json_str.into())).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let recognizer = &state.recognizer;
    let connected = OutgoingMessage::Connected {
        session_id: state.session_id.clone(),
        category: recognizer.name().to_string(),
        input_width: recognizer.config().frame_width,
        sequence_length: recognizer.sequence_length(),
        labels: recognizer.labels().to_vec(),
    };
    info!(
        "WebSocket session {} established for category {}",
        state.session_id,
        recognizer.name()
    );

    if message_tx.send(connected).await.is_ok() {
        while let Some(msg_result) = receiver.next().await {
            match msg_result {
                Ok(msg) => {
                    if !process_message(msg, &mut state, &message_tx).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{}", WebSocketError::WebSocket(e.to_string()));
                    break;
                }
            }
        }
    }

    // Let replies already queued reach the client before the socket drops.
    drop(message_tx);
    if let Err(e) = sender_task.await {
        warn!("WebSocket sender task failed: {}", e);
    }
    if state.close() {
        debug!("Session {} removed", state.session_id);
    }
    info!("WebSocket session {} terminated", state.session_id);
}

/// Process one WebSocket frame; returns false to end the connection.
async fn process_message(
    msg: Message,
    state: &mut ConnectionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());

            match serde_json::from_str::<IncomingMessage>(&text) {
                Ok(incoming) => handle_incoming_message(incoming, state, message_tx).await,
                Err(e) => {
                    warn!("Failed to parse incoming message: {}", e);
                    let reply = malformed_reply(&text, &e);
                    message_tx.send(reply).await.is_ok()
                }
            }
        }
        Message::Binary(data) => {
            debug!("Received binary message: {} bytes", data.len());
            message_tx
                .send(OutgoingMessage::Error {
                    message: WebSocketError::BinaryUnsupported.to_message(),
                })
                .await
                .is_ok()
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!("WebSocket connection closed by client");
            false
        }
    }
}

/// Reply to a text frame that did not parse.
///
/// Anything that might have been a prediction request gets a failed
/// `prediction` event; frames of another known type get an `error`.
fn malformed_reply(text: &str, err: &serde_json::Error) -> OutgoingMessage {
    let message = WebSocketError::InvalidMessage(err.to_string()).to_message();
    let kind = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| value.get("type")?.as_str().map(str::to_string));

    match kind.as_deref() {
        Some(kind) if kind != "predict" => OutgoingMessage::Error { message },
        _ => OutgoingMessage::Prediction(PredictionEvent::invalid(message)),
    }
}
