//! WebSocket message processing
//!
//! Routes parsed messages to the recognizer and answers each one on the
//! outgoing channel.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    error::WebSocketError,
    messages::{IncomingMessage, OutgoingMessage, PredictionEvent, landmark_input},
    state::ConnectionState,
};

/// Process a parsed message.
///
/// Returns false once the client can no longer be reached.
pub async fn handle_incoming_message(
    msg: IncomingMessage,
    state: &mut ConnectionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
) -> bool {
    let reply = match msg {
        IncomingMessage::Predict {
            landmarks,
            sequence,
            target,
        } => OutgoingMessage::Prediction(handle_predict(landmarks, sequence, target, state).await),
        IncomingMessage::Reset => {
            state.session().lock().await.reset();
            debug!("Session {} reset by client", state.session_id);
            OutgoingMessage::ResetResponse { success: true }
        }
    };

    message_tx.send(reply).await.is_ok()
}

async fn handle_predict(
    landmarks: Option<Vec<Option<f32>>>,
    sequence: Option<Vec<Vec<Option<f32>>>>,
    target: Option<String>,
    state: &mut ConnectionState,
) -> PredictionEvent {
    let Some(input) = landmark_input(landmarks, sequence) else {
        return PredictionEvent::invalid(WebSocketError::MissingLandmarks.to_message());
    };

    let session = state.session();
    let mut session = session.lock().await;

    match state
        .recognizer
        .process(&mut session, input, target.as_deref())
        .await
    {
        Ok(outcome) => PredictionEvent::from_outcome(outcome),
        Err(e) => {
            warn!(
                "Prediction failed for session {}: {}",
                state.session_id, e
            );
            PredictionEvent::from_error(&e)
        }
    }
}
