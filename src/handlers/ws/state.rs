//! WebSocket connection state management
//!
//! Each connection owns one registration in the session store. The
//! registration is identified by a ticket so that a reconnect under the same
//! session id never shares, or tears down, another connection's state.

use std::sync::Arc;

use tracing::debug;

use crate::core::recognizer::Recognizer;
use crate::core::session_store::{SessionStore, SessionTicket, SharedSession};

pub struct ConnectionState {
    /// Session id, client-supplied or generated
    pub session_id: String,
    /// Category served on this connection
    pub recognizer: Arc<Recognizer>,
    sessions: Arc<SessionStore>,
    ticket: SessionTicket,
}

impl ConnectionState {
    /// Register a fresh session for this connection.
    pub fn open(session_id: String, recognizer: Arc<Recognizer>, sessions: Arc<SessionStore>) -> Self {
        let ticket = sessions.create(&session_id, recognizer.name(), recognizer.new_session());
        Self {
            session_id,
            recognizer,
            sessions,
            ticket,
        }
    }

    /// The session state for the next message.
    ///
    /// A session reaped while idle is registered again with fresh state.
    pub fn session(&mut self) -> SharedSession {
        if let Some(session) = self.sessions.checkout(&self.session_id, self.ticket) {
            return session;
        }

        debug!(
            "Session {} expired, registering fresh state",
            self.session_id
        );
        self.ticket = self.sessions.create(
            &self.session_id,
            self.recognizer.name(),
            self.recognizer.new_session(),
        );
        match self.sessions.checkout(&self.session_id, self.ticket) {
            Some(session) => session,
            // Only reachable if the reaper ran between create and checkout.
            None => Arc::new(tokio::sync::Mutex::new(self.recognizer.new_session())),
        }
    }

    /// Drop this connection's registration, leaving newer ones alone.
    pub fn close(&self) -> bool {
        self.sessions.remove(&self.session_id, self.ticket)
    }
}
