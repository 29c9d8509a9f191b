//! Cross-component session event broadcast.
//!
//! Replaces the browser-global `auth:logout` DOM event with an
//! explicit subscription channel owned by the session layer, so
//! non-browser hosts (tests, CLI) observe forced logouts the same
//! way the UI shell does.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to sign out
    UserRequested,
    /// A 401 could not be recovered by silent refresh
    AuthExpired,
    /// A refresh-token exchange failed
    RefreshFailed,
    /// The user-info endpoint rejected the session
    SessionRevoked,
}

/// Session event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    LoggedOut {
        reason: LogoutReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
}

/// Broadcast bus for session events.
///
/// Cloned into the HTTP gateway so it can announce an unrecoverable
/// 401 without a dependency on the orchestrator.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Lagging or absent subscribers are not an error.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
