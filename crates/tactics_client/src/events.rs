//! Remote collaborators and session notifications.
//!
//! The client never owns a network stack. Outbound actions go through an
//! [`ActionTransport`], which answers with a `oneshot` receiver. Inbound
//! pushes arrive on the session's `mpsc` sender, and notifications leave
//! through a `broadcast` channel. None of these need an async runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{Action, ActionResponse, PlayerId, Vector};
use thiserror::Error;
use tokio::sync::oneshot;

/// Everything the remote side reports for one dispatched action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameActionResponse {
    /// The authoritative response to the local player's own action.
    pub own: Option<ActionResponse>,
    /// Responses of other players and the game itself, in order.
    pub others: Vec<ActionResponse>,
}

impl GameActionResponse {
    /// A response containing only the local player's action.
    #[must_use]
    pub const fn own_only(response: ActionResponse) -> Self {
        Self {
            own: Some(response),
            others: Vec::new(),
        }
    }

    /// A response pushed by the remote side without a local action.
    #[must_use]
    pub const fn from_others(others: Vec<ActionResponse>) -> Self {
        Self { own: None, others }
    }

    /// All responses in processing order: own first, then others.
    pub fn into_responses(self) -> impl Iterator<Item = ActionResponse> {
        self.own.into_iter().chain(self.others)
    }
}

/// Failure of the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection went away before a response arrived.
    #[error("Remote side disconnected")]
    Disconnected,
    /// The remote side refused the action.
    #[error("Remote side rejected the action: {0}")]
    Rejected(String),
}

/// What a transport eventually delivers.
pub type RemoteResult = Result<GameActionResponse, TransportError>;

/// Sends actions to the authoritative side.
pub trait ActionTransport {
    /// Send `action`. The receiver resolves with the remote answer.
    fn send(&mut self, action: &Action) -> oneshot::Receiver<RemoteResult>;
}

/// A transport for sessions without a remote side. Every action is
/// answered with an empty response.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl ActionTransport for OfflineTransport {
    fn send(&mut self, _action: &Action) -> oneshot::Receiver<RemoteResult> {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(Ok(GameActionResponse::default()));
        receiver
    }
}

/// Scrolls the visible part of the map.
pub trait Viewport {
    /// Bring `vectors` into view. Returns how long the transition takes.
    fn scroll_into_view(&mut self, vectors: &[Vector]) -> Duration;
}

/// A viewport that shows the whole map at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticViewport;

impl Viewport for StaticViewport {
    fn scroll_into_view(&mut self, _vectors: &[Vector]) -> Duration {
        Duration::ZERO
    }
}

/// Notifications for external subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A batch of responses was fully processed.
    ActionsProcessed {
        /// Number of responses in the batch.
        responses: usize,
        /// The last response committed to the map.
        last: Option<ActionResponse>,
    },
    /// The game ended.
    GameEnded {
        /// The winner, `None` for a draw.
        winner: Option<PlayerId>,
    },
    /// An error reached the error handler.
    Error {
        /// Rendered error.
        message: String,
    },
}
