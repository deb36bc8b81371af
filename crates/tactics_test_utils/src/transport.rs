//! Transports and viewports for driving sessions without a network.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tactics_client::prelude::{
    ActionTransport, GameActionResponse, RemoteResult, TransportError, Viewport,
};
use tactics_rules::prelude::{
    apply_action_response, check_game_over, execute_action, Action, MapData, PlayerId, Vector,
    Vision,
};
use tokio::sync::oneshot;
use tracing::debug;

fn resolved(result: RemoteResult) -> oneshot::Receiver<RemoteResult> {
    let (sender, receiver) = oneshot::channel();
    let _ = sender.send(result);
    receiver
}

// ============================================================================
// Local server
// ============================================================================

#[derive(Debug)]
struct ServerState {
    map: MapData,
    vision: Vision,
    replies: VecDeque<Action>,
    received: Vec<Action>,
}

/// An in-process authoritative side.
///
/// Every action is executed on the server's own map. The sender receives
/// its full response; queued opponent actions are executed afterwards and
/// reported the way the viewer sees them, each followed by the units that
/// came into sight. Clones share the same server.
#[derive(Debug, Clone)]
pub struct LocalServer {
    inner: Rc<RefCell<ServerState>>,
}

impl LocalServer {
    /// A server starting from `map`, reporting to `viewer`.
    #[must_use]
    pub fn new(map: &MapData, viewer: Option<PlayerId>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ServerState {
                map: map.clone(),
                vision: Vision::new(viewer),
                replies: VecDeque::new(),
                received: Vec::new(),
            })),
        }
    }

    /// Queue opponent actions to run after the next accepted action.
    pub fn reply_with(&self, actions: impl IntoIterator<Item = Action>) {
        self.inner.borrow_mut().replies.extend(actions);
    }

    /// The authoritative map.
    #[must_use]
    pub fn map(&self) -> MapData {
        self.inner.borrow().map.clone()
    }

    /// Every action received so far.
    #[must_use]
    pub fn received(&self) -> Vec<Action> {
        self.inner.borrow().received.clone()
    }

    fn execute(&self, action: &Action) -> RemoteResult {
        let mut server = self.inner.borrow_mut();
        server.received.push(action.clone());
        let (map, own) = execute_action(&server.map, action)
            .map_err(|error| TransportError::Rejected(error.to_string()))?;
        let mut others: Vec<_> = server.vision.reveal(&server.map, &map).into_iter().collect();
        server.map = map;

        while let Some(reply) = server.replies.pop_front() {
            let before = server.map.clone();
            let (map, response) = execute_action(&before, &reply)
                .map_err(|error| TransportError::Rejected(error.to_string()))?;
            others.extend(server.vision.dim_response(&before, &response));
            others.extend(server.vision.reveal(&before, &map));
            server.map = map;
        }
        if let Some(end) = check_game_over(&server.map) {
            server.map = apply_action_response(&server.map, &end)
                .map_err(|error| TransportError::Rejected(error.to_string()))?;
            others.push(end);
        }
        debug!(action = action.kind(), others = others.len(), "Local server answered");
        Ok(GameActionResponse {
            own: Some(own),
            others,
        })
    }
}

impl ActionTransport for LocalServer {
    fn send(&mut self, action: &Action) -> oneshot::Receiver<RemoteResult> {
        resolved(self.execute(action))
    }
}

// ============================================================================
// Recording and failing transports
// ============================================================================

/// Records actions and keeps every answer open until [`Self::answer`] is
/// called. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Rc<RefCell<Recorded>>,
}

#[derive(Debug, Default)]
struct Recorded {
    actions: Vec<Action>,
    senders: VecDeque<oneshot::Sender<RemoteResult>>,
}

impl RecordingTransport {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every action sent so far.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.inner.borrow().actions.clone()
    }

    /// Resolve the oldest open answer. Returns `false` if none is open.
    pub fn answer(&self, result: RemoteResult) -> bool {
        let sender = self.inner.borrow_mut().senders.pop_front();
        sender.is_some_and(|sender| sender.send(result).is_ok())
    }
}

impl ActionTransport for RecordingTransport {
    fn send(&mut self, action: &Action) -> oneshot::Receiver<RemoteResult> {
        let (sender, receiver) = oneshot::channel();
        let mut inner = self.inner.borrow_mut();
        inner.actions.push(action.clone());
        inner.senders.push_back(sender);
        receiver
    }
}

/// A transport whose connection is always gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingTransport;

impl ActionTransport for FailingTransport {
    fn send(&mut self, _action: &Action) -> oneshot::Receiver<RemoteResult> {
        // Dropping the sender closes the channel.
        let (_, receiver) = oneshot::channel();
        receiver
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// A viewport that takes a fixed time per scroll and records every request.
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingViewport {
    delay: Duration,
    scrolls: Rc<RefCell<Vec<Vec<Vector>>>>,
}

impl RecordingViewport {
    /// A viewport that needs `delay` per scroll.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            scrolls: Rc::default(),
        }
    }

    /// Every scroll request so far.
    #[must_use]
    pub fn scrolls(&self) -> Vec<Vec<Vector>> {
        self.scrolls.borrow().clone()
    }
}

impl Viewport for RecordingViewport {
    fn scroll_into_view(&mut self, vectors: &[Vector]) -> Duration {
        self.scrolls.borrow_mut().push(vectors.to_vec());
        self.delay
    }
}
