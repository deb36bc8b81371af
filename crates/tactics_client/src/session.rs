//! The session: the only API through which behaviors and animation
//! routines affect shared state.
//!
//! A [`Session`] is single-threaded and cooperative. Nothing runs on its
//! own; the host calls [`Session::pump`] whenever time has passed or input
//! arrived, and the session runs every continuation that became ready.
//! Continuations are [`Task`]s: boxed closures that receive the session
//! back. Timers go through the pausable [`Scheduler`], frame callbacks
//! through a frame queue that pausing defers.
//!
//! Dispatch, processing and the animation routines extend `Session` in
//! their own modules.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

use tactics_rules::prelude::{MapData, PlayerId, Vector};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, trace, warn};

use crate::animation::{Animation, AnimationId, AnimationKey, FlashReason};
use crate::behavior::{self, Behavior, BehaviorKind};
use crate::config::{AnimationProfile, ClientConfig, ProfileKind};
use crate::dispatch::{PendingRemote, RemoteHandle, SplitMove};
use crate::editor::EditorState;
use crate::error::{ClientError, Result};
use crate::events::{ActionTransport, GameActionResponse, SessionEvent, StaticViewport, Viewport};
use crate::processor::{Batch, Cursor};
use crate::scheduler::{Clock, Scheduler, SystemClock, TimerId};
use crate::state::{GameInfo, State, StateUpdate};

/// A continuation run by the session.
pub type Task = Box<dyn FnOnce(&mut Session) -> Result<()>>;

/// Receives every error raised inside the session.
pub type ErrorHandler = Box<dyn FnMut(&ClientError)>;

/// Capacity of the notification channel.
const EVENT_CAPACITY: usize = 64;

/// One game client.
pub struct Session {
    pub(crate) config: ClientConfig,
    pub(crate) state: State,
    clock: Box<dyn Clock>,
    scheduler: Scheduler<Task>,
    frames: VecDeque<Task>,
    completions: BTreeMap<AnimationId, Task>,
    animation_timers: BTreeMap<AnimationId, TimerId>,
    pub(crate) transport: Box<dyn ActionTransport>,
    viewport: Box<dyn Viewport>,
    pub(crate) pending: Vec<PendingRemote>,
    pub(crate) next_remote: u64,
    inbound_tx: mpsc::UnboundedSender<GameActionResponse>,
    inbound_rx: mpsc::UnboundedReceiver<GameActionResponse>,
    events: broadcast::Sender<SessionEvent>,
    pub(crate) batches: VecDeque<Batch>,
    pub(crate) processing: Option<Cursor>,
    pub(crate) local_animations: usize,
    pub(crate) split_move: Option<(RemoteHandle, SplitMove)>,
    on_error: Option<ErrorHandler>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("timers", &self.scheduler.len())
            .field("frames", &self.frames.len())
            .field("pending", &self.pending.len())
            .field("batches", &self.batches.len())
            .field("processing", &self.processing.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session for `viewer` on `map` and install the default
    /// behavior.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `config` is invalid.
    pub fn new(
        config: ClientConfig,
        map: &MapData,
        viewer: Option<PlayerId>,
        transport: impl ActionTransport + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut session = Self {
            config,
            state: State::new(map, viewer),
            clock: Box::new(SystemClock::new()),
            scheduler: Scheduler::new(),
            frames: VecDeque::new(),
            completions: BTreeMap::new(),
            animation_timers: BTreeMap::new(),
            transport: Box::new(transport),
            viewport: Box::new(StaticViewport),
            pending: Vec::new(),
            next_remote: 0,
            inbound_tx,
            inbound_rx,
            events,
            batches: VecDeque::new(),
            processing: None,
            local_animations: 0,
            split_move: None,
            on_error: None,
        };
        session.reset_behavior()?;
        Ok(session)
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use a different viewport.
    #[must_use]
    pub fn with_viewport(mut self, viewport: impl Viewport + 'static) -> Self {
        self.viewport = Box::new(viewport);
        self
    }

    /// Register the handler that receives every routed error.
    #[must_use]
    pub fn with_error_handler(mut self, handler: impl FnMut(&ClientError) + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Subscribe to session notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Sender for responses pushed by the remote side.
    pub fn remote_sender(&self) -> mpsc::UnboundedSender<GameActionResponse> {
        self.inbound_tx.clone()
    }

    // ========================================================================
    // State updates
    // ========================================================================

    /// Apply `update`. A behavior change deactivates the old behavior
    /// first and activates the new one after the update is applied.
    pub fn update(&mut self, mut update: StateUpdate) -> Result<()> {
        let Some(next) = update.take_behavior() else {
            self.state.apply(update);
            return Ok(());
        };
        let previous = self.state.behavior().cloned();
        if let Some(previous) = &previous {
            let cleanup = behavior::deactivate(self, previous);
            self.state.apply(cleanup);
        }
        self.state.apply(update);
        debug!(
            from = ?previous.as_ref().map(Behavior::kind),
            to = ?next.as_ref().map(Behavior::kind),
            "Behavior transition"
        );
        self.state.install(next.clone());
        if let Some(next) = next {
            if let Some(activation) = behavior::activate(self, &next)? {
                self.update(activation)?;
            }
        }
        Ok(())
    }

    /// Clear every selection and install the configured default behavior.
    /// After the game ended the session stays in [`Behavior::Null`].
    pub fn reset_behavior(&mut self) -> Result<()> {
        self.reset_behavior_to(Some(self.config.default_behavior))
    }

    /// Clear every selection and install `kind`, or no behavior at all.
    pub fn reset_behavior_to(&mut self, kind: Option<BehaviorKind>) -> Result<()> {
        let behavior = if self.state.map.is_ended() {
            Some(Behavior::Null)
        } else {
            kind.map(Behavior::from_kind)
        };
        self.update(StateUpdate::reset().with_behavior(behavior))
    }

    /// Hide the cursor.
    pub fn reset_position(&mut self) {
        self.state.apply(StateUpdate::new().position(None));
    }

    /// Show the info panel for `vector`, or hide it.
    pub fn show_game_info(&mut self, vector: Option<Vector>) {
        let info = vector.map(|vector| GameInfo::collect(&self.state.map, vector));
        self.state.apply(StateUpdate::new().game_info(info));
    }

    /// Replace the editor state.
    pub fn set_editor_state(&mut self, editor: Option<EditorState>) {
        self.state.apply(StateUpdate::new().editor(editor));
    }

    /// Restore the map from the latest editor snapshot.
    ///
    /// Returns `false` if there is nothing to undo.
    pub fn undo_edit(&mut self) -> bool {
        let Some((editor, map)) = self.state.editor.as_ref().and_then(EditorState::undo) else {
            return false;
        };
        self.state.apply(StateUpdate::new().editor(Some(editor)).map(map));
        true
    }

    /// Switch the viewing player. The map is re-masked for the new viewer.
    pub fn set_viewer(&mut self, viewer: Option<PlayerId>) {
        self.state.apply(StateUpdate::new().current_viewer(viewer));
    }

    // ========================================================================
    // Timers and frames
    // ========================================================================

    /// Run `task` after `delay`.
    pub fn schedule_timer(
        &mut self,
        delay: Duration,
        task: impl FnOnce(&mut Session) -> Result<()> + 'static,
    ) -> TimerId {
        let now = self.clock.now();
        self.scheduler.schedule(now, delay, Box::new(task))
    }

    /// Cancel a timer.
    pub fn clear_timer(&mut self, id: TimerId) {
        self.scheduler.clear(id);
    }

    /// Run `task` on the next frame. While paused it waits for resume.
    pub fn request_frame(&mut self, task: impl FnOnce(&mut Session) -> Result<()> + 'static) {
        if let Some(task) = self.scheduler.defer(Box::new(task)) {
            self.frames.push_back(task);
        }
    }

    /// Scroll `vectors` into view, then run `then`.
    pub fn scroll_into_view(
        &mut self,
        vectors: &[Vector],
        then: impl FnOnce(&mut Session) -> Result<()> + 'static,
    ) -> TimerId {
        let delay = if vectors.is_empty() {
            Duration::ZERO
        } else {
            self.viewport.scroll_into_view(vectors)
        };
        self.schedule_timer(delay, then)
    }

    /// Freeze every timer and defer new frames.
    pub fn pause_replay(&mut self) {
        if self.scheduler.is_paused() {
            return;
        }
        debug!("Pausing");
        self.scheduler.pause(self.clock.now());
        self.state.apply(StateUpdate::new().paused(true));
    }

    /// Restart timers with their remaining delay and release deferred
    /// frames.
    pub fn resume_replay(&mut self) {
        if !self.scheduler.is_paused() {
            return;
        }
        debug!("Resuming");
        let deferred = self.scheduler.resume(self.clock.now());
        self.frames.extend(deferred);
        self.state.apply(StateUpdate::new().paused(false));
    }

    /// Toggle near-zero animation durations.
    pub fn fast_forward(&mut self, enabled: bool) {
        self.state.apply(StateUpdate::new().fast_forward(enabled));
    }

    /// The animation profile currently in effect.
    #[must_use]
    pub fn profile(&self) -> &AnimationProfile {
        let kind = if self.state.fast_forward {
            ProfileKind::FastForward
        } else {
            self.state.profile
        };
        self.config.profile(kind)
    }

    // ========================================================================
    // Animations
    // ========================================================================

    /// Queue `animation` on `key`. `on_complete` runs once it finished.
    pub fn animate(
        &mut self,
        key: AnimationKey,
        animation: Animation,
        on_complete: Option<Task>,
    ) -> AnimationId {
        let (id, started) = self.state.animations.insert(key, animation);
        if let Some(task) = on_complete {
            self.completions.insert(id, task);
        }
        if started {
            self.start_animation(key, id);
        }
        id
    }

    /// Show a transient error banner on `vector`.
    pub fn flash(&mut self, vector: Vector, reason: FlashReason) -> AnimationId {
        self.animate(vector.into(), Animation::Flash { reason }, None)
    }

    fn start_animation(&mut self, key: AnimationKey, id: AnimationId) {
        let Some(entry) = self.state.animations.get(key) else {
            return;
        };
        let duration = self.profile().duration(&entry.animation);
        trace!(?key, kind = entry.animation.kind(), ?duration, "Starting animation");
        let timer = self.schedule_timer(duration, move |session| session.complete_animation(key, id));
        self.animation_timers.insert(id, timer);
    }

    /// Report that animation `id` on `key` finished playing. Renderers may
    /// call this early; otherwise the animation's timer does.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AnimationInvariant`] if `id` is not the
    /// active animation on `key`.
    pub fn complete_animation(&mut self, key: AnimationKey, id: AnimationId) -> Result<()> {
        let completed = self
            .state
            .animations
            .complete(key, id)
            .map_err(|mismatch| ClientError::AnimationInvariant {
                key,
                expected: id,
                found: mismatch.found,
            })?;
        if let Some(timer) = self.animation_timers.remove(&id) {
            self.scheduler.clear(timer);
        }
        trace!(?key, kind = completed.entry.animation.kind(), "Animation complete");
        if let Some(next) = completed.started {
            self.start_animation(key, next);
        }
        match self.completions.remove(&id) {
            Some(task) => task(self),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Errors and notifications
    // ========================================================================

    /// Log `error`, notify subscribers and call the error handler.
    pub fn throw_error(&mut self, error: &ClientError) {
        match error {
            ClientError::Transport(_) => warn!(%error, "Remote failure"),
            _ => error!(%error, "Client error"),
        }
        self.emit(SessionEvent::Error {
            message: error.to_string(),
        });
        if let Some(handler) = self.on_error.as_mut() {
            handler(error);
        }
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // Sending fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Run everything that became ready: inbound pushes, remote answers,
    /// due timers, frames and the next queued batch.
    pub fn pump(&mut self) {
        while let Ok(response) = self.inbound_rx.try_recv() {
            self.process_game_action_response(response);
        }
        self.poll_remote();
        loop {
            let mut progressed = false;
            while let Some(task) = self.scheduler.pop_due(self.clock.now()) {
                progressed = true;
                self.run_task(task);
            }
            while !self.scheduler.is_paused() {
                let Some(task) = self.frames.pop_front() else {
                    break;
                };
                progressed = true;
                self.run_task(task);
            }
            progressed |= self.start_next_batch();
            if !progressed {
                break;
            }
        }
    }

    fn run_task(&mut self, task: Task) {
        if let Err(error) = task(self) {
            self.throw_error(&error);
        }
    }

    /// When the next timer fires, on the session clock.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Whether frames are waiting for the next pump.
    #[must_use]
    pub fn has_pending_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Whether nothing is scheduled, playing, queued or awaited.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty()
            && self.frames.is_empty()
            && self.pending.is_empty()
            && self.batches.is_empty()
            && self.processing.is_none()
            && self.local_animations == 0
            && self.state.animations.is_empty()
    }

    /// Whether remote answers are outstanding.
    #[must_use]
    pub fn is_awaiting_remote(&self) -> bool {
        !self.pending.is_empty()
    }
}
