//! Headless replay of recorded games.
//!
//! A [`Recording`] is a starting map plus the actions played on it. The
//! runner executes the actions the way the authoritative side would, dims
//! the responses for the chosen viewer and feeds them through a client
//! [`Session`] until every animation has played and the map is committed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tactics_client::prelude::{
    ClientConfig, ClientError, Clock, OfflineTransport, Session, SessionEvent, SystemClock,
};
use tactics_rules::prelude::{
    apply_action_response, check_game_over, execute_action, Action, ActionResponse, MapData,
    Outcome, PlayerId, RulesError, Vision,
};
use tracing::{debug, info, warn};

use crate::error::{Result, ToolError};

/// Upper bound on pump rounds before a replay counts as stalled.
const MAX_ROUNDS: usize = 1_000_000;

// =============================================================================
// Recording
// =============================================================================

/// A recorded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// The authoritative map before the first action.
    pub map: MapData,
    /// Actions in the order they were played.
    pub actions: Vec<Action>,
}

impl Recording {
    /// Load a RON recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ToolError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The responses `viewer` receives for the recorded actions.
    ///
    /// Responses the viewer cannot observe at all are left out, and units
    /// that come into sight follow the response that revealed them.
    /// Recording stops at the end of the game, which is appended as its own
    /// response.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Rejected`] for the first action the rules refuse.
    pub fn responses(&self, viewer: Option<PlayerId>) -> Result<Vec<ActionResponse>> {
        let vision = Vision::new(viewer);
        let mut map = self.map.clone();
        let mut responses = Vec::with_capacity(self.actions.len());

        for (index, action) in self.actions.iter().enumerate() {
            let rejected = |source: RulesError| ToolError::Rejected {
                index,
                action: action.kind().to_string(),
                source,
            };
            let (next, response) = execute_action(&map, action).map_err(rejected)?;
            responses.extend(vision.dim_response(&map, &response));
            responses.extend(vision.reveal(&map, &next));
            map = next;

            if let Some(end) = check_game_over(&map) {
                map = apply_action_response(&map, &end).map_err(rejected)?;
                responses.push(end);
                if index + 1 < self.actions.len() {
                    warn!(
                        ignored = self.actions.len() - index - 1,
                        "Game ended before the recording did"
                    );
                }
                break;
            }
        }
        Ok(responses)
    }
}

// =============================================================================
// Runner
// =============================================================================

/// How quickly a replay plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Animations take their real durations and the runner sleeps.
    RealTime,
    /// Fast-forward profile on a virtual clock. Nothing sleeps.
    #[default]
    FastForward,
}

/// Replay settings.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// The player whose view is replayed. `None` spectates.
    pub viewer: Option<PlayerId>,
    /// Playback speed.
    pub pacing: Pacing,
    /// Client configuration, including the animation profiles.
    pub config: ClientConfig,
}

/// What a finished replay ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Responses fed to the client.
    pub responses: usize,
    /// Session time the replay took.
    pub elapsed: Duration,
    /// Round on the committed map.
    pub round: u32,
    /// Player to move on the committed map.
    pub current_player: PlayerId,
    /// Units the viewer sees at the end.
    pub units: usize,
    /// Set if the game ended.
    pub outcome: Option<Outcome>,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} responses in {:.2}s, round {}, player {} to move, {} units visible",
            self.responses,
            self.elapsed.as_secs_f64(),
            self.round,
            self.current_player,
            self.units
        )?;
        match self.outcome {
            Some(Outcome::Winner(player)) => write!(f, ", player {player} won"),
            Some(Outcome::Draw) => write!(f, ", draw"),
            None => Ok(()),
        }
    }
}

/// Time source of a replay, shared between the session and the runner.
#[derive(Debug, Clone)]
enum ReplayClock {
    Wall(SystemClock),
    Virtual(Rc<Cell<Duration>>),
}

impl ReplayClock {
    fn new(pacing: Pacing) -> Self {
        match pacing {
            Pacing::RealTime => Self::Wall(SystemClock::new()),
            Pacing::FastForward => Self::Virtual(Rc::default()),
        }
    }

    fn wait_until(&self, deadline: Duration) {
        match self {
            Self::Wall(clock) => std::thread::sleep(deadline.saturating_sub(clock.now())),
            Self::Virtual(now) => now.set(now.get().max(deadline)),
        }
    }
}

impl Clock for ReplayClock {
    fn now(&self) -> Duration {
        match self {
            Self::Wall(clock) => clock.now(),
            Self::Virtual(now) => now.get(),
        }
    }
}

/// Replay `recording` through a fresh session.
///
/// # Errors
///
/// Returns an error if an action is rejected, the configuration is invalid,
/// the client reports an error while processing, or the session stops
/// making progress.
pub fn run(recording: &Recording, options: &ReplayOptions) -> Result<ReplaySummary> {
    let responses = recording.responses(options.viewer)?;
    let count = responses.len();
    info!(
        actions = recording.actions.len(),
        responses = count,
        viewer = ?options.viewer,
        pacing = ?options.pacing,
        "Replaying"
    );

    let clock = ReplayClock::new(options.pacing);
    let errors: Rc<RefCell<Vec<ClientError>>> = Rc::default();
    let sink = errors.clone();
    let mut session = Session::new(
        options.config.clone(),
        &recording.map,
        options.viewer,
        OfflineTransport,
    )?
    .with_clock(clock.clone())
    .with_error_handler(move |error| sink.borrow_mut().push(error.clone()));
    session.fast_forward(options.pacing == Pacing::FastForward);

    let mut events = session.subscribe();
    let start = clock.now();
    session.replay(responses);

    let mut processed = 0;
    for _ in 0..MAX_ROUNDS {
        session.pump();
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::ActionsProcessed { responses, last } => {
                    processed += responses;
                    debug!(responses, last = ?last.as_ref().map(ActionResponse::kind), "Batch done");
                }
                SessionEvent::GameEnded { winner } => info!(?winner, "Game ended"),
                SessionEvent::Error { message } => warn!(%message, "Client error"),
            }
        }
        if let Some(error) = errors.borrow_mut().drain(..).next() {
            return Err(error.into());
        }

        if session.is_idle() {
            let map = &session.state().map;
            return Ok(ReplaySummary {
                responses: count,
                elapsed: clock.now().saturating_sub(start),
                round: map.round,
                current_player: map.current_player,
                units: map.units.len(),
                outcome: map.outcome,
            });
        }
        match session.next_deadline() {
            Some(deadline) => clock.wait_until(deadline),
            None if session.has_pending_frames() => {}
            None => break,
        }
    }
    Err(ToolError::Stalled {
        responses: processed,
    })
}
