//! Action-response processor.
//!
//! Batches of authoritative responses are processed strictly one at a time
//! and in arrival order. Within a batch every response is scrolled into
//! view, animated and committed before the next one starts. Input stays
//! disabled until the batch is drained.
//!
//! ```text
//! batch ──► scroll ──► animate ──► commit ──► pause ──► next response
//!                                                  └──► drained: reset + notify
//! ```
//!
//! Nothing here blocks. Each step schedules the next one through the
//! session's timers and frames, so pausing a replay freezes a batch at
//! whatever step it reached.
//!
//! A live batch holding nothing but [`ActionResponse::Reveal`] has nothing
//! to animate. It is merged into the map as soon as it starts and the
//! current behavior is activated again, so a menu opened after a move
//! offers actions against the units that move brought into sight.

use std::collections::VecDeque;
use std::time::Duration;

use tactics_rules::prelude::{apply_hidden_action_response, ActionResponse, MapData};
use tracing::{debug, info};

use crate::behavior::{self, Behavior, BehaviorKind};
use crate::config::ProfileKind;
use crate::dispatch::SplitMove;
use crate::error::{ClientError, Result};
use crate::events::{GameActionResponse, SessionEvent};
use crate::session::{Session, Task};
use crate::state::StateUpdate;

pub(crate) enum BatchItem {
    Response(ActionResponse),
    /// The authoritative outcome of a move that was only played up to the
    /// fog.
    FollowUp {
        split: SplitMove,
        response: ActionResponse,
    },
}

impl BatchItem {
    fn response(&self) -> &ActionResponse {
        match self {
            Self::Response(response) | Self::FollowUp { response, .. } => response,
        }
    }

    const fn is_reveal(&self) -> bool {
        matches!(self, Self::Response(ActionResponse::Reveal { .. }))
    }
}

pub(crate) struct Batch {
    items: Vec<BatchItem>,
    replay: bool,
    /// Merged without animating or resetting the behavior.
    quiet: bool,
}

impl Batch {
    pub(crate) fn new(items: Vec<BatchItem>, replay: bool) -> Self {
        let quiet = !replay && !items.is_empty() && items.iter().all(BatchItem::is_reveal);
        Self {
            items,
            replay,
            quiet,
        }
    }
}

/// Progress through the batch being processed.
pub(crate) struct Cursor {
    items: VecDeque<BatchItem>,
    processed: usize,
    /// Runs instead of the reset once the batch is drained.
    pub(crate) on_drained: Option<Task>,
    replay: bool,
}

/// Whether two responses touch the same or neighboring fields.
fn is_near(previous: &ActionResponse, next: &ActionResponse) -> bool {
    let previous = previous.vectors();
    next.vectors().iter().any(|next| {
        previous
            .iter()
            .any(|previous| previous == next || previous.is_adjacent(*next))
    })
}

impl Session {
    /// Queue everything in `response` for processing.
    pub fn process_game_action_response(&mut self, response: GameActionResponse) {
        let items: Vec<BatchItem> = response.into_responses().map(BatchItem::Response).collect();
        if items.is_empty() {
            return;
        }
        debug!(responses = items.len(), queued = self.batches.len(), "Queueing batch");
        self.batches.push_back(Batch::new(items, false));
    }

    /// Play back recorded responses. Remote actions are suppressed until
    /// the batch is drained.
    pub fn replay(&mut self, responses: Vec<ActionResponse>) {
        if responses.is_empty() {
            return;
        }
        info!(responses = responses.len(), "Starting replay");
        self.state.apply(StateUpdate::new().replaying(true));
        let items = responses.into_iter().map(BatchItem::Response).collect();
        self.batches.push_back(Batch::new(items, true));
    }

    /// Whether a batch is being processed.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }

    /// Start the next queued batch if nothing else is playing.
    pub(crate) fn start_next_batch(&mut self) -> bool {
        if self.processing.is_some() || self.local_animations > 0 || self.state.paused {
            return false;
        }
        let Some(batch) = self.batches.pop_front() else {
            return false;
        };
        if batch.quiet {
            let result = self.merge_reveals(batch.items);
            if let Err(error) = result {
                self.throw_error(&error);
            }
            return true;
        }
        debug!(responses = batch.items.len(), replay = batch.replay, "Processing batch");
        self.processing = Some(Cursor {
            items: batch.items.into(),
            processed: 0,
            on_drained: None,
            replay: batch.replay,
        });
        self.step_batch();
        true
    }

    fn merge_reveals(&mut self, items: Vec<BatchItem>) -> Result<()> {
        debug!(responses = items.len(), "Merging revealed units");
        for item in items {
            let next_map = self.remote_map(item.response())?;
            self.state.apply(StateUpdate::new().map(next_map));
        }
        let Some(behavior) = self.state.behavior().cloned() else {
            return Ok(());
        };
        match behavior::activate(self, &behavior)? {
            Some(update) => self.update(update),
            None => Ok(()),
        }
    }

    fn step_batch(&mut self) {
        let result = self.try_step_batch();
        self.batch_result(result);
    }

    fn batch_result(&mut self, result: Result<()>) {
        if let Err(error) = result {
            self.abort_batch(&error);
        }
    }

    fn try_step_batch(&mut self) -> Result<()> {
        if self.state.behavior_kind() != Some(BehaviorKind::Null) {
            self.update(StateUpdate::reset().behavior(Behavior::Null))?;
        }
        let Some(cursor) = self.processing.as_mut() else {
            return Ok(());
        };
        let Some(item) = cursor.items.pop_front() else {
            return self.finish_batch();
        };
        let vectors = item.response().vectors();
        self.scroll_into_view(&vectors, move |session| {
            let result = session.process_item(item);
            session.batch_result(result);
            Ok(())
        });
        Ok(())
    }

    fn process_item(&mut self, item: BatchItem) -> Result<()> {
        match item {
            BatchItem::Response(response) => {
                let next_map = self.remote_map(&response)?;
                self.play_response(response, next_map, Box::new(Session::after_item))
            }
            BatchItem::FollowUp { split, response } => self.follow_up(split, response),
        }
    }

    /// Pick the pacing for the next response and schedule it.
    pub(crate) fn after_item(&mut self) -> Result<()> {
        let Some(cursor) = self.processing.as_mut() else {
            return Ok(());
        };
        cursor.processed += 1;
        let next = cursor.items.front().map(|item| item.response().clone());

        let map = &self.state.map;
        let profile = match &next {
            Some(ActionResponse::EndTurn { next, .. }) if !map.is_bot(*next) => ProfileKind::Human,
            Some(_) => ProfileKind::Bot,
            None if map.is_bot(map.current_player) => ProfileKind::Bot,
            None => ProfileKind::Human,
        };
        self.state.apply(StateUpdate::new().profile(profile));

        let delay = match (&self.state.last_action_response, &next) {
            (_, None) => Duration::ZERO,
            (Some(previous), Some(next)) if is_near(previous, next) => {
                self.profile().pace(self.config.short_step_delay_ms)
            }
            _ => self.profile().pace(self.config.long_step_delay_ms),
        };
        self.schedule_timer(delay, |session| {
            session.step_batch();
            Ok(())
        });
        Ok(())
    }

    fn finish_batch(&mut self) -> Result<()> {
        let Some(cursor) = self.processing.take() else {
            return Ok(());
        };
        if cursor.replay {
            self.state.apply(StateUpdate::new().replaying(false));
        }
        info!(responses = cursor.processed, "Processed batch");
        let result = match cursor.on_drained {
            Some(task) if !self.state.map.is_ended() => task(self),
            _ => self.reset_behavior(),
        };
        self.emit(SessionEvent::ActionsProcessed {
            responses: cursor.processed,
            last: self.state.last_action_response.clone(),
        });
        result
    }

    fn abort_batch(&mut self, error: &ClientError) {
        if let Some(cursor) = self.processing.take() {
            if cursor.replay {
                self.state.apply(StateUpdate::new().replaying(false));
            }
        }
        self.throw_error(error);
        if let Err(error) = self.reset_behavior() {
            self.throw_error(&error);
        }
    }

    /// The map after `response`, as the viewer sees it.
    pub(crate) fn remote_map(&self, response: &ActionResponse) -> Result<MapData> {
        if response.is_hidden() && !self.state.map.fog {
            return Err(ClientError::UnhandledResponse {
                kind: response.kind(),
                reason: "hidden responses need a map with fog of war",
            });
        }
        apply_hidden_action_response(&self.state.map, &self.state.vision, response)
            .map_err(|source| ClientError::rules_with(format!("{response:?}"), &self.state.map, source))
    }
}
