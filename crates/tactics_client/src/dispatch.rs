//! Action dispatch.
//!
//! An action is executed against the local map synchronously and sent to
//! the authoritative side at the same time. The remote answer is a
//! `oneshot` receiver polled on every pump. Once it resolves the answer is
//! reconciled with what was already played locally: an optimistically
//! played own response is dropped, everything else is queued for the
//! processor.
//!
//! A failing transport never leaves optimistic state dangling. The error
//! reaches the error handler and the dispatch resolves as if the remote
//! side had confirmed the local response.

use tactics_rules::prelude::{execute_action, Action, ActionResponse, MapData, Vector};
use tactics_rules::radius::can_stop_at;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, trace};

use crate::error::{ClientError, Result};
use crate::events::{GameActionResponse, RemoteResult, TransportError};
use crate::processor::{Batch, BatchItem};
use crate::session::{Session, Task};

/// Handle of a dispatched action whose remote answer is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteHandle(u64);

/// Result of [`Session::action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// The outstanding remote answer.
    pub remote: RemoteHandle,
    /// The local map after the action.
    pub map: MapData,
    /// The local response.
    pub response: ActionResponse,
}

/// Runs with the remote answer instead of the default reconciliation.
pub type RemoteContinuation = Box<dyn FnOnce(&mut Session, GameActionResponse) -> Result<()>>;

pub(crate) struct PendingRemote {
    handle: RemoteHandle,
    action: &'static str,
    receiver: oneshot::Receiver<RemoteResult>,
    /// Resolves the dispatch when the transport fails.
    fallback: ActionResponse,
    /// Whether the local response was already played.
    played: bool,
    continuation: Option<RemoteContinuation>,
}

/// An optimistic move cut short where it entered the fog.
///
/// Only the visible part is played locally. The rest follows once the
/// authoritative response reports where the unit actually arrived.
pub(crate) struct SplitMove {
    pub(crate) from: Vector,
    /// Last field played locally, `from` if nothing was visible.
    pub(crate) partial: Vector,
    /// Requested destination.
    pub(crate) to: Vector,
    /// The truncated response played locally.
    pub(crate) local: ActionResponse,
    /// Continuation of the move, run once the unit arrived.
    pub(crate) then: Option<Task>,
    /// Set once the local part started playing.
    pub(crate) awaiting: bool,
}

impl Session {
    /// Execute `action` locally and send it to the remote side.
    ///
    /// The local map is not committed. The remote answer is reconciled on
    /// a later pump unless a continuation is attached with
    /// [`Session::await_remote`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::GameEnded`] after the game ended,
    /// [`ClientError::RemoteActionsSuppressed`] during a replay and
    /// [`ClientError::Rules`] if the rules reject the action.
    pub fn action(&mut self, action: Action) -> Result<Dispatched> {
        if self.state.map.is_ended() {
            return Err(ClientError::GameEnded {
                action: action.kind(),
            });
        }
        if self.state.replaying {
            return Err(ClientError::RemoteActionsSuppressed {
                action: action.kind(),
            });
        }
        let (map, response) = execute_action(&self.state.map, &action)
            .map_err(|source| ClientError::rules(&action, &self.state.map, source))?;

        let handle = RemoteHandle(self.next_remote);
        self.next_remote += 1;
        info!(action = action.kind(), response = response.kind(), ?handle, "Dispatching action");
        let receiver = self.transport.send(&action);
        self.pending.push(PendingRemote {
            handle,
            action: action.kind(),
            receiver,
            fallback: response.clone(),
            played: false,
            continuation: None,
        });
        Ok(Dispatched {
            remote: handle,
            map,
            response,
        })
    }

    /// Handle the remote answer of `handle` with `continuation`.
    ///
    /// Returns `false` if the answer was already handled.
    pub fn await_remote(
        &mut self,
        handle: RemoteHandle,
        continuation: impl FnOnce(&mut Session, GameActionResponse) -> Result<()> + 'static,
    ) -> bool {
        match self.pending.iter_mut().find(|pending| pending.handle == handle) {
            Some(pending) => {
                pending.continuation = Some(Box::new(continuation));
                true
            }
            None => false,
        }
    }

    /// Dispatch `action`, play its local response and return it. The
    /// remote answer is reconciled automatically.
    ///
    /// The local response is animated and committed like any other. Then
    /// `then` runs, or the session resets to its default behavior. Moves
    /// that enter the fog are split: the returned response ends on the last
    /// visible field and `then` waits until the unit actually arrived.
    ///
    /// # Errors
    ///
    /// See [`Session::action`].
    pub fn optimistic_action(&mut self, action: Action, then: Option<Task>) -> Result<ActionResponse> {
        let dispatched = self.action(action)?;
        if let Some(pending) = self
            .pending
            .iter_mut()
            .find(|pending| pending.handle == dispatched.remote)
        {
            pending.played = true;
        }
        let local = match self.split_at_fog(&dispatched.response) {
            Some(split) => {
                debug!(
                    from = ?split.from,
                    partial = ?split.partial,
                    to = ?split.to,
                    "Move enters the fog, playing the visible part"
                );
                let local = split.local.clone();
                self.split_move = Some((dispatched.remote, split));
                local
            }
            None => dispatched.response,
        };
        self.play_local(local.clone(), then)?;
        Ok(local)
    }

    fn split_at_fog(&self, response: &ActionResponse) -> Option<SplitMove> {
        let ActionResponse::Move { from, to, path } = response else {
            return None;
        };
        let visible = self.state.vision.visible_fields(&self.state.map)?;
        let unit = self.state.map.unit(*from)?;
        let mut kept: Vec<Vector> = path
            .iter()
            .copied()
            .take_while(|vector| visible.contains(vector))
            .collect();
        if kept.len() == path.len() {
            return None;
        }
        while let Some(last) = kept.last() {
            if can_stop_at(&self.state.map, unit, *from, *last) {
                break;
            }
            kept.pop();
        }
        let partial = kept.last().copied().unwrap_or(*from);
        Some(SplitMove {
            from: *from,
            partial,
            to: *to,
            local: ActionResponse::Move {
                from: *from,
                to: partial,
                path: kept,
            },
            then: None,
            awaiting: false,
        })
    }

    /// Play a locally executed response and commit it.
    ///
    /// The processor waits until the local animation committed. Then
    /// `then` runs, or the session resets to its default behavior. The
    /// continuation of a split move waits for the follow-up instead.
    fn play_local(&mut self, response: ActionResponse, then: Option<Task>) -> Result<()> {
        let after: Task = match self.split_move.as_mut() {
            Some((_, split)) if !split.awaiting => {
                split.awaiting = true;
                split.then = then;
                Box::new(|_| Ok(()))
            }
            _ => then.unwrap_or_else(|| Box::new(Session::reset_behavior)),
        };
        let next_map = self.remote_map(&response)?;
        self.local_animations += 1;
        self.play_response(
            response,
            next_map,
            Box::new(move |session| {
                session.local_animations = session.local_animations.saturating_sub(1);
                after(session)
            }),
        )
    }

    /// Resolve every remote answer that arrived, in dispatch order.
    pub(crate) fn poll_remote(&mut self) {
        let mut index = 0;
        while index < self.pending.len() {
            let result = match self.pending[index].receiver.try_recv() {
                Err(TryRecvError::Empty) => {
                    index += 1;
                    continue;
                }
                Err(TryRecvError::Closed) => Err(TransportError::Disconnected),
                Ok(result) => result,
            };
            let mut pending = self.pending.remove(index);
            trace!(handle = ?pending.handle, action = pending.action, "Remote answer");
            let response = result.unwrap_or_else(|error| {
                self.throw_error(&ClientError::Transport(error));
                GameActionResponse::own_only(pending.fallback.clone())
            });
            let outcome = match pending.continuation.take() {
                Some(continuation) => continuation(self, response),
                None => {
                    self.reconcile(&pending, response);
                    Ok(())
                }
            };
            if let Err(error) = outcome {
                self.throw_error(&error);
            }
        }
    }

    fn reconcile(&mut self, pending: &PendingRemote, remote: GameActionResponse) {
        let GameActionResponse { own, others } = remote;
        let split = match self.split_move.take() {
            Some((owner, split)) if owner == pending.handle => Some(split),
            other => {
                self.split_move = other;
                None
            }
        };
        let mut items = Vec::with_capacity(others.len() + 1);
        if let Some(split) = split {
            let response = own.unwrap_or_else(|| split.local.clone());
            items.push(BatchItem::FollowUp { split, response });
        } else if !pending.played {
            items.extend(own.map(BatchItem::Response));
        } else if let Some(own) = own.filter(|own| *own != pending.fallback) {
            debug!(
                local = pending.fallback.kind(),
                remote = own.kind(),
                "Remote outcome differs from the local one"
            );
        }
        items.extend(others.into_iter().map(BatchItem::Response));
        if !items.is_empty() {
            self.batches.push_back(Batch::new(items, false));
        }
    }
}
