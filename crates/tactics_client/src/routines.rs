//! Animation routines.
//!
//! Every response kind maps to a short sequence of animations. The
//! sequence plays one entry after the other through completion callbacks,
//! and the map is committed on the frame after the last one finished. A
//! unit therefore explodes before it disappears from the map, and a health
//! bar animates down before the new health is stored.

use std::collections::VecDeque;

use tactics_rules::prelude::{ActionResponse, Building, MapData, Outcome, Unit, UnitKind, Vector};
use tracing::{info, trace};

use crate::animation::{Animation, AnimationKey, Banner, FlashReason};
use crate::dispatch::SplitMove;
use crate::error::{ClientError, Result};
use crate::events::SessionEvent;
use crate::session::{Session, Task};
use crate::state::StateUpdate;

type Steps = VecDeque<(AnimationKey, Animation)>;

impl Session {
    /// Animate `response`, then commit `next_map` and run `then`.
    pub(crate) fn play_response(&mut self, response: ActionResponse, next_map: MapData, then: Task) -> Result<()> {
        let steps = self.animation_steps(&response)?;
        trace!(kind = response.kind(), steps = steps.len(), "Playing response");
        self.play_sequence(
            steps,
            Box::new(move |session| {
                session.request_frame(move |session| session.commit(response, next_map, then));
                Ok(())
            }),
        )
    }

    fn play_sequence(&mut self, mut steps: Steps, then: Task) -> Result<()> {
        let Some((key, animation)) = steps.pop_front() else {
            return then(self);
        };
        self.animate(
            key,
            animation,
            Some(Box::new(move |session| session.play_sequence(steps, then))),
        );
        Ok(())
    }

    fn commit(&mut self, response: ActionResponse, next_map: MapData, then: Task) -> Result<()> {
        let was_ended = self.state.map.is_ended();
        trace!(kind = response.kind(), "Committing response");
        self.state.apply(
            StateUpdate::new()
                .map(next_map)
                .last_action_response(Some(response)),
        );
        if let (false, Some(outcome)) = (was_ended, self.state.map.outcome) {
            let winner = match outcome {
                Outcome::Winner(player) => Some(player),
                Outcome::Draw => None,
            };
            info!(?winner, "Game ended");
            self.emit(SessionEvent::GameEnded { winner });
        }
        then(self)
    }

    /// Play the rest of a split move from where the local part stopped.
    pub(crate) fn follow_up(&mut self, split: SplitMove, response: ActionResponse) -> Result<()> {
        let ActionResponse::Move { to, path, .. } = &response else {
            return Err(ClientError::UnhandledResponse {
                kind: response.kind(),
                reason: "a move that entered the fog needs a move response",
            });
        };
        let remaining = if split.partial == split.from {
            path.clone()
        } else {
            path.iter()
                .position(|vector| *vector == split.partial)
                .map(|index| path[index + 1..].to_vec())
                .unwrap_or_default()
        };
        let to = *to;
        let arrived = to == split.to;
        trace!(partial = ?split.partial, ?to, arrived, "Following up a split move");
        if arrived {
            if let Some(cursor) = self.processing.as_mut() {
                cursor.on_drained = split.then;
            }
        } else {
            self.flash(to, FlashReason::Blocked);
        }

        let rest = ActionResponse::Move {
            from: split.partial,
            to,
            path: remaining,
        };
        let next_map = self.remote_map(&rest)?;
        self.play_response(rest, next_map, Box::new(Session::after_item))
    }

    fn unit_at(&self, vector: Vector) -> Result<&Unit> {
        self.state
            .map
            .unit(vector)
            .ok_or_else(|| ClientError::missing_unit(vector))
    }

    fn animation_steps(&mut self, response: &ActionResponse) -> Result<Steps> {
        let map = &self.state.map;
        let mut steps = Steps::new();
        match response {
            ActionResponse::Move { from, path, .. } => {
                if !path.is_empty() {
                    let unit = self.unit_at(*from)?.clone();
                    steps.push_back((
                        (*from).into(),
                        Animation::Move {
                            from: *from,
                            path: path.clone(),
                            unit,
                        },
                    ));
                }
            }
            ActionResponse::AttackUnit {
                from,
                to,
                unit_a,
                unit_b,
            } => {
                let defender = self.unit_at(*to)?.kind;
                steps.push_back(((*from).into(), Animation::Attack { target: *to }));
                hit(&mut steps, *to, unit_b.as_ref().map(|unit| unit.health), Some(defender));
                counter(&mut steps, map, *from, Some(*to), unit_a.as_ref());
            }
            ActionResponse::AttackBuilding {
                from,
                to,
                unit_a,
                building,
            } => {
                steps.push_back(((*from).into(), Animation::Attack { target: *to }));
                hit(&mut steps, *to, building.as_ref().map(|building| building.health), None);
                counter(&mut steps, map, *from, None, unit_a.as_ref());
            }
            ActionResponse::Capture { from, building } => {
                steps.push_back((
                    (*from).into(),
                    Animation::Capture {
                        player: building.player,
                    },
                ));
            }
            ActionResponse::CreateUnit { to, unit, .. } => {
                steps.push_back(((*to).into(), Animation::Spawn { unit: unit.clone() }));
            }
            ActionResponse::CreateBuilding { from, building } => {
                steps.push_back((
                    (*from).into(),
                    Animation::Build {
                        building: building.clone(),
                    },
                ));
            }
            ActionResponse::DropUnit { from, index, to } => {
                let unit = self
                    .unit_at(*from)?
                    .transports
                    .get(*index)
                    .map(|carried| carried.deploy())
                    .ok_or_else(|| ClientError::missing_unit(*from))?;
                steps.push_back((
                    (*from).into(),
                    Animation::Move {
                        from: *from,
                        path: vec![*to],
                        unit,
                    },
                ));
            }
            ActionResponse::Heal { to, health, .. } => {
                steps.push_back(((*to).into(), Animation::Heal { health: *health }));
            }
            ActionResponse::Rescue { to, player, .. } => {
                steps.push_back(((*to).into(), Animation::Rescue { player: *player }));
            }
            ActionResponse::Sabotage { to, health, .. } => {
                steps.push_back(((*to).into(), Animation::Sabotage { health: *health }));
            }
            ActionResponse::Fold { from } => {
                steps.push_back(((*from).into(), Animation::Fold { unfolded: false }));
            }
            ActionResponse::Unfold { from } => {
                steps.push_back(((*from).into(), Animation::Fold { unfolded: true }));
            }
            ActionResponse::CompleteUnit { .. } => {}
            ActionResponse::ToggleBarrier { to, active, .. } => {
                steps.push_back(((*to).into(), Animation::Barrier { active: *active }));
            }
            ActionResponse::BuySkill { skill, player, .. } => {
                let banner = Banner::Skill {
                    player: *player,
                    skill: *skill,
                };
                steps.push_back((self.state.animations.synthetic_key(), Animation::Banner { banner }));
            }
            ActionResponse::EndTurn { next, round, .. } => {
                let banner = Banner::Turn {
                    player: *next,
                    round: *round,
                };
                steps.push_back((self.state.animations.synthetic_key(), Animation::Banner { banner }));
            }
            ActionResponse::Spawn { units } => {
                steps.extend(units.iter().map(|(vector, unit)| {
                    ((*vector).into(), Animation::Spawn { unit: unit.clone() })
                }));
            }
            ActionResponse::ReceiveReward { player, funds } => {
                let banner = Banner::Reward {
                    player: *player,
                    funds: *funds,
                };
                steps.push_back((self.state.animations.synthetic_key(), Animation::Banner { banner }));
            }
            ActionResponse::GameEnd { winner } => {
                let banner = Banner::GameOver { winner: *winner };
                steps.push_back((self.state.animations.synthetic_key(), Animation::Banner { banner }));
            }
            ActionResponse::HiddenMove {
                from, path, unit, ..
            } => match (from, unit, path.split_first()) {
                // Leaving the viewer's sight.
                (Some(from), _, Some(_)) => {
                    let unit = self.unit_at(*from)?.clone();
                    steps.push_back((
                        (*from).into(),
                        Animation::Move {
                            from: *from,
                            path: path.clone(),
                            unit,
                        },
                    ));
                }
                // Entering it at the first visible field.
                (None, Some(unit), Some((first, rest))) => {
                    steps.push_back((
                        (*first).into(),
                        Animation::Move {
                            from: *first,
                            path: rest.to_vec(),
                            unit: unit.clone(),
                        },
                    ));
                }
                _ => {}
            },
            ActionResponse::HiddenSourceAttackUnit { to, unit_b } => {
                let defender = self.unit_at(*to)?.kind;
                hit(&mut steps, *to, unit_b.as_ref().map(|unit| unit.health), Some(defender));
            }
            ActionResponse::HiddenSourceAttackBuilding { to, building } => {
                hit(
                    &mut steps,
                    *to,
                    building.as_ref().map(|building: &Building| building.health),
                    None,
                );
            }
            ActionResponse::HiddenTargetAttackUnit { from, unit_a }
            | ActionResponse::HiddenTargetAttackBuilding { from, unit_a } => {
                counter(&mut steps, map, *from, None, unit_a.as_ref());
            }
            // Units already standing in the fog just appear.
            ActionResponse::Reveal { .. } => {}
        }
        Ok(steps)
    }
}

/// Damage on `at`, followed by an explosion when nothing is left.
fn hit(steps: &mut Steps, at: Vector, health: Option<u8>, unit: Option<UnitKind>) {
    match health {
        Some(health) => steps.push_back((at.into(), Animation::Damage { health })),
        None => {
            steps.push_back((at.into(), Animation::Damage { health: 0 }));
            steps.push_back((at.into(), Animation::Explosion { unit }));
        }
    }
}

/// Damage the attacker on `from` took back, if any. `source` strikes first
/// when it is known.
fn counter(steps: &mut Steps, map: &MapData, from: Vector, source: Option<Vector>, after: Option<&Unit>) {
    let Some(before) = map.unit(from) else {
        return;
    };
    if after.map(|unit| unit.health) == Some(before.health) {
        return;
    }
    if let Some(source) = source {
        steps.push_back((source.into(), Animation::Attack { target: from }));
    }
    hit(steps, from, after.map(|unit| unit.health), Some(before.kind));
}
