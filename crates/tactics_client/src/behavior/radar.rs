//! Toggling barriers from a radar station.

use tactics_rules::prelude::{Action, Vector, BARRIER_TOGGLE_COST};
use tactics_rules::radius::toggleable_barriers;

use super::{can_afford, flash_reset, perform, selected_building, target_radius};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::radius::RadiusType;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, player) = selected_building(session)?;
    if !can_afford(session, player, BARRIER_TOGGLE_COST) {
        return flash_reset(session, from, FlashReason::InsufficientFunds);
    }
    let vectors = toggleable_barriers(&session.state.map, from);
    target_radius(session, from, vectors, RadiusType::Barrier)
}

pub(super) fn select(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    let in_radius = session
        .state
        .radius
        .as_ref()
        .is_some_and(|radius| radius.contains(vector));
    if !in_radius {
        return Ok(None);
    }
    let (from, _) = selected_building(session)?;
    perform(session, Action::ToggleBarrier { from, to: vector }, None)
}
