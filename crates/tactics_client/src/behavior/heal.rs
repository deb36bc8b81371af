//! Picking a friendly unit to heal.

use tactics_rules::prelude::{Action, Vector, HEAL_COST};
use tactics_rules::radius::healable_vectors;

use super::{can_afford, flash_reset, select_target, selected_unit, target_radius};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::radius::RadiusType;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, unit) = selected_unit(session)?;
    if !can_afford(session, unit.player, HEAL_COST) {
        return flash_reset(session, from, FlashReason::InsufficientFunds);
    }
    let vectors = healable_vectors(&session.state.map, from);
    target_radius(session, from, vectors, RadiusType::Support)
}

pub(super) fn select(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    select_target(session, vector, |from, to| Action::Heal { from, to })
}
