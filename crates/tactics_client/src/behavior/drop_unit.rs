//! Unloading a carried unit next to the transporter.

use tactics_rules::prelude::{Action, Vector};
use tactics_rules::radius::drop_vectors;

use super::{flash_reset, select_target, selected_unit};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::radius::{RadiusInfo, RadiusType};
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session, index: usize) -> Result<Option<StateUpdate>> {
    let (from, _) = selected_unit(session)?;
    let vectors = drop_vectors(&session.state.map, from, index);
    if vectors.is_empty() {
        return flash_reset(session, from, FlashReason::NoSpace);
    }
    Ok(Some(StateUpdate::new().radius(Some(RadiusInfo::from_vectors(
        vectors,
        RadiusType::Deploy,
    )))))
}

pub(super) fn select(session: &mut Session, vector: Vector, index: usize) -> Result<Option<StateUpdate>> {
    select_target(session, vector, |from, to| Action::DropUnit { from, index, to })
}
