//! Loading an adjacent unit into the selected transporter.
//!
//! Loading is a move of the passenger onto the transporter's field.

use tactics_rules::prelude::{Action, Vector};
use tactics_rules::radius::loadable_vectors;

use super::{select_target, selected_unit, target_radius};
use crate::error::Result;
use crate::radius::RadiusType;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, _) = selected_unit(session)?;
    let vectors = loadable_vectors(&session.state.map, from);
    target_radius(session, from, vectors, RadiusType::Support)
}

pub(super) fn select(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    select_target(session, vector, |transporter, passenger| Action::Move {
        from: passenger,
        to: transporter,
        path: vec![transporter],
    })
}
