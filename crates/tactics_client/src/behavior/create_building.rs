//! Pioneer construction menu.

use tactics_rules::prelude::Action;
use tactics_rules::radius::constructible_buildings;

use super::{can_afford, flash_reset, perform, selected_unit, Menu, MenuChoice};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, _) = selected_unit(session)?;
    let kinds = constructible_buildings(&session.state.map, from);
    if kinds.is_empty() {
        return flash_reset(session, from, FlashReason::NoTargets);
    }
    let entries = kinds.into_iter().map(MenuChoice::Construct).collect();
    Ok(Some(StateUpdate::new().menu(Some(Menu::new(entries)))))
}

pub(super) fn choose(session: &mut Session, choice: MenuChoice) -> Result<Option<StateUpdate>> {
    let MenuChoice::Construct(kind) = choice else {
        return Ok(None);
    };
    let (from, unit) = selected_unit(session)?;
    if !can_afford(session, unit.player, kind.info().cost) {
        return flash_reset(session, from, FlashReason::InsufficientFunds);
    }
    perform(session, Action::CreateBuilding { from, kind }, None)
}
