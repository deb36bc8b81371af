//! Unit action menu.

use tactics_rules::prelude::{Action, UnitAction};
use tactics_rules::radius::available_unit_actions;

use super::{flash_reset, perform, selected_unit, Behavior, Menu, MenuChoice};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, _) = selected_unit(session)?;
    let actions = available_unit_actions(&session.state.map, from);
    if actions.is_empty() {
        return flash_reset(session, from, FlashReason::NoTargets);
    }
    let entries = actions.into_iter().map(MenuChoice::Unit).collect();
    Ok(Some(StateUpdate::new().menu(Some(Menu::new(entries)))))
}

pub(super) fn choose(session: &mut Session, choice: MenuChoice) -> Result<Option<StateUpdate>> {
    let MenuChoice::Unit(action) = choice else {
        return Ok(None);
    };
    let offered = session
        .state
        .menu
        .as_ref()
        .is_some_and(|menu| menu.entries.contains(&choice));
    if !offered {
        return Ok(None);
    }
    let (from, _) = selected_unit(session)?;
    let next = match action {
        UnitAction::Attack => Behavior::Attack,
        UnitAction::Heal => Behavior::Heal,
        UnitAction::Rescue => Behavior::Rescue,
        UnitAction::Sabotage => Behavior::Sabotage,
        UnitAction::Load => Behavior::Transport,
        UnitAction::Drop(index) => Behavior::DropUnit { index },
        UnitAction::CreateBuilding => Behavior::CreateBuilding,
        UnitAction::Capture => return perform(session, Action::Capture { from }, None),
        UnitAction::Fold => return perform(session, Action::Fold { from }, None),
        UnitAction::Unfold => return perform(session, Action::Unfold { from }, None),
        UnitAction::Wait => return perform(session, Action::CompleteUnit { from }, None),
    };
    Ok(Some(StateUpdate::new().behavior(next)))
}
