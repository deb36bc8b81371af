//! Skill shop.

use tactics_rules::prelude::{Action, Skill};

use super::{can_afford, flash_reset, perform, selected_building, Menu, MenuChoice};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, player) = selected_building(session)?;
    let sells_skills = session
        .state
        .map
        .building(from)
        .is_some_and(|building| building.info().sells_skills);
    let owned = session.state.map.player(player).map(|player| &player.skills);
    let entries: Vec<MenuChoice> = Skill::ALL
        .into_iter()
        .filter(|skill| sells_skills && !owned.is_some_and(|owned| owned.contains(skill)))
        .map(MenuChoice::Skill)
        .collect();
    if entries.is_empty() {
        return flash_reset(session, from, FlashReason::NoTargets);
    }
    Ok(Some(StateUpdate::new().menu(Some(Menu::new(entries)))))
}

pub(super) fn choose(session: &mut Session, choice: MenuChoice) -> Result<Option<StateUpdate>> {
    let MenuChoice::Skill(skill) = choice else {
        return Ok(None);
    };
    let (from, player) = selected_building(session)?;
    if !can_afford(session, player, skill.cost()) {
        return flash_reset(session, from, FlashReason::InsufficientFunds);
    }
    perform(session, Action::BuySkill { from, skill }, None)
}
