//! Attacking without moving.
//!
//! When a field holds both an attackable unit and an attackable building,
//! the behavior opens a picker instead of guessing.

use tactics_rules::prelude::{Action, AttackMode, Vector};
use tactics_rules::radius::{attack_targets_at, attackable};

use super::move_unit::confirm_gate;
use super::{flash_reset, perform, selected_unit, Menu, MenuChoice, TargetEntity};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::radius::{RadiusInfo, RadiusType};
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, unit) = selected_unit(session)?;
    let fields = attackable(&session.state.map, &unit, from, AttackMode::Stationary);
    if fields.is_empty() {
        return flash_reset(session, from, FlashReason::NoTargets);
    }
    Ok(Some(
        StateUpdate::new()
            .radius(Some(RadiusInfo::new(fields.clone(), RadiusType::Attack)))
            .attackable(Some(fields)),
    ))
}

pub(super) fn select(session: &mut Session, vector: Vector, confirm: bool) -> Result<Option<StateUpdate>> {
    if session.state.selected_attackable.is_some() {
        return Ok(Some(StateUpdate::new().selected_attackable(None).menu(None)));
    }
    let (from, unit) = selected_unit(session)?;
    let in_range = session
        .state
        .attackable
        .as_ref()
        .is_some_and(|fields| fields.contains_key(&vector));
    if vector == from || !in_range {
        return Ok(None);
    }
    let (unit_target, building_target) = attack_targets_at(&session.state.map, &unit, vector);
    if unit_target && building_target {
        return Ok(Some(picker(vector)));
    }
    if let Some(update) = confirm_gate(session, vector, Some(from), confirm) {
        return Ok(Some(update));
    }
    perform(session, action(unit_target, from, vector), None)
}

pub(super) fn choose(session: &mut Session, choice: MenuChoice) -> Result<Option<StateUpdate>> {
    let MenuChoice::Target(entity) = choice else {
        return Ok(None);
    };
    let Some(target) = session.state.selected_attackable else {
        return Ok(None);
    };
    let (from, _) = selected_unit(session)?;
    perform(session, action(entity == TargetEntity::Unit, from, target), None)
}

/// Open the unit-or-building picker for `target`.
pub(super) fn picker(target: Vector) -> StateUpdate {
    StateUpdate::new()
        .selected_attackable(Some(target))
        .menu(Some(Menu::new(vec![
            MenuChoice::Target(TargetEntity::Unit),
            MenuChoice::Target(TargetEntity::Building),
        ])))
}

pub(super) const fn action(unit: bool, from: Vector, to: Vector) -> Action {
    if unit {
        Action::AttackUnit { from, to }
    } else {
        Action::AttackBuilding { from, to }
    }
}
