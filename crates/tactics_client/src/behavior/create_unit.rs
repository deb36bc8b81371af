//! Building production.
//!
//! Without a chosen unit kind the behavior is a menu. Once a kind is chosen
//! and more than one field is free, it becomes a deploy radius.

use tactics_rules::prelude::{Action, UnitKind, Vector};
use tactics_rules::radius::{buildable_units, deployable_vectors};

use super::{can_afford, flash_reset, perform, selected_building, Behavior, Menu, MenuChoice};
use crate::animation::FlashReason;
use crate::error::Result;
use crate::radius::{RadiusInfo, RadiusType};
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn activate(session: &mut Session, unit_to_build: Option<UnitKind>) -> Result<Option<StateUpdate>> {
    let (from, _) = selected_building(session)?;
    let map = &session.state.map;
    if let Some(kind) = unit_to_build {
        let vectors = deployable_vectors(map, kind, from);
        if vectors.is_empty() {
            return flash_reset(session, from, FlashReason::NoSpace);
        }
        return Ok(Some(StateUpdate::new().radius(Some(RadiusInfo::from_vectors(
            vectors,
            RadiusType::Deploy,
        )))));
    }

    let kinds = buildable_units(map, from);
    if kinds.is_empty() {
        return flash_reset(session, from, FlashReason::NoTargets);
    }
    let sells_skills = map
        .building(from)
        .is_some_and(|building| building.info().sells_skills);
    let mut entries: Vec<MenuChoice> = kinds.into_iter().map(MenuChoice::Build).collect();
    if sells_skills {
        entries.push(MenuChoice::Skills);
    }
    Ok(Some(StateUpdate::new().menu(Some(Menu::new(entries)))))
}

pub(super) fn select(
    session: &mut Session,
    vector: Vector,
    unit_to_build: Option<UnitKind>,
) -> Result<Option<StateUpdate>> {
    let Some(kind) = unit_to_build else {
        return Ok(None);
    };
    let in_radius = session
        .state
        .radius
        .as_ref()
        .is_some_and(|radius| radius.contains(vector));
    if !in_radius {
        return Ok(None);
    }
    let (from, _) = selected_building(session)?;
    perform(
        session,
        Action::CreateUnit {
            from,
            to: vector,
            kind,
        },
        None,
    )
}

pub(super) fn choose(session: &mut Session, choice: MenuChoice) -> Result<Option<StateUpdate>> {
    let (from, player) = selected_building(session)?;
    let kind = match choice {
        MenuChoice::Build(kind) => kind,
        MenuChoice::Skills => return Ok(Some(StateUpdate::new().behavior(Behavior::BuySkills))),
        _ => return Ok(None),
    };
    if !can_afford(session, player, kind.info().cost) {
        return flash_reset(session, from, FlashReason::InsufficientFunds);
    }
    match deployable_vectors(&session.state.map, kind, from).as_slice() {
        [] => flash_reset(session, from, FlashReason::NoSpace),
        [to] => {
            let to = *to;
            perform(session, Action::CreateUnit { from, to, kind }, None)
        }
        _ => Ok(Some(StateUpdate::new().behavior(Behavior::CreateUnit {
            unit_to_build: Some(kind),
        }))),
    }
}
