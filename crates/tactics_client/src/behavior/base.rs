//! Idle mode.

use std::time::Duration;

use tactics_rules::prelude::{AttackMode, Unit, Vector};
use tactics_rules::radius::{attackable, buildable_units, moveable};

use super::Behavior;
use crate::error::Result;
use crate::radius::{RadiusInfo, RadiusType};
use crate::session::Session;
use crate::state::StateUpdate;

/// Hovering starts the tooltip timer, which chains the attack preview.
pub(super) fn enter(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    if let Some(timer) = session.state.timer {
        session.clear_timer(timer);
    }
    let generation = generation(session);
    let delay = Duration::from_millis(session.config.tooltip_delay_ms);
    let timer = session.schedule_timer(delay, move |session| show_tooltip(session, vector, generation));
    Ok(Some(
        StateUpdate::new()
            .position(Some(vector))
            .tooltip(None)
            .preview(None)
            .timer(Some(timer)),
    ))
}

pub(super) fn select(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    if session.state.selected_position == Some(vector) {
        return Ok(None);
    }
    let map = &session.state.map;

    if let Some(unit) = map.unit(vector) {
        if session.state.can_control(unit.player) && !unit.completed {
            let update = select_unit(vector, unit);
            if unit.can_move() {
                let fields = moveable(map, unit, vector);
                return Ok(Some(
                    update
                        .radius(Some(RadiusInfo::new(fields, RadiusType::Move)))
                        .behavior(Behavior::Move),
                ));
            }
            return Ok(Some(update.behavior(Behavior::Menu)));
        }
        if unit.info().max_range > 0 {
            let cover = attackable(map, unit, vector, AttackMode::Cover);
            return Ok(Some(
                StateUpdate::reset()
                    .selected_position(Some(vector))
                    .attackable(Some(cover)),
            ));
        }
        return Ok(None);
    }

    let Some(building) = map.building(vector) else {
        return Ok(None);
    };
    if !session.state.can_control(building.player) || building.completed {
        return Ok(None);
    }
    let info = building.info();
    let behavior = if !buildable_units(map, vector).is_empty() {
        Behavior::CreateUnit {
            unit_to_build: None,
        }
    } else if info.radar_range > 0 {
        Behavior::Radar
    } else if info.sells_skills {
        Behavior::BuySkills
    } else {
        return Ok(None);
    };
    Ok(Some(
        StateUpdate::reset()
            .selected_position(Some(vector))
            .selected_building(Some(building.clone()))
            .behavior(behavior),
    ))
}

fn select_unit(vector: Vector, unit: &Unit) -> StateUpdate {
    StateUpdate::reset()
        .selected_position(Some(vector))
        .selected_unit(Some(unit.clone()))
}

fn generation(session: &Session) -> Option<u64> {
    session.state.behavior.as_ref().map(|active| active.generation)
}

/// Timers outlive hovering when the cursor moves on without a new enter.
fn still_hovering(session: &Session, vector: Vector, generation: Option<u64>) -> bool {
    self::generation(session) == generation && session.state.position == Some(vector)
}

fn show_tooltip(session: &mut Session, vector: Vector, generation: Option<u64>) -> Result<()> {
    if !still_hovering(session, vector, generation) {
        return Ok(());
    }
    let shows_preview = session
        .state
        .map
        .unit(vector)
        .is_some_and(|unit| unit.info().max_range > 0);
    let timer = shows_preview.then(|| {
        let delay = Duration::from_millis(
            session
                .config
                .attack_preview_delay_ms
                .saturating_sub(session.config.tooltip_delay_ms),
        );
        session.schedule_timer(delay, move |session| show_preview(session, vector, generation))
    });
    session.update(StateUpdate::new().tooltip(Some(vector)).timer(timer))
}

fn show_preview(session: &mut Session, vector: Vector, generation: Option<u64>) -> Result<()> {
    if !still_hovering(session, vector, generation) {
        return Ok(());
    }
    let Some(unit) = session.state.map.unit(vector) else {
        return Ok(());
    };
    let fields = attackable(&session.state.map, unit, vector, AttackMode::Cover);
    session.update(StateUpdate::new().preview(Some(fields)).timer(None))
}
