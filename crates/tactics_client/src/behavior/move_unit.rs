//! Moving a selected unit, optionally followed by an attack.

use tactics_rules::prelude::{Action, AttackMode, Unit, Vector};
use tactics_rules::radius::{
    attack_targets_at, attackable, can_stop_at, in_range, movement_path,
};

use super::{attack, perform, run, selected_unit, Behavior};
use crate::error::{ClientError, Result};
use crate::radius::RadiusInfo;
use crate::session::Session;
use crate::state::{ConfirmAction, StateUpdate};

pub(super) fn activate(session: &mut Session) -> Result<Option<StateUpdate>> {
    let (from, unit) = selected_unit(session)?;
    let fields = attackable(&session.state.map, &unit, from, AttackMode::Move);
    Ok(Some(StateUpdate::new().attackable(Some(fields))))
}

/// Preview the path to the hovered field. For attack targets the path ends
/// on the field the attack is launched from.
pub(super) fn enter(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    let update = StateUpdate::new().position(Some(vector));
    let Some(radius) = session.state.radius.as_ref() else {
        return Ok(Some(update));
    };
    if radius.locked {
        return Ok(Some(update));
    }
    let destination = session
        .state
        .attackable
        .as_ref()
        .and_then(|fields| fields.get(&vector))
        .and_then(|item| item.parent)
        .unwrap_or(vector);
    let path = movement_path(&radius.fields, destination);
    Ok(Some(update.radius(Some(radius.with_path(path)))))
}

pub(super) fn select(
    session: &mut Session,
    vector: Vector,
    sub_vector: Option<Vector>,
    confirm: bool,
) -> Result<Option<StateUpdate>> {
    let (from, unit) = selected_unit(session)?;
    if vector == from {
        return Ok(None);
    }
    let Some(radius) = session.state.radius.clone() else {
        return Ok(None);
    };

    let target = session
        .state
        .attackable
        .as_ref()
        .and_then(|fields| fields.get(&vector))
        .copied();
    if let Some(item) = target {
        let pending = session
            .state
            .confirm_action
            .filter(|pending| pending.to == vector)
            .and_then(|pending| pending.origin);
        let origin = pending.unwrap_or_else(|| {
            sub_vector
                .filter(|sub| is_valid_origin(session, &unit, &radius, from, *sub, vector))
                .or(item.parent)
                .unwrap_or(from)
        });
        if let Some(update) = confirm_gate(session, vector, Some(origin), confirm) {
            return Ok(Some(update));
        }
        return attack_from(session, from, origin, vector, &radius);
    }

    if !radius.contains(vector) || !can_stop_at(&session.state.map, &unit, from, vector) {
        return Ok(None);
    }
    if let Some(update) = confirm_gate(session, vector, None, confirm) {
        return Ok(Some(update));
    }
    let path = movement_path(&radius.fields, vector).unwrap_or_default();
    let moved = unit.set_moved();
    perform(
        session,
        Action::Move {
            from,
            to: vector,
            path,
        },
        Some(Box::new(move |session| after_move(session, vector, &moved))),
    )
}

/// Two-step confirmation. Returns an update when the gesture stops here:
/// the first select locks the radius, a select elsewhere unlocks it.
pub(super) fn confirm_gate(
    session: &Session,
    vector: Vector,
    origin: Option<Vector>,
    confirm: bool,
) -> Option<StateUpdate> {
    if !confirm {
        return None;
    }
    let radius = session.state.radius.as_ref();
    match session.state.confirm_action {
        Some(pending) if pending.to == vector => None,
        Some(_) => Some(
            StateUpdate::new()
                .confirm_action(None)
                .radius(radius.map(|radius| radius.with_locked(false))),
        ),
        None => Some(
            StateUpdate::new()
                .confirm_action(Some(ConfirmAction { to: vector, origin }))
                .radius(radius.map(|radius| radius.with_locked(true))),
        ),
    }
}

fn is_valid_origin(
    session: &Session,
    unit: &Unit,
    radius: &RadiusInfo,
    from: Vector,
    origin: Vector,
    target: Vector,
) -> bool {
    if !in_range(unit, origin, target) {
        return false;
    }
    origin == from
        || (!unit.info().long_range
            && radius.contains(origin)
            && session.state.map.unit(origin).is_none())
}

fn attack_from(
    session: &mut Session,
    from: Vector,
    origin: Vector,
    target: Vector,
    radius: &RadiusInfo,
) -> Result<Option<StateUpdate>> {
    let (_, unit) = selected_unit(session)?;
    let (unit_target, building_target) = attack_targets_at(&session.state.map, &unit, target);
    let path = (origin != from).then(|| movement_path(&radius.fields, origin).unwrap_or_default());

    if unit_target && building_target {
        let Some(path) = path else {
            return Ok(Some(attack::picker(target).behavior(Behavior::Attack)));
        };
        let then = move |session: &mut Session| {
            let unit = session
                .state
                .map
                .unit(origin)
                .cloned()
                .ok_or_else(|| ClientError::missing_unit(origin))?;
            session.update(
                attack::picker(target)
                    .selected_position(Some(origin))
                    .selected_unit(Some(unit))
                    .behavior(Behavior::Attack),
            )
        };
        return perform(
            session,
            Action::Move {
                from,
                to: origin,
                path,
            },
            Some(Box::new(then)),
        );
    }

    let action = attack::action(unit_target, origin, target);
    match path {
        None => perform(session, action, None),
        Some(path) => perform(
            session,
            Action::Move {
                from,
                to: origin,
                path,
            },
            Some(Box::new(move |session| run(session, action, None))),
        ),
    }
}

/// Open the action menu if the unit is still on its own after moving.
/// Units that boarded a transporter are done.
fn after_move(session: &mut Session, to: Vector, moved: &Unit) -> Result<()> {
    if session.state.map.unit(to) == Some(moved) {
        return session.update(
            StateUpdate::reset()
                .selected_position(Some(to))
                .selected_unit(Some(moved.clone()))
                .behavior(Behavior::Menu),
        );
    }
    session.reset_behavior()
}
