//! Test fixtures and helpers.
//!
//! Pre-built maps and action scripts for consistent testing.

use tactics_rules::prelude::{
    apply_action_response, check_game_over, execute_action, Action, ActionResponse, Building,
    BuildingKind, MapData, Player, Result, Unit, UnitKind, Vector,
};

/// Shorthand for [`Vector::new`].
#[must_use]
pub const fn v(x: i32, y: i32) -> Vector {
    Vector::new(x, y)
}

/// Two human players. Player 1 starts with `funds`.
#[must_use]
pub fn humans(funds: u32) -> Vec<Player> {
    vec![Player::human(1).with_funds(funds), Player::human(2)]
}

/// An empty plains map for two human players.
#[must_use]
pub fn empty_map(width: i32, height: i32) -> MapData {
    MapData::new(width, height, humans(0))
}

/// An empty map with the given units.
#[must_use]
pub fn map_with_units(width: i32, height: i32, units: &[(Vector, Unit)]) -> MapData {
    units
        .iter()
        .fold(empty_map(width, height), |map, (vector, unit)| {
            map.with_unit(*vector, unit.clone())
        })
}

/// A small battle between a human and a bot.
///
/// ```text
///   1 2 3 4 5 6
/// 1 H . . . . .      H  headquarters
/// 2 . i . . . .      i  infantry, T tank (player 1)
/// 3 . . T . . .      e  infantry (player 2)
/// 4 . . . . . .      F  factory (player 1)
/// 5 . . e . e .
/// 6 F . . . . H
/// ```
#[must_use]
pub fn skirmish_map() -> MapData {
    MapData::new(6, 6, vec![Player::human(1).with_funds(1000), Player::bot(2)])
        .with_building(v(1, 1), Building::new(BuildingKind::HQ, 1))
        .with_building(v(1, 6), Building::new(BuildingKind::Factory, 1))
        .with_building(v(6, 6), Building::new(BuildingKind::HQ, 2))
        .with_unit(v(2, 2), Unit::new(UnitKind::Infantry, 1))
        .with_unit(v(3, 3), Unit::new(UnitKind::Tank, 1))
        .with_unit(v(3, 5), Unit::new(UnitKind::Infantry, 2))
        .with_unit(v(5, 5), Unit::new(UnitKind::Infantry, 2))
}

/// One round of play on [`skirmish_map`]: the human advances and
/// attacks, the bot answers.
#[must_use]
pub fn skirmish_script() -> Vec<Action> {
    vec![
        Action::Move {
            from: v(3, 3),
            to: v(3, 4),
            path: vec![v(3, 4)],
        },
        Action::AttackUnit {
            from: v(3, 4),
            to: v(3, 5),
        },
        Action::Move {
            from: v(2, 2),
            to: v(2, 4),
            path: vec![v(2, 3), v(2, 4)],
        },
        Action::CompleteUnit { from: v(2, 4) },
        Action::EndTurn,
        Action::Move {
            from: v(5, 5),
            to: v(4, 4),
            path: vec![v(5, 4), v(4, 4)],
        },
        Action::AttackUnit {
            from: v(4, 4),
            to: v(3, 4),
        },
        Action::EndTurn,
    ]
}

/// A map with fog of war where player 1 sees only the west.
///
/// Player 1's infantry stands on (1, 1) and sees two fields far. Player 2's
/// infantry waits hidden on (6, 1).
#[must_use]
pub fn fog_map() -> MapData {
    MapData::new(8, 3, humans(0))
        .with_fog(true)
        .with_unit(v(1, 1), Unit::new(UnitKind::Infantry, 1))
        .with_unit(v(6, 1), Unit::new(UnitKind::Infantry, 2))
}

/// Execute `actions` on `map` the way a server would and collect every
/// response, including the game end once it happens.
///
/// # Errors
///
/// Returns the first rule violation.
pub fn record_responses(
    map: &MapData,
    actions: &[Action],
) -> Result<(MapData, Vec<ActionResponse>)> {
    let mut map = map.clone();
    let mut responses = Vec::with_capacity(actions.len());
    for action in actions {
        let (next, response) = execute_action(&map, action)?;
        map = next;
        responses.push(response);
        if let Some(end) = check_game_over(&map) {
            map = apply_action_response(&map, &end)?;
            responses.push(end);
            break;
        }
    }
    Ok((map, responses))
}
