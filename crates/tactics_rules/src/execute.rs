//! Action executor and response application.
//!
//! [`execute_action`] validates an [`Action`] against a map and returns the
//! authoritative [`ActionResponse`] together with the resulting map. The
//! resulting map is always produced by [`apply_action_response`], so a
//! response received from elsewhere converges to exactly the same snapshot
//! as a locally executed one.

use tracing::{debug, trace};

use crate::action::{Action, ActionResponse};
use crate::entities::{
    Building, PlayerId, Skill, Tile, Unit, BARRIER_TOGGLE_COST, HEAL_AMOUNT, HEAL_COST, MAX_HEALTH,
};
use crate::error::{Result, RulesError};
use crate::map::{MapData, Outcome};
use crate::radius::{
    buildable_units, can_stop_at, constructible_buildings, deployable_vectors, drop_vectors,
    healable_vectors, in_range, movement_path, moveable, rescuable_vectors, sabotageable_vectors,
    toggleable_barriers,
};
use crate::vector::Vector;
use crate::vision::Vision;

/// Damage reduction granted by the Fortify skill, in percent.
const FORTIFY_DEFENSE: u32 = 10;

/// Validate `action` against `map` and execute it.
///
/// # Errors
///
/// Returns a [`RulesError`] describing the first violated rule.
pub fn execute_action(map: &MapData, action: &Action) -> Result<(MapData, ActionResponse)> {
    if map.is_ended() {
        return Err(RulesError::GameEnded);
    }
    let response = validate(map, action)?;
    let next = apply_action_response(map, &response)?;
    debug!(action = action.kind(), response = response.kind(), "Executed action");
    Ok((next, response))
}

/// The unit on `at`, if the current player may still use it.
fn controlled_unit(map: &MapData, at: Vector) -> Result<&Unit> {
    let unit = map.unit(at).ok_or(RulesError::NoUnit(at))?;
    if !map.is_current_player(unit.player) {
        return Err(RulesError::NotControlled {
            vector: at,
            player: map.current_player,
        });
    }
    if unit.completed {
        return Err(RulesError::AlreadyActed(at));
    }
    Ok(unit)
}

/// The building on `at`, if the current player may still use it.
fn controlled_building(map: &MapData, at: Vector) -> Result<&Building> {
    let building = map.building(at).ok_or(RulesError::NoBuilding(at))?;
    if !map.is_current_player(building.player) {
        return Err(RulesError::NotControlled {
            vector: at,
            player: map.current_player,
        });
    }
    if building.completed {
        return Err(RulesError::AlreadyActed(at));
    }
    Ok(building)
}

fn require_funds(map: &MapData, player: PlayerId, required: u32) -> Result<()> {
    let available = map.require_player(player)?.funds;
    if available < required {
        return Err(RulesError::InsufficientFunds {
            required,
            available,
        });
    }
    Ok(())
}

fn require_capability(at: Vector, has: bool, capability: &'static str) -> Result<()> {
    if has {
        Ok(())
    } else {
        Err(RulesError::MissingCapability {
            vector: at,
            capability,
        })
    }
}

fn require_target(valid: bool, from: Vector, to: Vector) -> Result<()> {
    if valid {
        Ok(())
    } else {
        Err(RulesError::InvalidTarget { from, to })
    }
}

/// Damage dealt by `attacker` to whatever stands on `target`.
#[must_use]
pub fn calculate_damage(
    map: &MapData,
    attacker: &Unit,
    target: Vector,
    defender: PlayerId,
    building_defense: Option<u32>,
) -> u8 {
    let terrain = building_defense
        .or_else(|| map.tile(target).map(Tile::defense))
        .unwrap_or(0);
    let fortify = map
        .player(defender)
        .filter(|player| player.has_skill(Skill::Fortify))
        .map_or(0, |_| FORTIFY_DEFENSE);
    let reduction = 100u32.saturating_sub(terrain + fortify);
    let damage = attacker.info().damage * u32::from(attacker.health) / 100 * reduction / 100;
    u8::try_from(damage.max(1)).unwrap_or(u8::MAX)
}

/// Check a requested path and cut it short before hidden opponents.
///
/// The path was computed by a client that may not see every unit. It must
/// be connected, passable and affordable; walking stops on the field before
/// the first opponent and then backs off until the unit can stop.
fn walk_path(map: &MapData, unit: &Unit, from: Vector, path: &[Vector]) -> Result<Vec<Vector>> {
    let mut previous = from;
    let mut cost = 0;
    for vector in path {
        let step = map
            .tile(*vector)
            .and_then(|tile| tile.cost_for(unit.kind))
            .filter(|_| previous.is_adjacent(*vector))
            .ok_or(RulesError::InvalidTarget {
                from,
                to: *vector,
            })?;
        cost += step;
        previous = *vector;
    }
    if cost > unit.info().radius {
        return Err(RulesError::InvalidTarget { from, to: previous });
    }

    let mut walked: Vec<Vector> = path
        .iter()
        .copied()
        .take_while(|vector| {
            !map.unit(*vector)
                .is_some_and(|other| map.is_opponent(unit.player, other.player))
        })
        .collect();
    if walked.len() < path.len() {
        trace!(?from, stopped = walked.len(), "Move blocked by an opponent");
    }
    while let Some(last) = walked.last() {
        if can_stop_at(map, unit, from, *last) {
            break;
        }
        walked.pop();
    }
    Ok(walked)
}

fn validate(map: &MapData, action: &Action) -> Result<ActionResponse> {
    match action {
        Action::Move { from, to, path } => {
            let unit = controlled_unit(map, *from)?;
            if !unit.can_move() {
                return Err(RulesError::AlreadyActed(*from));
            }
            require_target(from != to && map.contains(*to), *from, *to)?;
            let path = if path.is_empty() {
                let fields = moveable(map, unit, *from);
                require_target(can_stop_at(map, unit, *from, *to), *from, *to)?;
                movement_path(&fields, *to).ok_or(RulesError::InvalidTarget {
                    from: *from,
                    to: *to,
                })?
            } else {
                require_target(path.last() == Some(to), *from, *to)?;
                walk_path(map, unit, *from, path)?
            };
            Ok(ActionResponse::Move {
                from: *from,
                to: path.last().copied().unwrap_or(*from),
                path,
            })
        }
        Action::AttackUnit { from, to } => {
            let attacker = controlled_unit(map, *from)?;
            require_capability(*from, attacker.can_attack(), "attack")?;
            let defender = map.unit(*to).ok_or(RulesError::NoUnit(*to))?;
            require_target(
                map.is_opponent(attacker.player, defender.player) && in_range(attacker, *from, *to),
                *from,
                *to,
            )?;

            let damage = calculate_damage(map, attacker, *to, defender.player, None);
            let defender_health = defender.health.saturating_sub(damage);
            let unit_b = (defender_health > 0).then(|| defender.with_health(defender_health));

            let mut attacker_health = attacker.health;
            if let Some(survivor) = &unit_b {
                if survivor.can_attack()
                    && !survivor.info().long_range
                    && in_range(survivor, *to, *from)
                {
                    let counter = calculate_damage(map, survivor, *from, attacker.player, None);
                    attacker_health = attacker_health.saturating_sub(counter);
                }
            }
            let unit_a = (attacker_health > 0).then(|| attacker.with_health(attacker_health).complete());
            Ok(ActionResponse::AttackUnit {
                from: *from,
                to: *to,
                unit_a,
                unit_b,
            })
        }
        Action::AttackBuilding { from, to } => {
            let attacker = controlled_unit(map, *from)?;
            require_capability(*from, attacker.can_attack(), "attack")?;
            let building = map.building(*to).ok_or(RulesError::NoBuilding(*to))?;
            require_target(
                map.is_opponent(attacker.player, building.player) && in_range(attacker, *from, *to),
                *from,
                *to,
            )?;
            let damage = calculate_damage(
                map,
                attacker,
                *to,
                building.player,
                Some(building.info().defense),
            );
            let health = building.health.saturating_sub(damage);
            Ok(ActionResponse::AttackBuilding {
                from: *from,
                to: *to,
                unit_a: Some(attacker.complete()),
                building: (health > 0).then(|| building.with_health(health)),
            })
        }
        Action::Capture { from } => {
            let unit = controlled_unit(map, *from)?;
            require_capability(*from, unit.info().can_capture, "capture")?;
            let building = map.building(*from).ok_or(RulesError::NoBuilding(*from))?;
            require_target(building.player != unit.player, *from, *from)?;
            Ok(ActionResponse::Capture {
                from: *from,
                building: building.with_player(unit.player).complete(),
            })
        }
        Action::CreateUnit { from, to, kind } => {
            let building = controlled_building(map, *from)?;
            require_target(buildable_units(map, *from).contains(kind), *from, *to)?;
            require_funds(map, building.player, kind.info().cost)?;
            require_target(deployable_vectors(map, *kind, *from).contains(to), *from, *to)?;
            Ok(ActionResponse::CreateUnit {
                from: *from,
                to: *to,
                unit: Unit::new(*kind, building.player).complete(),
            })
        }
        Action::CreateBuilding { from, kind } => {
            let unit = controlled_unit(map, *from)?;
            require_capability(*from, unit.info().can_build, "build")?;
            require_target(constructible_buildings(map, *from).contains(kind), *from, *from)?;
            require_funds(map, unit.player, kind.info().cost)?;
            Ok(ActionResponse::CreateBuilding {
                from: *from,
                building: Building::new(*kind, unit.player).complete(),
            })
        }
        Action::DropUnit { from, index, to } => {
            controlled_unit(map, *from)?;
            require_target(drop_vectors(map, *from, *index).contains(to), *from, *to)?;
            Ok(ActionResponse::DropUnit {
                from: *from,
                index: *index,
                to: *to,
            })
        }
        Action::Heal { from, to } => {
            let medic = controlled_unit(map, *from)?;
            require_target(healable_vectors(map, *from).contains(to), *from, *to)?;
            require_funds(map, medic.player, HEAL_COST)?;
            let full = map
                .player(medic.player)
                .is_some_and(|player| player.has_skill(Skill::FieldMedicine));
            let current = map.unit(*to).map_or(0, |unit| unit.health);
            let health = if full {
                MAX_HEALTH
            } else {
                current.saturating_add(HEAL_AMOUNT).min(MAX_HEALTH)
            };
            Ok(ActionResponse::Heal {
                from: *from,
                to: *to,
                health,
            })
        }
        Action::Rescue { from, to } => {
            let unit = controlled_unit(map, *from)?;
            require_target(rescuable_vectors(map, *from).contains(to), *from, *to)?;
            Ok(ActionResponse::Rescue {
                from: *from,
                to: *to,
                player: unit.player,
            })
        }
        Action::Sabotage { from, to } => {
            controlled_unit(map, *from)?;
            require_target(sabotageable_vectors(map, *from).contains(to), *from, *to)?;
            let health = map.unit(*to).map_or(1, |unit| (unit.health / 2).max(1));
            Ok(ActionResponse::Sabotage {
                from: *from,
                to: *to,
                health,
            })
        }
        Action::Fold { from } => {
            let unit = controlled_unit(map, *from)?;
            require_capability(*from, unit.info().long_range && unit.unfolded, "fold")?;
            Ok(ActionResponse::Fold { from: *from })
        }
        Action::Unfold { from } => {
            let unit = controlled_unit(map, *from)?;
            require_capability(*from, unit.info().long_range && !unit.unfolded, "unfold")?;
            Ok(ActionResponse::Unfold { from: *from })
        }
        Action::CompleteUnit { from } => {
            controlled_unit(map, *from)?;
            Ok(ActionResponse::CompleteUnit { from: *from })
        }
        Action::ToggleBarrier { from, to } => {
            let building = controlled_building(map, *from)?;
            require_target(toggleable_barriers(map, *from).contains(to), *from, *to)?;
            require_funds(map, building.player, BARRIER_TOGGLE_COST)?;
            let active = matches!(map.tile(*to), Some(Tile::Barrier { active: false }));
            Ok(ActionResponse::ToggleBarrier {
                from: *from,
                to: *to,
                active,
            })
        }
        Action::BuySkill { from, skill } => {
            let building = controlled_building(map, *from)?;
            if !building.info().sells_skills {
                return Err(RulesError::MissingCapability {
                    vector: *from,
                    capability: "sell skills",
                });
            }
            let player = map.require_player(building.player)?;
            require_target(!player.has_skill(*skill), *from, *from)?;
            require_funds(map, player.id, skill.cost())?;
            Ok(ActionResponse::BuySkill {
                from: *from,
                skill: *skill,
                player: player.id,
            })
        }
        Action::EndTurn => {
            let current = map.current_player;
            let next = map.next_player(current);
            let position = |id: PlayerId| map.players.iter().position(|player| player.id == id);
            let round = if position(next) <= position(current) {
                map.round + 1
            } else {
                map.round
            };
            let income: u32 = map
                .buildings
                .values()
                .filter(|building| building.player == next)
                .map(|building| building.info().income)
                .sum();
            let funds = map.require_player(next)?.funds + income;
            Ok(ActionResponse::EndTurn {
                current,
                next,
                round,
                funds,
            })
        }
    }
}

fn require_unit(map: &MapData, at: Vector) -> Result<&Unit> {
    map.unit(at).ok_or(RulesError::NoUnit(at))
}

fn spend(map: &MapData, player: PlayerId, amount: u32) -> Result<MapData> {
    let current = map.require_player(player)?;
    Ok(map.with_player(current.with_funds(current.funds.saturating_sub(amount))))
}

/// Apply an authoritative, non-hidden response to `map`.
///
/// # Errors
///
/// Returns [`RulesError::HiddenResponse`] for fog-of-war variants and
/// [`RulesError::NoUnit`]/[`RulesError::NoBuilding`] when the response
/// refers to entities that are missing from `map`.
pub fn apply_action_response(map: &MapData, response: &ActionResponse) -> Result<MapData> {
    match response {
        ActionResponse::Move { from, to, .. } => {
            let unit = require_unit(map, *from)?.set_moved();
            if from == to {
                return Ok(map.with_unit(*from, unit));
            }
            let map = map.without_unit(*from);
            Ok(match map.unit(*to) {
                Some(transporter) if transporter.can_transport(&unit) => {
                    let loaded = transporter.load(&unit);
                    map.with_unit(*to, loaded)
                }
                _ => map.with_unit(*to, unit),
            })
        }
        ActionResponse::AttackUnit {
            from,
            to,
            unit_a,
            unit_b,
        } => {
            let map = match unit_a {
                Some(unit) => map.with_unit(*from, unit.clone()),
                None => map.without_unit(*from),
            };
            Ok(match unit_b {
                Some(unit) => map.with_unit(*to, unit.clone()),
                None => map.without_unit(*to),
            })
        }
        ActionResponse::AttackBuilding {
            from,
            to,
            unit_a,
            building,
        } => {
            let map = match unit_a {
                Some(unit) => map.with_unit(*from, unit.clone()),
                None => map.without_unit(*from),
            };
            Ok(match building {
                Some(building) => map.with_building(*to, building.clone()),
                None => map.without_building(*to),
            })
        }
        ActionResponse::Capture { from, building } => {
            let map = map.with_building(*from, building.clone());
            Ok(match map.unit(*from) {
                Some(unit) => {
                    let unit = unit.complete();
                    map.with_unit(*from, unit)
                }
                None => map,
            })
        }
        ActionResponse::CreateUnit { from, to, unit } => {
            let building = map.building(*from).ok_or(RulesError::NoBuilding(*from))?;
            let map = map
                .with_building(*from, building.complete())
                .with_unit(*to, unit.clone());
            spend(&map, unit.player, unit.info().cost)
        }
        ActionResponse::CreateBuilding { from, building } => {
            let map = map.with_building(*from, building.clone());
            let map = match map.unit(*from) {
                Some(unit) => {
                    let unit = unit.complete();
                    map.with_unit(*from, unit)
                }
                None => map,
            };
            spend(&map, building.player, building.info().cost)
        }
        ActionResponse::DropUnit { from, index, to } => {
            let transporter = require_unit(map, *from)?;
            let carried = transporter
                .transports
                .get(*index)
                .ok_or(RulesError::InvalidTarget {
                    from: *from,
                    to: *to,
                })?;
            let dropped = carried.deploy();
            let emptied = transporter.unload(*index).set_moved();
            Ok(map.with_unit(*from, emptied).with_unit(*to, dropped))
        }
        ActionResponse::Heal { from, to, health } => {
            let medic = require_unit(map, *from)?;
            let patient = require_unit(map, *to)?.with_health(*health);
            let player = medic.player;
            let map = map
                .with_unit(*from, medic.complete())
                .with_unit(*to, patient);
            spend(&map, player, HEAL_COST)
        }
        ActionResponse::Rescue { from, to, player } => {
            let rescuer = require_unit(map, *from)?.complete();
            let rescued = require_unit(map, *to)?.with_player(*player).complete();
            Ok(map.with_unit(*from, rescuer).with_unit(*to, rescued))
        }
        ActionResponse::Sabotage { from, to, health } => {
            let saboteur = require_unit(map, *from)?.complete();
            let victim = require_unit(map, *to)?.with_health(*health);
            Ok(map.with_unit(*from, saboteur).with_unit(*to, victim))
        }
        ActionResponse::Fold { from } => {
            let unit = require_unit(map, *from)?;
            let folded = Unit {
                unfolded: false,
                ..unit.complete()
            };
            Ok(map.with_unit(*from, folded))
        }
        ActionResponse::Unfold { from } => {
            let unit = require_unit(map, *from)?;
            let unfolded = Unit {
                unfolded: true,
                ..unit.complete()
            };
            Ok(map.with_unit(*from, unfolded))
        }
        ActionResponse::CompleteUnit { from } => {
            let unit = require_unit(map, *from)?.complete();
            Ok(map.with_unit(*from, unit))
        }
        ActionResponse::ToggleBarrier { from, to, active } => {
            let building = map.building(*from).ok_or(RulesError::NoBuilding(*from))?;
            let player = building.player;
            let map = map
                .with_building(*from, building.complete())
                .with_tile(*to, Tile::Barrier { active: *active });
            spend(&map, player, BARRIER_TOGGLE_COST)
        }
        ActionResponse::BuySkill {
            from,
            skill,
            player,
        } => {
            let mut buyer = map.require_player(*player)?.clone();
            buyer.skills.insert(*skill);
            buyer.funds = buyer.funds.saturating_sub(skill.cost());
            let map = map.with_player(buyer);
            Ok(match map.building(*from) {
                Some(building) => {
                    let building = building.complete();
                    map.with_building(*from, building)
                }
                None => map,
            })
        }
        ActionResponse::EndTurn {
            next, round, funds, ..
        } => {
            let units = map
                .units
                .iter()
                .map(|(vector, unit)| {
                    let unit = if unit.player == *next {
                        unit.recover()
                    } else {
                        unit.clone()
                    };
                    (*vector, unit)
                })
                .collect();
            let mut map = map.with_units(units);
            map.buildings = map
                .buildings
                .iter()
                .map(|(vector, building)| {
                    let building = if building.player == *next {
                        building.recover()
                    } else {
                        building.clone()
                    };
                    (*vector, building)
                })
                .collect();
            map.current_player = *next;
            map.round = *round;
            let player = map.require_player(*next)?.with_funds(*funds);
            Ok(map.with_player(player))
        }
        ActionResponse::Spawn { units } => Ok(units
            .iter()
            .fold(map.clone(), |map, (vector, unit)| map.with_unit(*vector, unit.clone()))),
        ActionResponse::ReceiveReward { player, funds } => {
            let receiver = map.require_player(*player)?;
            let receiver = receiver.with_funds(receiver.funds + funds);
            Ok(map.with_player(receiver))
        }
        ActionResponse::GameEnd { winner } => {
            let mut map = map.clone();
            map.outcome = Some(winner.map_or(Outcome::Draw, Outcome::Winner));
            Ok(map)
        }
        ActionResponse::HiddenMove { .. }
        | ActionResponse::HiddenSourceAttackUnit { .. }
        | ActionResponse::HiddenTargetAttackUnit { .. }
        | ActionResponse::HiddenSourceAttackBuilding { .. }
        | ActionResponse::HiddenTargetAttackBuilding { .. }
        | ActionResponse::Reveal { .. } => Err(RulesError::HiddenResponse),
    }
}

/// Apply any response, hidden or not, to the map a viewer sees.
///
/// Hidden variants only touch the entities they describe. The result is
/// always filtered through `vision`, so units that left the viewer's sight
/// disappear from the snapshot. Units that came into sight arrive as a
/// separate [`ActionResponse::Reveal`].
///
/// # Errors
///
/// Propagates errors from [`apply_action_response`] for non-hidden variants.
pub fn apply_hidden_action_response(
    map: &MapData,
    vision: &Vision,
    response: &ActionResponse,
) -> Result<MapData> {
    let next = match response {
        ActionResponse::HiddenMove { from, to, unit, .. } => {
            let map = match from {
                Some(from) => map.without_unit(*from),
                None => map.clone(),
            };
            match (to, unit) {
                (Some(to), Some(unit)) => map.with_unit(*to, unit.clone()),
                _ => map,
            }
        }
        ActionResponse::HiddenSourceAttackUnit { to, unit_b } => match unit_b {
            Some(unit) => map.with_unit(*to, unit.clone()),
            None => map.without_unit(*to),
        },
        ActionResponse::HiddenTargetAttackUnit { from, unit_a }
        | ActionResponse::HiddenTargetAttackBuilding { from, unit_a } => match unit_a {
            Some(unit) => map.with_unit(*from, unit.clone()),
            None => map.without_unit(*from),
        },
        ActionResponse::HiddenSourceAttackBuilding { to, building } => match building {
            Some(building) => map.with_building(*to, building.clone()),
            None => map.without_building(*to),
        },
        ActionResponse::Reveal { units } => units
            .iter()
            .fold(map.clone(), |map, (vector, unit)| map.with_unit(*vector, unit.clone())),
        _ => apply_action_response(map, response)?,
    };
    Ok(vision.apply(&next))
}

/// A [`ActionResponse::GameEnd`] if at most one player still owns units or
/// buildings.
#[must_use]
pub fn check_game_over(map: &MapData) -> Option<ActionResponse> {
    if map.is_ended() {
        return None;
    }
    let alive: Vec<PlayerId> = map
        .players
        .iter()
        .map(|player| player.id)
        .filter(|id| {
            map.units.values().any(|unit| unit.player == *id)
                || map.buildings.values().any(|building| building.player == *id)
        })
        .collect();
    match alive.as_slice() {
        [] => Some(ActionResponse::GameEnd { winner: None }),
        [winner] => Some(ActionResponse::GameEnd {
            winner: Some(*winner),
        }),
        _ => None,
    }
}
