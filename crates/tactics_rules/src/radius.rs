//! Radius and target queries.
//!
//! Movement uses Dijkstra over terrain costs, the grid equivalent of the
//! A* search used for open-world navigation. All results are returned as
//! ordered maps so that iteration is deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use serde::{Deserialize, Serialize};

use crate::entities::{BuildingKind, Unit, UnitKind, NEUTRAL};
use crate::map::MapData;
use crate::vector::Vector;

/// A field reachable or addressable from some origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RadiusItem {
    /// The addressed field.
    pub vector: Vector,
    /// Movement cost to reach it.
    pub cost: u32,
    /// Previous field on the cheapest path. For attack targets this is the
    /// field the attack is launched from.
    pub parent: Option<Vector>,
}

impl RadiusItem {
    /// An item without cost or parent.
    #[must_use]
    pub const fn new(vector: Vector) -> Self {
        Self {
            vector,
            cost: 0,
            parent: None,
        }
    }

    /// An item pointing at `parent`.
    #[must_use]
    pub const fn with_parent(vector: Vector, cost: u32, parent: Vector) -> Self {
        Self {
            vector,
            cost,
            parent: Some(parent),
        }
    }
}

/// Addressable fields keyed by position.
pub type Fields = BTreeMap<Vector, RadiusItem>;

/// Build a [`Fields`] map from plain vectors.
#[must_use]
pub fn to_fields(vectors: impl IntoIterator<Item = Vector>) -> Fields {
    vectors
        .into_iter()
        .map(|vector| (vector, RadiusItem::new(vector)))
        .collect()
}

/// How attackable fields are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackMode {
    /// Targets reachable by moving first and then attacking.
    Move,
    /// Targets in range of the current position only.
    Stationary,
    /// Every field the unit threatens, occupied or not. Used to show the
    /// defensive cover of units that cannot be controlled right now.
    Cover,
}

/// Actions a unit can take after it has moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitAction {
    /// Attack a unit or building in range.
    Attack,
    /// Capture the building the unit stands on.
    Capture,
    /// Heal an adjacent friendly unit.
    Heal,
    /// Rescue an adjacent neutral unit.
    Rescue,
    /// Sabotage an adjacent opponent.
    Sabotage,
    /// Load an adjacent friendly unit into this transporter.
    Load,
    /// Drop the carried unit at the given index.
    Drop(usize),
    /// Create a building on the current field.
    CreateBuilding,
    /// Pack up a long range unit so it can move again.
    Fold,
    /// Deploy a long range unit so it can attack.
    Unfold,
    /// End the unit's turn.
    Wait,
}

/// Movement cost for `unit` entering `vector`, `None` if it cannot.
fn entry_cost(map: &MapData, unit: &Unit, vector: Vector) -> Option<u32> {
    let cost = map.tile(vector)?.cost_for(unit.kind)?;
    match map.unit(vector) {
        Some(other) if map.is_opponent(unit.player, other.player) => None,
        _ => Some(cost),
    }
}

/// Whether a unit of `kind` can stand on `vector`.
fn is_passable(map: &MapData, kind: UnitKind, vector: Vector) -> bool {
    map.tile(vector)
        .and_then(|tile| tile.cost_for(kind))
        .is_some()
}

/// Fields `unit` can move through from `from`, including `from` itself.
///
/// Occupied friendly fields are part of the result because units can pass
/// through them; use [`can_stop_at`] to filter destinations.
#[must_use]
pub fn moveable(map: &MapData, unit: &Unit, from: Vector) -> Fields {
    let mut fields = Fields::new();
    if !unit.can_move() {
        return fields;
    }

    let radius = unit.info().radius;
    let mut best: BTreeMap<Vector, u32> = BTreeMap::new();
    let mut open = BinaryHeap::new();
    best.insert(from, 0);
    fields.insert(from, RadiusItem::new(from));
    open.push(Reverse((0u32, from)));

    while let Some(Reverse((cost, current))) = open.pop() {
        if best.get(&current).is_some_and(|known| *known < cost) {
            continue;
        }
        for next in current.adjacent() {
            let Some(step) = entry_cost(map, unit, next) else {
                continue;
            };
            let total = cost + step;
            if total > radius || best.get(&next).is_some_and(|known| *known <= total) {
                continue;
            }
            best.insert(next, total);
            fields.insert(next, RadiusItem::with_parent(next, total, current));
            open.push(Reverse((total, next)));
        }
    }
    fields
}

/// Whether `unit` coming from `from` may end its move on `vector`.
#[must_use]
pub fn can_stop_at(map: &MapData, unit: &Unit, from: Vector, vector: Vector) -> bool {
    vector == from
        || match map.unit(vector) {
            None => true,
            Some(other) => other.can_transport(unit),
        }
}

/// The path from the origin of `fields` to `to`, excluding the origin.
///
/// Returns `None` if `to` is not part of `fields`.
#[must_use]
pub fn movement_path(fields: &Fields, to: Vector) -> Option<Vec<Vector>> {
    let mut path = Vec::new();
    let mut current = fields.get(&to)?;
    while let Some(parent) = current.parent {
        path.push(current.vector);
        current = fields.get(&parent)?;
    }
    path.reverse();
    Some(path)
}

/// Whether `target` is within the attack range of a unit standing on `from`.
#[must_use]
pub fn in_range(unit: &Unit, from: Vector, target: Vector) -> bool {
    let info = unit.info();
    let distance = from.distance(target);
    info.max_range > 0 && distance >= info.min_range && distance <= info.max_range
}

/// What `unit` could attack on `target`: `(unit, building)`.
#[must_use]
pub fn attack_targets_at(map: &MapData, unit: &Unit, target: Vector) -> (bool, bool) {
    let attack_unit = map
        .unit(target)
        .is_some_and(|other| map.is_opponent(unit.player, other.player));
    let attack_building = map
        .building(target)
        .is_some_and(|building| map.is_opponent(unit.player, building.player));
    (attack_unit, attack_building)
}

fn has_attack_target(map: &MapData, unit: &Unit, target: Vector) -> bool {
    let (attack_unit, attack_building) = attack_targets_at(map, unit, target);
    attack_unit || attack_building
}

/// Occupied, attackable fields in range of `from`.
#[must_use]
pub fn attackable_entities_in_range(map: &MapData, unit: &Unit, from: Vector) -> Vec<Vector> {
    if !unit.can_attack() {
        return Vec::new();
    }
    let info = unit.info();
    let mut targets: Vec<Vector> = from
        .within(info.min_range, info.max_range)
        .into_iter()
        .filter(|target| map.contains(*target) && has_attack_target(map, unit, *target))
        .collect();
    targets.sort();
    targets
}

/// Attackable fields for `unit` on `from`.
///
/// Each item's `parent` is the field the attack is launched from. Targets
/// already in range of `from` always keep `from` as their origin so the
/// unit is never asked to move into a range it already covers. Otherwise
/// the furthest reachable field (highest movement cost) that can hit the
/// target wins, ties broken by the larger vector.
#[must_use]
pub fn attackable(map: &MapData, unit: &Unit, from: Vector, mode: AttackMode) -> Fields {
    let info = unit.info();
    if info.max_range == 0 {
        return Fields::new();
    }

    match mode {
        AttackMode::Stationary => attackable_entities_in_range(map, unit, from)
            .into_iter()
            .map(|target| (target, RadiusItem::with_parent(target, 0, from)))
            .collect(),
        AttackMode::Move => {
            if info.long_range || !unit.can_move() {
                return attackable(map, unit, from, AttackMode::Stationary);
            }
            let mut result: Fields = attackable(map, unit, from, AttackMode::Stationary);
            for item in moveable(map, unit, from).values() {
                if !can_stop_at(map, unit, from, item.vector)
                    || (item.vector != from && map.unit(item.vector).is_some())
                {
                    continue;
                }
                for target in item.vector.within(info.min_range, info.max_range) {
                    if !map.contains(target) || !has_attack_target(map, unit, target) {
                        continue;
                    }
                    let better = match result.get(&target) {
                        None => true,
                        Some(existing) if existing.parent == Some(from) => false,
                        Some(existing) => {
                            (item.cost, item.vector) > (existing.cost, existing.parent.unwrap_or(from))
                        }
                    };
                    if better {
                        result.insert(
                            target,
                            RadiusItem::with_parent(target, item.cost, item.vector),
                        );
                    }
                }
            }
            result
        }
        AttackMode::Cover => {
            let fresh = Unit {
                moved: false,
                completed: false,
                unfolded: false,
                ..unit.clone()
            };
            let origins: Vec<Vector> = if info.long_range {
                vec![from]
            } else {
                moveable(map, &fresh, from)
                    .values()
                    .filter(|item| {
                        item.vector == from
                            || (can_stop_at(map, &fresh, from, item.vector)
                                && map.unit(item.vector).is_none())
                    })
                    .map(|item| item.vector)
                    .collect()
            };
            let mut result = Fields::new();
            for origin in origins {
                for target in origin.within(info.min_range, info.max_range) {
                    if map.contains(target) && !result.contains_key(&target) {
                        result.insert(target, RadiusItem::with_parent(target, 0, origin));
                    }
                }
            }
            result
        }
    }
}

/// Adjacent friendly units the medic on `from` can heal.
#[must_use]
pub fn healable_vectors(map: &MapData, from: Vector) -> Vec<Vector> {
    let Some(unit) = map.unit(from).filter(|unit| unit.info().can_heal) else {
        return Vec::new();
    };
    from.adjacent()
        .into_iter()
        .filter(|vector| {
            map.unit(*vector).is_some_and(|other| {
                other.player == unit.player && other.health < crate::entities::MAX_HEALTH
            })
        })
        .collect()
}

/// Adjacent neutral units the unit on `from` can rescue.
#[must_use]
pub fn rescuable_vectors(map: &MapData, from: Vector) -> Vec<Vector> {
    let Some(_) = map.unit(from).filter(|unit| unit.info().can_rescue) else {
        return Vec::new();
    };
    from.adjacent()
        .into_iter()
        .filter(|vector| map.unit(*vector).is_some_and(|other| other.player == NEUTRAL))
        .collect()
}

/// Adjacent opponent units the unit on `from` can sabotage.
#[must_use]
pub fn sabotageable_vectors(map: &MapData, from: Vector) -> Vec<Vector> {
    let Some(unit) = map.unit(from).filter(|unit| unit.info().can_sabotage) else {
        return Vec::new();
    };
    from.adjacent()
        .into_iter()
        .filter(|vector| {
            map.unit(*vector)
                .is_some_and(|other| map.is_opponent(unit.player, other.player))
        })
        .collect()
}

/// Adjacent friendly units that can board the transporter on `from`.
#[must_use]
pub fn loadable_vectors(map: &MapData, from: Vector) -> Vec<Vector> {
    let Some(transporter) = map.unit(from).filter(|unit| unit.has_capacity()) else {
        return Vec::new();
    };
    from.adjacent()
        .into_iter()
        .filter(|vector| {
            map.unit(*vector)
                .is_some_and(|other| other.can_move() && transporter.can_transport(other))
        })
        .collect()
}

/// Unit kinds the building on `from` can produce this turn.
#[must_use]
pub fn buildable_units(map: &MapData, from: Vector) -> Vec<UnitKind> {
    match map.building(from) {
        Some(building) if !building.completed && map.is_current_player(building.player) => {
            building.info().buildable.to_vec()
        }
        _ => Vec::new(),
    }
}

/// Fields where a freshly built `kind` can be placed by the building on
/// `from`: the building itself when free, otherwise adjacent free fields.
#[must_use]
pub fn deployable_vectors(map: &MapData, kind: UnitKind, from: Vector) -> Vec<Vector> {
    if map.unit(from).is_none() && is_passable(map, kind, from) {
        return vec![from];
    }
    from.adjacent()
        .into_iter()
        .filter(|vector| map.unit(*vector).is_none() && is_passable(map, kind, *vector))
        .collect()
}

/// Free fields next to the transporter on `from` where the carried unit at
/// `index` can be dropped.
#[must_use]
pub fn drop_vectors(map: &MapData, from: Vector, index: usize) -> Vec<Vector> {
    let Some(carried) = map
        .unit(from)
        .and_then(|unit| unit.transports.get(index))
    else {
        return Vec::new();
    };
    from.adjacent()
        .into_iter()
        .filter(|vector| map.unit(*vector).is_none() && is_passable(map, carried.kind, *vector))
        .collect()
}

/// Barrier fields within range of the radar station on `from`.
#[must_use]
pub fn toggleable_barriers(map: &MapData, from: Vector) -> Vec<Vector> {
    let Some(building) = map.building(from) else {
        return Vec::new();
    };
    let range = building.info().radar_range;
    if range == 0 {
        return Vec::new();
    }
    let mut barriers: Vec<Vector> = from
        .within(1, range)
        .into_iter()
        .filter(|vector| {
            matches!(map.tile(*vector), Some(crate::entities::Tile::Barrier { .. }))
                && map.unit(*vector).is_none()
        })
        .collect();
    barriers.sort();
    barriers
}

/// Buildings the pioneer on `from` can raise right now.
#[must_use]
pub fn constructible_buildings(map: &MapData, from: Vector) -> Vec<BuildingKind> {
    let can_build = map
        .unit(from)
        .is_some_and(|unit| unit.info().can_build && !unit.completed);
    if !can_build || map.building(from).is_some() {
        return Vec::new();
    }
    BuildingKind::CONSTRUCTIBLE.to_vec()
}

/// Everything the unit on `from` can do after moving, `Wait` last.
#[must_use]
pub fn available_unit_actions(map: &MapData, from: Vector) -> Vec<UnitAction> {
    let Some(unit) = map.unit(from) else {
        return Vec::new();
    };
    if unit.completed {
        return Vec::new();
    }
    let info = unit.info();
    let mut actions = Vec::new();

    let can_fire = unit.can_attack() && !(info.long_range && unit.moved && !unit.unfolded);
    if can_fire && !attackable_entities_in_range(map, unit, from).is_empty() {
        actions.push(UnitAction::Attack);
    }
    if info.can_capture
        && map
            .building(from)
            .is_some_and(|building| building.player != unit.player)
    {
        actions.push(UnitAction::Capture);
    }
    if !healable_vectors(map, from).is_empty() {
        actions.push(UnitAction::Heal);
    }
    if !rescuable_vectors(map, from).is_empty() {
        actions.push(UnitAction::Rescue);
    }
    if !sabotageable_vectors(map, from).is_empty() {
        actions.push(UnitAction::Sabotage);
    }
    if !loadable_vectors(map, from).is_empty() {
        actions.push(UnitAction::Load);
    }
    for index in 0..unit.transports.len() {
        if !drop_vectors(map, from, index).is_empty() {
            actions.push(UnitAction::Drop(index));
        }
    }
    if !constructible_buildings(map, from).is_empty() {
        actions.push(UnitAction::CreateBuilding);
    }
    if info.long_range {
        actions.push(if unit.unfolded {
            UnitAction::Fold
        } else {
            UnitAction::Unfold
        });
    }
    actions.push(UnitAction::Wait);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Building, Player, Tile};

    fn map() -> MapData {
        MapData::new(8, 8, vec![Player::human(1), Player::human(2)])
    }

    #[test]
    fn test_moveable_respects_terrain_cost() {
        let map = map().with_tile(Vector::new(3, 2), Tile::Mountain);
        let unit = Unit::new(UnitKind::Infantry, 1);
        let fields = moveable(&map, &unit, Vector::new(2, 2));

        assert!(fields.contains_key(&Vector::new(2, 5)));
        assert!(!fields.contains_key(&Vector::new(2, 6)));
        assert_eq!(fields[&Vector::new(3, 2)].cost, 3);
        assert_eq!(fields[&Vector::new(2, 2)].parent, None);
    }

    #[test]
    fn test_moveable_blocked_by_opponents_not_friends() {
        let map = map()
            .with_unit(Vector::new(2, 3), Unit::new(UnitKind::Tank, 2))
            .with_unit(Vector::new(3, 2), Unit::new(UnitKind::Tank, 1));
        let unit = Unit::new(UnitKind::Infantry, 1);
        let fields = moveable(&map, &unit, Vector::new(2, 2));

        assert!(!fields.contains_key(&Vector::new(2, 3)));
        assert!(fields.contains_key(&Vector::new(3, 2)));
        assert!(!can_stop_at(&map, &unit, Vector::new(2, 2), Vector::new(3, 2)));
    }

    #[test]
    fn test_movement_path_follows_parents() {
        let map = map();
        let unit = Unit::new(UnitKind::Infantry, 1);
        let fields = moveable(&map, &unit, Vector::new(2, 2));
        let path = movement_path(&fields, Vector::new(2, 4)).unwrap();
        assert_eq!(path, vec![Vector::new(2, 3), Vector::new(2, 4)]);
        assert_eq!(movement_path(&fields, Vector::new(2, 2)), Some(vec![]));
        assert_eq!(movement_path(&fields, Vector::new(8, 8)), None);
    }

    #[test]
    fn test_attackable_prefers_current_position() {
        let map = map().with_unit(Vector::new(3, 2), Unit::new(UnitKind::Infantry, 2));
        let unit = Unit::new(UnitKind::Infantry, 1);
        let fields = attackable(&map, &unit, Vector::new(2, 2), AttackMode::Move);
        assert_eq!(fields[&Vector::new(3, 2)].parent, Some(Vector::new(2, 2)));
    }

    #[test]
    fn test_attackable_picks_furthest_origin() {
        let map = map().with_unit(Vector::new(4, 4), Unit::new(UnitKind::Infantry, 2));
        let unit = Unit::new(UnitKind::Infantry, 1);
        let fields = attackable(&map, &unit, Vector::new(2, 2), AttackMode::Move);
        let item = fields[&Vector::new(4, 4)];
        // (4, 3) and (3, 4) both cost 3; the larger vector wins.
        assert_eq!(item.parent, Some(Vector::new(4, 3)));
        assert_eq!(item.cost, 3);
    }

    #[test]
    fn test_long_range_units_do_not_move_and_attack() {
        let map = map().with_unit(Vector::new(2, 6), Unit::new(UnitKind::Tank, 2));
        let folded = Unit::new(UnitKind::Artillery, 1);
        assert!(attackable(&map, &folded, Vector::new(2, 2), AttackMode::Move).is_empty());

        let unfolded = Unit {
            unfolded: true,
            ..folded
        };
        let fields = attackable(&map, &unfolded, Vector::new(2, 2), AttackMode::Move);
        assert_eq!(fields.len(), 1);
        assert!(!attackable(&map, &unfolded, Vector::new(2, 2), AttackMode::Cover).is_empty());
    }

    #[test]
    fn test_available_actions_end_with_wait() {
        let map = map()
            .with_unit(Vector::new(2, 2), Unit::new(UnitKind::Infantry, 1).set_moved())
            .with_building(Vector::new(2, 2), Building::new(BuildingKind::House, 0))
            .with_unit(Vector::new(2, 3), Unit::new(UnitKind::Infantry, 2));
        let actions = available_unit_actions(&map, Vector::new(2, 2));
        assert_eq!(
            actions,
            vec![UnitAction::Attack, UnitAction::Capture, UnitAction::Wait]
        );
    }

    #[test]
    fn test_deployable_vectors_fall_back_to_neighbours() {
        let map = map()
            .with_building(Vector::new(1, 1), Building::new(BuildingKind::Factory, 1))
            .with_unit(Vector::new(1, 1), Unit::new(UnitKind::Tank, 1));
        let vectors = deployable_vectors(&map, UnitKind::Infantry, Vector::new(1, 1));
        assert_eq!(vectors, vec![Vector::new(2, 1), Vector::new(1, 2)]);
    }
}
