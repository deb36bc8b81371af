//! Fog of war.
//!
//! A [`Vision`] answers which fields a viewer can see on a given map and
//! produces the viewer's variant of maps and action responses. Buildings
//! and terrain are always known; units outside of vision are not.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::action::ActionResponse;
use crate::entities::{PlayerId, Skill, Unit};
use crate::map::MapData;
use crate::vector::Vector;

/// Range in which owned buildings reveal units.
const BUILDING_VISION: u32 = 1;

/// The visibility rules for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vision {
    /// The viewing player. Spectators (`None`) see everything.
    pub viewer: Option<PlayerId>,
}

impl Vision {
    /// Vision for a player or spectator.
    #[must_use]
    pub const fn new(viewer: Option<PlayerId>) -> Self {
        Self { viewer }
    }

    /// Every field the viewer can see. `None` means everything is visible.
    #[must_use]
    pub fn visible_fields(&self, map: &MapData) -> Option<BTreeSet<Vector>> {
        let viewer = match self.viewer {
            Some(viewer) if map.fog => viewer,
            _ => return None,
        };
        let bonus = u32::from(
            map.player(viewer)
                .is_some_and(|player| player.has_skill(Skill::Recon)),
        );

        let mut fields = BTreeSet::new();
        for (vector, unit) in map.units.iter().filter(|(_, unit)| unit.player == viewer) {
            fields.insert(*vector);
            fields.extend(vector.within(1, unit.info().vision + bonus));
        }
        for (vector, _) in map
            .buildings
            .iter()
            .filter(|(_, building)| building.player == viewer)
        {
            fields.insert(*vector);
            fields.extend(vector.within(1, BUILDING_VISION));
        }
        fields.retain(|vector| map.contains(*vector));
        Some(fields)
    }

    /// Whether the viewer can see `vector` on `map`.
    #[must_use]
    pub fn is_visible(&self, map: &MapData, vector: Vector) -> bool {
        self.visible_fields(map)
            .map_or(true, |fields| fields.contains(&vector))
    }

    /// The map as the viewer sees it: opponent units outside of vision are
    /// removed.
    #[must_use]
    pub fn apply(&self, map: &MapData) -> MapData {
        let Some(fields) = self.visible_fields(map) else {
            return map.clone();
        };
        let viewer = self.viewer;
        let units = map
            .units
            .iter()
            .filter(|(vector, unit)| Some(unit.player) == viewer || fields.contains(vector))
            .map(|(vector, unit)| (*vector, unit.clone()))
            .collect();
        map.with_units(units)
    }

    /// Opponent units the viewer sees on `after` but could not see on
    /// `before`, as a [`ActionResponse::Reveal`].
    ///
    /// Dimmed responses only describe what was already in sight, so this
    /// follows every response that may have widened the viewer's vision.
    #[must_use]
    pub fn reveal(&self, before: &MapData, after: &MapData) -> Option<ActionResponse> {
        let seen = self.visible_fields(before)?;
        let now = self.visible_fields(after)?;
        let units: Vec<(Vector, Unit)> = after
            .units
            .iter()
            .filter(|(vector, unit)| {
                Some(unit.player) != self.viewer && now.contains(vector) && !seen.contains(vector)
            })
            .map(|(vector, unit)| (*vector, unit.clone()))
            .collect();
        (!units.is_empty()).then_some(ActionResponse::Reveal { units })
    }

    /// The viewer's variant of `response`, computed against the
    /// authoritative map *before* the response was applied.
    ///
    /// Returns `None` when the viewer observes nothing at all.
    #[must_use]
    pub fn dim_response(&self, before: &MapData, response: &ActionResponse) -> Option<ActionResponse> {
        let Some(fields) = self.visible_fields(before) else {
            return Some(response.clone());
        };
        let visible = |vector: &Vector| fields.contains(vector);

        match response {
            ActionResponse::Move { from, to, path } => {
                let from_visible = visible(from);
                let to_visible = visible(to);
                if from_visible && to_visible {
                    return Some(response.clone());
                }
                if from_visible {
                    let path = path.iter().copied().take_while(|vector| visible(vector)).collect();
                    return Some(ActionResponse::HiddenMove {
                        from: Some(*from),
                        to: None,
                        path,
                        unit: None,
                    });
                }
                if to_visible {
                    let mut path: Vec<Vector> = path
                        .iter()
                        .rev()
                        .copied()
                        .take_while(|vector| visible(vector))
                        .collect();
                    path.reverse();
                    let unit = before.unit(*from).map(|unit| unit.set_moved());
                    return Some(ActionResponse::HiddenMove {
                        from: None,
                        to: Some(*to),
                        path,
                        unit,
                    });
                }
                let path: Vec<Vector> = path.iter().copied().filter(|vector| visible(vector)).collect();
                (!path.is_empty()).then_some(ActionResponse::HiddenMove {
                    from: None,
                    to: None,
                    path,
                    unit: None,
                })
            }
            ActionResponse::AttackUnit {
                from,
                to,
                unit_a,
                unit_b,
            } => match (visible(from), visible(to)) {
                (true, true) => Some(response.clone()),
                (false, true) => Some(ActionResponse::HiddenSourceAttackUnit {
                    to: *to,
                    unit_b: unit_b.clone(),
                }),
                (true, false) => Some(ActionResponse::HiddenTargetAttackUnit {
                    from: *from,
                    unit_a: unit_a.clone(),
                }),
                (false, false) => None,
            },
            ActionResponse::AttackBuilding {
                from,
                to,
                unit_a,
                building,
            } => match (visible(from), visible(to)) {
                (true, true) => Some(response.clone()),
                (false, _) => Some(ActionResponse::HiddenSourceAttackBuilding {
                    to: *to,
                    building: building.clone(),
                }),
                (true, false) => Some(ActionResponse::HiddenTargetAttackBuilding {
                    from: *from,
                    unit_a: unit_a.clone(),
                }),
            },
            ActionResponse::Capture { .. }
            | ActionResponse::CreateBuilding { .. }
            | ActionResponse::ToggleBarrier { .. }
            | ActionResponse::BuySkill { .. }
            | ActionResponse::EndTurn { .. }
            | ActionResponse::ReceiveReward { .. }
            | ActionResponse::GameEnd { .. } => Some(response.clone()),
            ActionResponse::Spawn { units } => {
                let units: Vec<_> = units
                    .iter()
                    .filter(|(vector, _)| visible(vector))
                    .cloned()
                    .collect();
                (!units.is_empty()).then_some(ActionResponse::Spawn { units })
            }
            ActionResponse::HiddenMove { .. }
            | ActionResponse::HiddenSourceAttackUnit { .. }
            | ActionResponse::HiddenTargetAttackUnit { .. }
            | ActionResponse::HiddenSourceAttackBuilding { .. }
            | ActionResponse::HiddenTargetAttackBuilding { .. }
            | ActionResponse::Reveal { .. } => Some(response.clone()),
            _ => response
                .vectors()
                .iter()
                .all(visible)
                .then(|| response.clone()),
        }
    }
}
