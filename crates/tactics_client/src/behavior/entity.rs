//! Picking and relocating entities in the editor.
//!
//! The first select picks the unit or building on a field. Selecting the
//! picked field again drops the pick, selecting a free field moves the
//! entity there.

use tactics_rules::prelude::{MapData, Vector};

use crate::error::Result;
use crate::session::Session;
use crate::state::StateUpdate;

pub(super) fn select(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    let editor = session.state.editor.clone().unwrap_or_default();
    let map = &session.state.map;
    let update = StateUpdate::new().position(Some(vector));

    match editor.selected {
        Some(picked) if picked == vector => Ok(Some(update.editor(Some(editor.with_selected(None))))),
        Some(picked) => match relocate(map, picked, vector) {
            Some(moved) => Ok(Some(
                update
                    .editor(Some(editor.with_snapshot(map.clone()).with_selected(None)))
                    .map(moved),
            )),
            None => Ok(Some(update.editor(Some(editor.with_selected(None))))),
        },
        None if map.unit(vector).is_some() || map.building(vector).is_some() => {
            Ok(Some(update.editor(Some(editor.with_selected(Some(vector))))))
        }
        None => Ok(Some(update)),
    }
}

/// Move the unit on `from`, or the building if there is no unit, to `to`.
fn relocate(map: &MapData, from: Vector, to: Vector) -> Option<MapData> {
    if !map.contains(to) {
        return None;
    }
    if let Some(unit) = map.unit(from) {
        return map
            .unit(to)
            .is_none()
            .then(|| map.without_unit(from).with_unit(to, unit.clone()));
    }
    let building = map.building(from)?;
    map.building(to)
        .is_none()
        .then(|| map.without_building(from).with_building(to, building.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_rules::prelude::{Building, BuildingKind, Player, Unit, UnitKind};

    #[test]
    fn test_relocate_prefers_units() {
        let from = Vector::new(1, 1);
        let to = Vector::new(2, 2);
        let map = MapData::new(3, 3, vec![Player::human(1)])
            .with_unit(from, Unit::new(UnitKind::Infantry, 1))
            .with_building(from, Building::new(BuildingKind::House, 1));
        let moved = relocate(&map, from, to).unwrap();
        assert!(moved.unit(to).is_some());
        assert!(moved.building(from).is_some());
        assert!(relocate(&map, from, Vector::new(4, 4)).is_none());
    }
}
