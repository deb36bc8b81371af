//! Map editor state.

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{Building, BuildingKind, MapData, PlayerId, Tile, Unit, UnitKind, Vector};

/// Maximum number of undo snapshots kept.
pub const UNDO_LIMIT: usize = 64;

/// What the design behavior paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Brush {
    /// Replace the terrain.
    Tile(Tile),
    /// Place a unit.
    Unit(UnitKind, PlayerId),
    /// Place a building.
    Building(BuildingKind, PlayerId),
    /// Remove the unit, or the building if there is no unit.
    Erase,
}

impl Default for Brush {
    fn default() -> Self {
        Self::Tile(Tile::Plain)
    }
}

/// Apply `brush` to `vector`. Returns `None` when nothing changes.
#[must_use]
pub fn paint(map: &MapData, vector: Vector, brush: Brush) -> Option<MapData> {
    if !map.contains(vector) {
        return None;
    }
    let painted = match brush {
        Brush::Tile(tile) => map.with_tile(vector, tile),
        Brush::Unit(kind, player) => map.with_unit(vector, Unit::new(kind, player)),
        Brush::Building(kind, player) => map.with_building(vector, Building::new(kind, player)),
        Brush::Erase if map.unit(vector).is_some() => map.without_unit(vector),
        Brush::Erase => map.without_building(vector),
    };
    (painted != *map).then_some(painted)
}

/// Undo history and the entity picked by the entity behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    /// Field of the picked entity.
    pub selected: Option<Vector>,
    undo: Vec<MapData>,
}

impl EditorState {
    /// Fresh editor state with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with `previous` pushed onto the undo history.
    #[must_use]
    pub fn with_snapshot(&self, previous: MapData) -> Self {
        let mut undo = self.undo.clone();
        undo.push(previous);
        if undo.len() > UNDO_LIMIT {
            undo.remove(0);
        }
        Self {
            undo,
            selected: self.selected,
        }
    }

    /// Copy with a different picked entity.
    #[must_use]
    pub fn with_selected(&self, selected: Option<Vector>) -> Self {
        Self {
            selected,
            ..self.clone()
        }
    }

    /// Pop the latest snapshot.
    #[must_use]
    pub fn undo(&self) -> Option<(Self, MapData)> {
        let mut undo = self.undo.clone();
        let map = undo.pop()?;
        Some((
            Self {
                undo,
                selected: None,
            },
            map,
        ))
    }

    /// Number of undo steps available.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.undo.len()
    }
}
