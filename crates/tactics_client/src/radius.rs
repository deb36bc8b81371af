//! Addressable fields of the active behavior.

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{Fields, Vector};
use tactics_rules::radius::to_fields;

/// What a radius is used for. Renderers pick colors by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadiusType {
    /// Movement range.
    Move,
    /// Attack targets.
    Attack,
    /// Friendly targets such as heal and load.
    Support,
    /// Opponent targets of non-attack actions such as sabotage.
    Hostile,
    /// Fields a unit can be placed on.
    Deploy,
    /// Barriers a radar station can toggle.
    Barrier,
}

/// Radius information of the active behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusInfo {
    /// Addressable fields.
    pub fields: Fields,
    /// Highlighted path through `fields`.
    pub path: Option<Vec<Vector>>,
    /// Radius type.
    pub kind: RadiusType,
    /// Frozen while a confirmation is pending.
    pub locked: bool,
    /// Rendered dimmed, e.g. for previews.
    pub dim: bool,
}

impl RadiusInfo {
    /// Radius over `fields`.
    #[must_use]
    pub const fn new(fields: Fields, kind: RadiusType) -> Self {
        Self {
            fields,
            path: None,
            kind,
            locked: false,
            dim: false,
        }
    }

    /// Radius over a plain list of vectors.
    #[must_use]
    pub fn from_vectors(vectors: impl IntoIterator<Item = Vector>, kind: RadiusType) -> Self {
        Self::new(to_fields(vectors), kind)
    }

    /// Whether `vector` is addressable.
    #[must_use]
    pub fn contains(&self, vector: Vector) -> bool {
        self.fields.contains_key(&vector)
    }

    /// Copy with a highlighted path.
    #[must_use]
    pub fn with_path(&self, path: Option<Vec<Vector>>) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    /// Copy with the lock flag set.
    #[must_use]
    pub fn with_locked(&self, locked: bool) -> Self {
        Self {
            locked,
            ..self.clone()
        }
    }
}
