//! Immutable map snapshot.
//!
//! [`MapData`] is never mutated after construction by rule code. Every
//! change goes through a `with_*`/`without_*` method that returns a new
//! snapshot, which lets the client keep the previous map around for
//! reconciliation and animation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Building, Player, PlayerId, Tile, Unit, NEUTRAL};
use crate::error::{Result, RulesError};
use crate::vector::{vector_map_serde, Vector};

/// A complete, immutable game map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapData {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// Terrain in row-major order.
    tiles: Vec<Tile>,
    /// Units by position.
    #[serde(with = "vector_map_serde")]
    pub units: BTreeMap<Vector, Unit>,
    /// Buildings by position.
    #[serde(with = "vector_map_serde")]
    pub buildings: BTreeMap<Vector, Building>,
    /// Participants in turn order.
    pub players: Vec<Player>,
    /// The player whose turn it is.
    pub current_player: PlayerId,
    /// Current round, starting at 1.
    pub round: u32,
    /// Whether fog of war is enabled.
    pub fog: bool,
    /// Set once the game is over.
    pub outcome: Option<Outcome>,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A single player won.
    Winner(PlayerId),
    /// Nobody won.
    Draw,
}

impl MapData {
    /// Create a map filled with plains.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32, players: Vec<Player>) -> Self {
        assert!(width > 0, "Map width must be positive");
        assert!(height > 0, "Map height must be positive");

        let current_player = players.first().map_or(NEUTRAL, |player| player.id);
        Self {
            width,
            height,
            tiles: vec![Tile::Plain; (width * height) as usize],
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            players,
            current_player,
            round: 1,
            fog: false,
            outcome: None,
        }
    }

    /// Row-major index of a vector.
    fn index(&self, vector: Vector) -> usize {
        ((vector.y - 1) * self.width + (vector.x - 1)) as usize
    }

    /// Whether the vector lies on the map.
    #[must_use]
    pub const fn contains(&self, vector: Vector) -> bool {
        vector.x >= 1 && vector.y >= 1 && vector.x <= self.width && vector.y <= self.height
    }

    /// Terrain at `vector`, `None` when outside of the map.
    #[must_use]
    pub fn tile(&self, vector: Vector) -> Option<Tile> {
        self.contains(vector).then(|| self.tiles[self.index(vector)])
    }

    /// All vectors in row-major order.
    pub fn vectors(&self) -> impl Iterator<Item = Vector> + '_ {
        (1..=self.height).flat_map(move |y| (1..=self.width).map(move |x| Vector::new(x, y)))
    }

    /// Unit at `vector`.
    #[must_use]
    pub fn unit(&self, vector: Vector) -> Option<&Unit> {
        self.units.get(&vector)
    }

    /// Building at `vector`.
    #[must_use]
    pub fn building(&self, vector: Vector) -> Option<&Building> {
        self.buildings.get(&vector)
    }

    /// Player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Player by id, or an error naming the missing id.
    pub fn require_player(&self, id: PlayerId) -> Result<&Player> {
        self.player(id).ok_or(RulesError::UnknownPlayer(id))
    }

    /// Whether the game has a winner (or ended in a draw).
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether `player` is the one whose turn it is.
    #[must_use]
    pub fn is_current_player(&self, player: PlayerId) -> bool {
        player != NEUTRAL && player == self.current_player
    }

    /// Whether two players are opponents. Neutral is nobody's opponent.
    #[must_use]
    pub fn is_opponent(&self, a: PlayerId, b: PlayerId) -> bool {
        a != NEUTRAL && b != NEUTRAL && a != b
    }

    /// Whether the given player is controlled by an AI.
    #[must_use]
    pub fn is_bot(&self, player: PlayerId) -> bool {
        self.player(player).is_some_and(|player| player.is_bot)
    }

    /// The player after `player` in turn order, wrapping around.
    #[must_use]
    pub fn next_player(&self, player: PlayerId) -> PlayerId {
        let position = self
            .players
            .iter()
            .position(|candidate| candidate.id == player)
            .unwrap_or(0);
        self.players
            .get((position + 1) % self.players.len().max(1))
            .map_or(NEUTRAL, |next| next.id)
    }

    /// Copy with the terrain at `vector` replaced.
    #[must_use]
    pub fn with_tile(&self, vector: Vector, tile: Tile) -> Self {
        let mut map = self.clone();
        if map.contains(vector) {
            let index = map.index(vector);
            map.tiles[index] = tile;
        }
        map
    }

    /// Copy with a unit placed (or replaced) at `vector`.
    #[must_use]
    pub fn with_unit(&self, vector: Vector, unit: Unit) -> Self {
        let mut map = self.clone();
        map.units.insert(vector, unit);
        map
    }

    /// Copy with the unit at `vector` removed.
    #[must_use]
    pub fn without_unit(&self, vector: Vector) -> Self {
        let mut map = self.clone();
        map.units.remove(&vector);
        map
    }

    /// Copy with the full unit set replaced.
    #[must_use]
    pub fn with_units(&self, units: BTreeMap<Vector, Unit>) -> Self {
        Self {
            units,
            ..self.clone()
        }
    }

    /// Copy with a building placed (or replaced) at `vector`.
    #[must_use]
    pub fn with_building(&self, vector: Vector, building: Building) -> Self {
        let mut map = self.clone();
        map.buildings.insert(vector, building);
        map
    }

    /// Copy with the building at `vector` removed.
    #[must_use]
    pub fn without_building(&self, vector: Vector) -> Self {
        let mut map = self.clone();
        map.buildings.remove(&vector);
        map
    }

    /// Copy with a player replaced by id.
    #[must_use]
    pub fn with_player(&self, player: Player) -> Self {
        let mut map = self.clone();
        if let Some(slot) = map.players.iter_mut().find(|slot| slot.id == player.id) {
            *slot = player;
        }
        map
    }

    /// Copy with fog of war toggled.
    #[must_use]
    pub fn with_fog(&self, fog: bool) -> Self {
        Self {
            fog,
            ..self.clone()
        }
    }
}
