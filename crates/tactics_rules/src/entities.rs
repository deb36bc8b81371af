//! Units, buildings, players and tiles.
//!
//! Entities are plain data. Their static properties (cost, movement,
//! attack range, capabilities) live in catalogue functions such as
//! [`UnitKind::info`] so that a unit on the map only stores what changes
//! during a game.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Player identifier. `0` is the neutral player.
pub type PlayerId = u8;

/// The neutral player owns unclaimed buildings and rescuable units.
pub const NEUTRAL: PlayerId = 0;

/// Full health for units and buildings.
pub const MAX_HEALTH: u8 = 100;

/// Funds spent on a single heal.
pub const HEAL_COST: u32 = 50;

/// Health restored by a single heal.
pub const HEAL_AMOUNT: u8 = 50;

/// Funds spent on toggling a barrier.
pub const BARRIER_TOGGLE_COST: u32 = 100;

// ============================================================================
// Tiles
// ============================================================================

/// Terrain of a single map field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Open ground.
    #[default]
    Plain,
    /// Fast ground.
    Road,
    /// Slow ground with cover.
    Forest,
    /// Very slow ground with strong cover.
    Mountain,
    /// Impassable for ground units.
    Sea,
    /// Lightning barrier. Impassable while active.
    Barrier {
        /// Whether the barrier currently blocks movement.
        active: bool,
    },
}

impl Tile {
    /// Movement cost for ground units. `None` means impassable.
    #[must_use]
    pub const fn movement_cost(self) -> Option<u32> {
        match self {
            Self::Plain | Self::Road => Some(1),
            Self::Forest => Some(2),
            Self::Mountain => Some(3),
            Self::Sea => None,
            Self::Barrier { active: true } => None,
            Self::Barrier { active: false } => Some(1),
        }
    }

    /// Movement cost for a specific unit kind. Vehicles cannot climb
    /// mountains.
    #[must_use]
    pub const fn cost_for(self, kind: UnitKind) -> Option<u32> {
        match self {
            Self::Mountain if !kind.info().transportable => None,
            _ => self.movement_cost(),
        }
    }

    /// Damage reduction in percent granted to a unit standing here.
    #[must_use]
    pub const fn defense(self) -> u32 {
        match self {
            Self::Forest => 20,
            Self::Mountain => 40,
            _ => 0,
        }
    }
}

// ============================================================================
// Units
// ============================================================================

/// Unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Basic foot soldier that captures buildings.
    Infantry,
    /// Builder that can raise new buildings.
    Pioneer,
    /// Heals adjacent friendly units.
    Medic,
    /// Damages adjacent opponents without a fight.
    Saboteur,
    /// Fast transporter that rescues neutral units.
    Jeep,
    /// Heavy close-combat vehicle.
    Tank,
    /// Long range unit that must unfold before attacking.
    Artillery,
}

/// Static properties of a [`UnitKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInfo {
    /// Display name.
    pub name: &'static str,
    /// Funds required to build the unit.
    pub cost: u32,
    /// Movement points per turn.
    pub radius: u32,
    /// Vision range in fields.
    pub vision: u32,
    /// Minimum attack distance.
    pub min_range: u32,
    /// Maximum attack distance. `0` means the unit cannot attack.
    pub max_range: u32,
    /// Base damage at full health against an uncovered target.
    pub damage: u32,
    /// Number of units this unit can carry.
    pub capacity: usize,
    /// Whether this unit fits into a transporter.
    pub transportable: bool,
    /// Whether the unit can capture buildings.
    pub can_capture: bool,
    /// Whether the unit can heal.
    pub can_heal: bool,
    /// Whether the unit can rescue neutral units.
    pub can_rescue: bool,
    /// Whether the unit can sabotage.
    pub can_sabotage: bool,
    /// Whether the unit can create buildings.
    pub can_build: bool,
    /// Long range units cannot move and attack in the same turn.
    pub long_range: bool,
}

impl UnitKind {
    /// All unit kinds in catalogue order.
    pub const ALL: [Self; 7] = [
        Self::Infantry,
        Self::Pioneer,
        Self::Medic,
        Self::Saboteur,
        Self::Jeep,
        Self::Tank,
        Self::Artillery,
    ];

    /// Static properties for this kind.
    #[must_use]
    pub const fn info(self) -> UnitInfo {
        const BASE: UnitInfo = UnitInfo {
            name: "",
            cost: 0,
            radius: 3,
            vision: 2,
            min_range: 0,
            max_range: 0,
            damage: 0,
            capacity: 0,
            transportable: true,
            can_capture: false,
            can_heal: false,
            can_rescue: false,
            can_sabotage: false,
            can_build: false,
            long_range: false,
        };
        match self {
            Self::Infantry => UnitInfo {
                name: "Infantry",
                cost: 150,
                min_range: 1,
                max_range: 1,
                damage: 55,
                can_capture: true,
                ..BASE
            },
            Self::Pioneer => UnitInfo {
                name: "Pioneer",
                cost: 100,
                can_capture: true,
                can_build: true,
                ..BASE
            },
            Self::Medic => UnitInfo {
                name: "Medic",
                cost: 200,
                can_heal: true,
                ..BASE
            },
            Self::Saboteur => UnitInfo {
                name: "Saboteur",
                cost: 250,
                radius: 4,
                min_range: 1,
                max_range: 1,
                damage: 40,
                can_sabotage: true,
                ..BASE
            },
            Self::Jeep => UnitInfo {
                name: "Jeep",
                cost: 300,
                radius: 6,
                vision: 3,
                capacity: 1,
                transportable: false,
                can_rescue: true,
                ..BASE
            },
            Self::Tank => UnitInfo {
                name: "Tank",
                cost: 500,
                radius: 5,
                vision: 3,
                min_range: 1,
                max_range: 1,
                damage: 70,
                transportable: false,
                ..BASE
            },
            Self::Artillery => UnitInfo {
                name: "Artillery",
                cost: 600,
                radius: 4,
                min_range: 2,
                max_range: 4,
                damage: 65,
                transportable: false,
                long_range: true,
                ..BASE
            },
        }
    }
}

/// A unit carried inside a transporter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportedUnit {
    /// Unit type.
    pub kind: UnitKind,
    /// Owner.
    pub player: PlayerId,
    /// Remaining health.
    pub health: u8,
}

impl TransportedUnit {
    /// Turn the carried unit back into a unit on the map.
    ///
    /// Dropped units have completed their turn.
    #[must_use]
    pub fn deploy(&self) -> Unit {
        Unit {
            health: self.health,
            moved: true,
            completed: true,
            ..Unit::new(self.kind, self.player)
        }
    }
}

/// A unit placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unit type.
    pub kind: UnitKind,
    /// Owner.
    pub player: PlayerId,
    /// Remaining health, `1..=100` while alive.
    pub health: u8,
    /// Whether the unit moved this turn.
    pub moved: bool,
    /// Whether the unit finished its turn.
    pub completed: bool,
    /// Long range units attack only while unfolded and cannot move.
    pub unfolded: bool,
    /// Units carried by this transporter.
    pub transports: Vec<TransportedUnit>,
}

impl Unit {
    /// Create a fresh, full-health unit.
    #[must_use]
    pub fn new(kind: UnitKind, player: PlayerId) -> Self {
        Self {
            kind,
            player,
            health: MAX_HEALTH,
            moved: false,
            completed: false,
            unfolded: false,
            transports: Vec::new(),
        }
    }

    /// Static properties.
    #[must_use]
    pub const fn info(&self) -> UnitInfo {
        self.kind.info()
    }

    /// Copy with a different health value.
    #[must_use]
    pub fn with_health(&self, health: u8) -> Self {
        Self {
            health,
            ..self.clone()
        }
    }

    /// Copy with a different owner.
    #[must_use]
    pub fn with_player(&self, player: PlayerId) -> Self {
        Self {
            player,
            ..self.clone()
        }
    }

    /// Copy flagged as moved.
    #[must_use]
    pub fn set_moved(&self) -> Self {
        Self {
            moved: true,
            ..self.clone()
        }
    }

    /// Copy flagged as moved and completed.
    #[must_use]
    pub fn complete(&self) -> Self {
        Self {
            moved: true,
            completed: true,
            ..self.clone()
        }
    }

    /// Copy with turn flags cleared.
    #[must_use]
    pub fn recover(&self) -> Self {
        Self {
            moved: false,
            completed: false,
            ..self.clone()
        }
    }

    /// Copy carrying one more unit.
    #[must_use]
    pub fn load(&self, unit: &Unit) -> Self {
        let mut transports = self.transports.clone();
        transports.push(TransportedUnit {
            kind: unit.kind,
            player: unit.player,
            health: unit.health,
        });
        Self {
            transports,
            ..self.clone()
        }
    }

    /// Copy without the carried unit at `index`.
    #[must_use]
    pub fn unload(&self, index: usize) -> Self {
        let mut transports = self.transports.clone();
        if index < transports.len() {
            transports.remove(index);
        }
        Self {
            transports,
            ..self.clone()
        }
    }

    /// Whether the unit can still be moved this turn.
    #[must_use]
    pub const fn can_move(&self) -> bool {
        !self.moved && !self.completed && !self.unfolded
    }

    /// Whether the unit can attack in its current configuration.
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        let info = self.info();
        info.max_range > 0 && (!info.long_range || self.unfolded)
    }

    /// Whether this unit has free transport capacity.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.transports.len() < self.info().capacity
    }

    /// Whether `unit` can board this transporter.
    #[must_use]
    pub fn can_transport(&self, unit: &Unit) -> bool {
        self.player == unit.player && self.has_capacity() && unit.info().transportable
    }
}

// ============================================================================
// Buildings
// ============================================================================

/// Building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Headquarters. Losing it loses the game.
    HQ,
    /// Produces every ground unit.
    Factory,
    /// Produces foot units.
    Barracks,
    /// Generates income.
    House,
    /// Toggles lightning barriers in range.
    RadarStation,
    /// Sells skills.
    Shop,
}

/// Static properties of a [`BuildingKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingInfo {
    /// Display name.
    pub name: &'static str,
    /// Funds required for a pioneer to build it.
    pub cost: u32,
    /// Funds generated at the start of the owner's turn.
    pub income: u32,
    /// Damage reduction in percent.
    pub defense: u32,
    /// Units this building can produce.
    pub buildable: &'static [UnitKind],
    /// Range in which barriers can be toggled. `0` for none.
    pub radar_range: u32,
    /// Whether the building sells skills.
    pub sells_skills: bool,
}

impl BuildingKind {
    /// Buildings a pioneer can create, in menu order.
    pub const CONSTRUCTIBLE: [Self; 4] = [Self::Barracks, Self::House, Self::RadarStation, Self::Shop];

    /// Static properties for this kind.
    #[must_use]
    pub const fn info(self) -> BuildingInfo {
        const BASE: BuildingInfo = BuildingInfo {
            name: "",
            cost: 0,
            income: 50,
            defense: 20,
            buildable: &[],
            radar_range: 0,
            sells_skills: false,
        };
        match self {
            Self::HQ => BuildingInfo {
                name: "HQ",
                income: 100,
                defense: 40,
                buildable: &[UnitKind::Infantry, UnitKind::Pioneer],
                sells_skills: true,
                ..BASE
            },
            Self::Factory => BuildingInfo {
                name: "Factory",
                buildable: &UnitKind::ALL,
                ..BASE
            },
            Self::Barracks => BuildingInfo {
                name: "Barracks",
                cost: 300,
                buildable: &[
                    UnitKind::Infantry,
                    UnitKind::Pioneer,
                    UnitKind::Medic,
                    UnitKind::Saboteur,
                ],
                ..BASE
            },
            Self::House => BuildingInfo {
                name: "House",
                cost: 200,
                income: 100,
                ..BASE
            },
            Self::RadarStation => BuildingInfo {
                name: "Radar Station",
                cost: 400,
                radar_range: 3,
                ..BASE
            },
            Self::Shop => BuildingInfo {
                name: "Shop",
                cost: 250,
                sells_skills: true,
                ..BASE
            },
        }
    }
}

/// A building placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Building type.
    pub kind: BuildingKind,
    /// Owner, [`NEUTRAL`] when unclaimed.
    pub player: PlayerId,
    /// Remaining health.
    pub health: u8,
    /// Whether the building already acted this turn.
    pub completed: bool,
}

impl Building {
    /// Create a full-health building.
    #[must_use]
    pub const fn new(kind: BuildingKind, player: PlayerId) -> Self {
        Self {
            kind,
            player,
            health: MAX_HEALTH,
            completed: false,
        }
    }

    /// Static properties.
    #[must_use]
    pub const fn info(&self) -> BuildingInfo {
        self.kind.info()
    }

    /// Copy with a different owner.
    #[must_use]
    pub fn with_player(&self, player: PlayerId) -> Self {
        Self {
            player,
            ..self.clone()
        }
    }

    /// Copy with a different health value.
    #[must_use]
    pub fn with_health(&self, health: u8) -> Self {
        Self {
            health,
            ..self.clone()
        }
    }

    /// Copy flagged as completed.
    #[must_use]
    pub fn complete(&self) -> Self {
        Self {
            completed: true,
            ..self.clone()
        }
    }

    /// Copy with the completed flag cleared.
    #[must_use]
    pub fn recover(&self) -> Self {
        Self {
            completed: false,
            ..self.clone()
        }
    }
}

// ============================================================================
// Players and skills
// ============================================================================

/// Purchasable player skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    /// +1 vision for every unit.
    Recon,
    /// Units take 10% less damage.
    Fortify,
    /// Heals restore full health.
    FieldMedicine,
}

impl Skill {
    /// All skills in shop order.
    pub const ALL: [Self; 3] = [Self::Recon, Self::Fortify, Self::FieldMedicine];

    /// Price in funds.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Recon => 300,
            Self::Fortify => 500,
            Self::FieldMedicine => 400,
        }
    }
}

/// A participant of the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Player id, never [`NEUTRAL`].
    pub id: PlayerId,
    /// Available funds.
    pub funds: u32,
    /// Whether an AI controls this player.
    pub is_bot: bool,
    /// Purchased skills.
    pub skills: BTreeSet<Skill>,
}

impl Player {
    /// A human player without funds.
    #[must_use]
    pub fn human(id: PlayerId) -> Self {
        Self {
            id,
            funds: 0,
            is_bot: false,
            skills: BTreeSet::new(),
        }
    }

    /// A bot player without funds.
    #[must_use]
    pub fn bot(id: PlayerId) -> Self {
        Self {
            is_bot: true,
            ..Self::human(id)
        }
    }

    /// Copy with a different amount of funds.
    #[must_use]
    pub fn with_funds(&self, funds: u32) -> Self {
        Self {
            funds,
            ..self.clone()
        }
    }

    /// Whether the skill was purchased.
    #[must_use]
    pub fn has_skill(&self, skill: Skill) -> bool {
        self.skills.contains(&skill)
    }
}
