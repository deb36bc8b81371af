//! Typed actions and action responses.
//!
//! An [`Action`] is what a player asks for. An [`ActionResponse`] is the
//! authoritative description of what happened, carrying the resulting
//! entities so that it can be applied to a map without re-running rules.
//! Hidden variants carry only what a viewer under fog of war may know.

use serde::{Deserialize, Serialize};

use crate::entities::{Building, BuildingKind, PlayerId, Skill, Unit, UnitKind};
use crate::vector::Vector;

/// A request issued by the current player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move a unit along a path.
    Move {
        /// Origin.
        from: Vector,
        /// Destination.
        to: Vector,
        /// Path excluding `from`, ending in `to`. Empty to let the rules pick.
        path: Vec<Vector>,
    },
    /// Attack a unit.
    AttackUnit {
        /// Attacker.
        from: Vector,
        /// Defender.
        to: Vector,
    },
    /// Attack a building.
    AttackBuilding {
        /// Attacker.
        from: Vector,
        /// Building.
        to: Vector,
    },
    /// Capture the building below a unit.
    Capture {
        /// Capturing unit and building.
        from: Vector,
    },
    /// Produce a unit.
    CreateUnit {
        /// Producing building.
        from: Vector,
        /// Where the unit appears.
        to: Vector,
        /// Unit type.
        kind: UnitKind,
    },
    /// Raise a building below a unit.
    CreateBuilding {
        /// Building unit.
        from: Vector,
        /// Building type.
        kind: BuildingKind,
    },
    /// Drop a carried unit.
    DropUnit {
        /// Transporter.
        from: Vector,
        /// Index into the transporter's cargo.
        index: usize,
        /// Where the unit is dropped.
        to: Vector,
    },
    /// Heal a friendly unit.
    Heal {
        /// Medic.
        from: Vector,
        /// Patient.
        to: Vector,
    },
    /// Rescue a neutral unit.
    Rescue {
        /// Rescuer.
        from: Vector,
        /// Neutral unit.
        to: Vector,
    },
    /// Sabotage an opponent unit.
    Sabotage {
        /// Saboteur.
        from: Vector,
        /// Victim.
        to: Vector,
    },
    /// Pack up a long range unit.
    Fold {
        /// Unit.
        from: Vector,
    },
    /// Deploy a long range unit.
    Unfold {
        /// Unit.
        from: Vector,
    },
    /// End a unit's turn without doing anything.
    CompleteUnit {
        /// Unit.
        from: Vector,
    },
    /// Toggle a barrier from a radar station.
    ToggleBarrier {
        /// Radar station.
        from: Vector,
        /// Barrier.
        to: Vector,
    },
    /// Buy a skill at a shop.
    BuySkill {
        /// Shop.
        from: Vector,
        /// Skill to buy.
        skill: Skill,
    },
    /// End the current player's turn.
    EndTurn,
}

impl Action {
    /// Short name used in logs and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "Move",
            Self::AttackUnit { .. } => "AttackUnit",
            Self::AttackBuilding { .. } => "AttackBuilding",
            Self::Capture { .. } => "Capture",
            Self::CreateUnit { .. } => "CreateUnit",
            Self::CreateBuilding { .. } => "CreateBuilding",
            Self::DropUnit { .. } => "DropUnit",
            Self::Heal { .. } => "Heal",
            Self::Rescue { .. } => "Rescue",
            Self::Sabotage { .. } => "Sabotage",
            Self::Fold { .. } => "Fold",
            Self::Unfold { .. } => "Unfold",
            Self::CompleteUnit { .. } => "CompleteUnit",
            Self::ToggleBarrier { .. } => "ToggleBarrier",
            Self::BuySkill { .. } => "BuySkill",
            Self::EndTurn => "EndTurn",
        }
    }
}

/// The authoritative outcome of an action or a server-side event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionResponse {
    /// A unit moved.
    Move {
        /// Origin.
        from: Vector,
        /// Actual destination.
        to: Vector,
        /// Path walked, excluding `from`.
        path: Vec<Vector>,
    },
    /// A unit attacked a unit. `None` means destroyed.
    AttackUnit {
        /// Attacker position.
        from: Vector,
        /// Defender position.
        to: Vector,
        /// Attacker after the fight.
        unit_a: Option<Unit>,
        /// Defender after the fight.
        unit_b: Option<Unit>,
    },
    /// A unit attacked a building. `None` means destroyed.
    AttackBuilding {
        /// Attacker position.
        from: Vector,
        /// Building position.
        to: Vector,
        /// Attacker after the fight.
        unit_a: Option<Unit>,
        /// Building after the fight.
        building: Option<Building>,
    },
    /// A building changed owner.
    Capture {
        /// Position of unit and building.
        from: Vector,
        /// The captured building.
        building: Building,
    },
    /// A unit was produced.
    CreateUnit {
        /// Producing building.
        from: Vector,
        /// Where the unit appears.
        to: Vector,
        /// The new unit.
        unit: Unit,
    },
    /// A building was raised.
    CreateBuilding {
        /// Position.
        from: Vector,
        /// The new building.
        building: Building,
    },
    /// A carried unit was dropped.
    DropUnit {
        /// Transporter.
        from: Vector,
        /// Index into the cargo.
        index: usize,
        /// Where the unit was dropped.
        to: Vector,
    },
    /// A unit was healed.
    Heal {
        /// Medic.
        from: Vector,
        /// Patient.
        to: Vector,
        /// Patient health afterwards.
        health: u8,
    },
    /// A neutral unit joined a player.
    Rescue {
        /// Rescuer.
        from: Vector,
        /// Rescued unit.
        to: Vector,
        /// New owner.
        player: PlayerId,
    },
    /// A unit was sabotaged.
    Sabotage {
        /// Saboteur.
        from: Vector,
        /// Victim.
        to: Vector,
        /// Victim health afterwards.
        health: u8,
    },
    /// A long range unit packed up.
    Fold {
        /// Unit.
        from: Vector,
    },
    /// A long range unit deployed.
    Unfold {
        /// Unit.
        from: Vector,
    },
    /// A unit ended its turn.
    CompleteUnit {
        /// Unit.
        from: Vector,
    },
    /// A barrier was toggled.
    ToggleBarrier {
        /// Radar station.
        from: Vector,
        /// Barrier.
        to: Vector,
        /// New barrier state.
        active: bool,
    },
    /// A skill was bought.
    BuySkill {
        /// Shop.
        from: Vector,
        /// Skill.
        skill: Skill,
        /// Buyer.
        player: PlayerId,
    },
    /// The turn passed to the next player.
    EndTurn {
        /// Player whose turn ended.
        current: PlayerId,
        /// Player whose turn starts.
        next: PlayerId,
        /// Round after the change.
        round: u32,
        /// Funds of `next` after income.
        funds: u32,
    },
    /// Units appeared on the map (server-side event).
    Spawn {
        /// New units.
        units: Vec<(Vector, Unit)>,
    },
    /// A player received funds (server-side event).
    ReceiveReward {
        /// Receiver.
        player: PlayerId,
        /// Amount received.
        funds: u32,
    },
    /// The game is over (server-side event).
    GameEnd {
        /// Winner, `None` for a draw.
        winner: Option<PlayerId>,
    },
    /// A move partially observed under fog of war.
    ///
    /// `from` is set when the origin was visible, `to` and `unit` when the
    /// destination is visible. `path` holds only the visible fields.
    HiddenMove {
        /// Visible origin.
        from: Option<Vector>,
        /// Visible destination.
        to: Option<Vector>,
        /// Visible part of the path.
        path: Vec<Vector>,
        /// The mover, when it ends inside vision.
        unit: Option<Unit>,
    },
    /// An attack on a visible unit by a hidden attacker.
    HiddenSourceAttackUnit {
        /// Defender position.
        to: Vector,
        /// Defender after the fight.
        unit_b: Option<Unit>,
    },
    /// An attack by a visible unit on a hidden unit.
    HiddenTargetAttackUnit {
        /// Attacker position.
        from: Vector,
        /// Attacker after the fight.
        unit_a: Option<Unit>,
    },
    /// An attack on a visible building by a hidden attacker.
    HiddenSourceAttackBuilding {
        /// Building position.
        to: Vector,
        /// Building after the fight.
        building: Option<Building>,
    },
    /// An attack by a visible unit on a hidden building.
    HiddenTargetAttackBuilding {
        /// Attacker position.
        from: Vector,
        /// Attacker after the fight.
        unit_a: Option<Unit>,
    },
    /// Units that came into the viewer's sight.
    Reveal {
        /// Newly visible units.
        units: Vec<(Vector, Unit)>,
    },
}

impl ActionResponse {
    /// Short name used in logs and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "Move",
            Self::AttackUnit { .. } => "AttackUnit",
            Self::AttackBuilding { .. } => "AttackBuilding",
            Self::Capture { .. } => "Capture",
            Self::CreateUnit { .. } => "CreateUnit",
            Self::CreateBuilding { .. } => "CreateBuilding",
            Self::DropUnit { .. } => "DropUnit",
            Self::Heal { .. } => "Heal",
            Self::Rescue { .. } => "Rescue",
            Self::Sabotage { .. } => "Sabotage",
            Self::Fold { .. } => "Fold",
            Self::Unfold { .. } => "Unfold",
            Self::CompleteUnit { .. } => "CompleteUnit",
            Self::ToggleBarrier { .. } => "ToggleBarrier",
            Self::BuySkill { .. } => "BuySkill",
            Self::EndTurn { .. } => "EndTurn",
            Self::Spawn { .. } => "Spawn",
            Self::ReceiveReward { .. } => "ReceiveReward",
            Self::GameEnd { .. } => "GameEnd",
            Self::HiddenMove { .. } => "HiddenMove",
            Self::HiddenSourceAttackUnit { .. } => "HiddenSourceAttackUnit",
            Self::HiddenTargetAttackUnit { .. } => "HiddenTargetAttackUnit",
            Self::HiddenSourceAttackBuilding { .. } => "HiddenSourceAttackBuilding",
            Self::HiddenTargetAttackBuilding { .. } => "HiddenTargetAttackBuilding",
            Self::Reveal { .. } => "Reveal",
        }
    }

    /// Whether this is a fog-of-war variant.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        matches!(
            self,
            Self::HiddenMove { .. }
                | Self::HiddenSourceAttackUnit { .. }
                | Self::HiddenTargetAttackUnit { .. }
                | Self::HiddenSourceAttackBuilding { .. }
                | Self::HiddenTargetAttackBuilding { .. }
                | Self::Reveal { .. }
        )
    }

    /// Every map position the response touches, in a stable order.
    #[must_use]
    pub fn vectors(&self) -> Vec<Vector> {
        match self {
            Self::Move { from, path, .. } => std::iter::once(*from).chain(path.iter().copied()).collect(),
            Self::AttackUnit { from, to, .. }
            | Self::AttackBuilding { from, to, .. }
            | Self::CreateUnit { from, to, .. }
            | Self::DropUnit { from, to, .. }
            | Self::Heal { from, to, .. }
            | Self::Rescue { from, to, .. }
            | Self::Sabotage { from, to, .. }
            | Self::ToggleBarrier { from, to, .. } => vec![*from, *to],
            Self::Capture { from, .. }
            | Self::CreateBuilding { from, .. }
            | Self::Fold { from }
            | Self::Unfold { from }
            | Self::CompleteUnit { from }
            | Self::BuySkill { from, .. } => vec![*from],
            Self::Spawn { units } | Self::Reveal { units } => {
                units.iter().map(|(vector, _)| *vector).collect()
            }
            Self::HiddenMove { from, path, .. } => from.iter().chain(path.iter()).copied().collect(),
            Self::HiddenSourceAttackUnit { to, .. } | Self::HiddenSourceAttackBuilding { to, .. } => {
                vec![*to]
            }
            Self::HiddenTargetAttackUnit { from, .. }
            | Self::HiddenTargetAttackBuilding { from, .. } => vec![*from],
            Self::EndTurn { .. } | Self::ReceiveReward { .. } | Self::GameEnd { .. } => Vec::new(),
        }
    }
}
