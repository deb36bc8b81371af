//! Interaction modes.
//!
//! Exactly one [`Behavior`] is active at a time. Behaviors are plain values;
//! their hooks live in one module per variant and are reached through the
//! dispatch functions below:
//!
//! - `activate` runs once after the behavior is installed and computes the
//!   radius or menu it needs up front.
//! - `deactivate` runs once before it is replaced and clears everything a
//!   behavior may have introduced. The selected field and unit survive.
//! - `enter` previews a hovered field without committing.
//! - `select` commits. Returning `None` hands the input to the session's
//!   select fallback, which resets to the default behavior.
//! - `choose` picks a menu entry.
//!
//! Hooks never touch [`crate::state::State`] directly. They return
//! [`StateUpdate`]s or go through [`Session`] methods.

mod attack;
mod base;
mod buy_skills;
mod create_building;
mod create_unit;
mod design;
mod drop_unit;
mod entity;
mod heal;
mod menu;
mod move_unit;
mod radar;
mod rescue;
mod sabotage;
mod transport;

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{
    Action, BuildingKind, Direction, PlayerId, Skill, Unit, UnitAction, UnitKind, Vector,
};
use tracing::debug;

use crate::animation::FlashReason;
use crate::editor::Brush;
use crate::error::{ClientError, Result};
use crate::radius::{RadiusInfo, RadiusType};
use crate::session::{Session, Task};
use crate::state::StateUpdate;

/// Behavior discriminator, used for configuration and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Idle mode.
    #[default]
    Base,
    /// Moving a selected unit.
    Move,
    /// Attacking from the current position.
    Attack,
    /// Unit action menu.
    Menu,
    /// Picking a unit to heal.
    Heal,
    /// Picking a neutral unit to rescue.
    Rescue,
    /// Picking a unit to sabotage.
    Sabotage,
    /// Picking a unit to load into a transporter.
    Transport,
    /// Building production.
    CreateUnit,
    /// Pioneer construction.
    CreateBuilding,
    /// Unloading a transporter.
    DropUnit,
    /// Radar station barrier toggling.
    Radar,
    /// Skill shop.
    BuySkills,
    /// Input disabled.
    Null,
    /// Map painting in the editor.
    Design,
    /// Entity picking in the editor.
    Entity,
}

/// The active interaction mode and its private configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Idle mode.
    Base,
    /// Moving a selected unit.
    Move,
    /// Attacking from the current position.
    Attack,
    /// Unit action menu.
    Menu,
    /// Picking a unit to heal.
    Heal,
    /// Picking a neutral unit to rescue.
    Rescue,
    /// Picking a unit to sabotage.
    Sabotage,
    /// Picking a unit to load into a transporter.
    Transport,
    /// Building production.
    CreateUnit {
        /// Chosen unit kind. `None` while the menu is open.
        unit_to_build: Option<UnitKind>,
    },
    /// Pioneer construction.
    CreateBuilding,
    /// Unloading a transporter.
    DropUnit {
        /// Index of the carried unit.
        index: usize,
    },
    /// Radar station barrier toggling.
    Radar,
    /// Skill shop.
    BuySkills,
    /// Input disabled.
    Null,
    /// Map painting in the editor.
    Design {
        /// What gets painted.
        brush: Brush,
    },
    /// Entity picking in the editor.
    Entity,
}

impl Behavior {
    /// The discriminator.
    #[must_use]
    pub const fn kind(&self) -> BehaviorKind {
        match self {
            Self::Base => BehaviorKind::Base,
            Self::Move => BehaviorKind::Move,
            Self::Attack => BehaviorKind::Attack,
            Self::Menu => BehaviorKind::Menu,
            Self::Heal => BehaviorKind::Heal,
            Self::Rescue => BehaviorKind::Rescue,
            Self::Sabotage => BehaviorKind::Sabotage,
            Self::Transport => BehaviorKind::Transport,
            Self::CreateUnit { .. } => BehaviorKind::CreateUnit,
            Self::CreateBuilding => BehaviorKind::CreateBuilding,
            Self::DropUnit { .. } => BehaviorKind::DropUnit,
            Self::Radar => BehaviorKind::Radar,
            Self::BuySkills => BehaviorKind::BuySkills,
            Self::Null => BehaviorKind::Null,
            Self::Design { .. } => BehaviorKind::Design,
            Self::Entity => BehaviorKind::Entity,
        }
    }

    /// A fresh instance of `kind` with default configuration.
    #[must_use]
    pub fn from_kind(kind: BehaviorKind) -> Self {
        match kind {
            BehaviorKind::Base => Self::Base,
            BehaviorKind::Move => Self::Move,
            BehaviorKind::Attack => Self::Attack,
            BehaviorKind::Menu => Self::Menu,
            BehaviorKind::Heal => Self::Heal,
            BehaviorKind::Rescue => Self::Rescue,
            BehaviorKind::Sabotage => Self::Sabotage,
            BehaviorKind::Transport => Self::Transport,
            BehaviorKind::CreateUnit => Self::CreateUnit {
                unit_to_build: None,
            },
            BehaviorKind::CreateBuilding => Self::CreateBuilding,
            BehaviorKind::DropUnit => Self::DropUnit { index: 0 },
            BehaviorKind::Radar => Self::Radar,
            BehaviorKind::BuySkills => Self::BuySkills,
            BehaviorKind::Null => Self::Null,
            BehaviorKind::Design => Self::Design {
                brush: Brush::default(),
            },
            BehaviorKind::Entity => Self::Entity,
        }
    }

    /// Whether directional input navigates a menu instead of the map.
    #[must_use]
    pub const fn navigate(&self) -> bool {
        matches!(
            self,
            Self::Menu
                | Self::CreateUnit {
                    unit_to_build: None
                }
                | Self::CreateBuilding
                | Self::BuySkills
        )
    }
}

/// An installed behavior. Every installation gets a new generation, so two
/// instances of the same behavior are distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveBehavior {
    /// Installation counter.
    pub generation: u64,
    /// The behavior.
    pub behavior: Behavior,
}

/// Which entity an ambiguous attack targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetEntity {
    /// The unit on the field.
    Unit,
    /// The building on the field.
    Building,
}

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuChoice {
    /// A unit action.
    Unit(UnitAction),
    /// A unit kind to produce.
    Build(UnitKind),
    /// A building kind to construct.
    Construct(BuildingKind),
    /// A skill to buy.
    Skill(Skill),
    /// Switch from production to the skill shop.
    Skills,
    /// Resolve an ambiguous attack.
    Target(TargetEntity),
}

/// Choices of a menu behavior and the highlighted entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Menu {
    /// Entries in display order.
    pub entries: Vec<MenuChoice>,
    /// Highlighted entry.
    pub index: usize,
}

impl Menu {
    /// A menu with the first entry highlighted.
    #[must_use]
    pub const fn new(entries: Vec<MenuChoice>) -> Self {
        Self { entries, index: 0 }
    }

    /// The highlighted entry.
    #[must_use]
    pub fn current(&self) -> Option<MenuChoice> {
        self.entries.get(self.index).copied()
    }

    /// Copy with the highlight moved. Up and left go back, wrapping around.
    #[must_use]
    pub fn navigate(&self, direction: Direction) -> Self {
        let len = self.entries.len();
        if len == 0 {
            return self.clone();
        }
        let index = match direction {
            Direction::Up | Direction::Left => (self.index + len - 1) % len,
            Direction::Down | Direction::Right => (self.index + 1) % len,
        };
        Self {
            entries: self.entries.clone(),
            index,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

pub(crate) fn activate(session: &mut Session, behavior: &Behavior) -> Result<Option<StateUpdate>> {
    match behavior {
        Behavior::Move => move_unit::activate(session),
        Behavior::Attack => attack::activate(session),
        Behavior::Menu => menu::activate(session),
        Behavior::Heal => heal::activate(session),
        Behavior::Rescue => rescue::activate(session),
        Behavior::Sabotage => sabotage::activate(session),
        Behavior::Transport => transport::activate(session),
        Behavior::CreateUnit { unit_to_build } => create_unit::activate(session, *unit_to_build),
        Behavior::CreateBuilding => create_building::activate(session),
        Behavior::DropUnit { index } => drop_unit::activate(session, *index),
        Behavior::Radar => radar::activate(session),
        Behavior::BuySkills => buy_skills::activate(session),
        Behavior::Base | Behavior::Null | Behavior::Design { .. } | Behavior::Entity => Ok(None),
    }
}

/// Cleanup shared by every behavior.
pub(crate) fn deactivate(session: &mut Session, behavior: &Behavior) -> StateUpdate {
    if let Some(timer) = session.state.timer {
        session.clear_timer(timer);
    }
    debug!(behavior = ?behavior.kind(), "Deactivating behavior");
    StateUpdate::new()
        .radius(None)
        .attackable(None)
        .preview(None)
        .menu(None)
        .confirm_action(None)
        .selected_attackable(None)
        .tooltip(None)
        .timer(None)
}

pub(crate) fn enter(session: &mut Session, vector: Vector) -> Result<Option<StateUpdate>> {
    let Some(behavior) = session.state.behavior().cloned() else {
        return Ok(Some(StateUpdate::new().position(Some(vector))));
    };
    match behavior {
        Behavior::Base => base::enter(session, vector),
        Behavior::Move => move_unit::enter(session, vector),
        _ => Ok(Some(StateUpdate::new().position(Some(vector)))),
    }
}

pub(crate) fn select(
    session: &mut Session,
    vector: Vector,
    sub_vector: Option<Vector>,
    confirm: bool,
) -> Result<Option<StateUpdate>> {
    let Some(behavior) = session.state.behavior().cloned() else {
        return Ok(Some(StateUpdate::new()));
    };
    match behavior {
        Behavior::Base => base::select(session, vector),
        Behavior::Move => move_unit::select(session, vector, sub_vector, confirm),
        Behavior::Attack => attack::select(session, vector, confirm),
        Behavior::Heal => heal::select(session, vector),
        Behavior::Rescue => rescue::select(session, vector),
        Behavior::Sabotage => sabotage::select(session, vector),
        Behavior::Transport => transport::select(session, vector),
        Behavior::CreateUnit { unit_to_build } => create_unit::select(session, vector, unit_to_build),
        Behavior::Menu | Behavior::CreateBuilding | Behavior::BuySkills => Ok(None),
        Behavior::DropUnit { index } => drop_unit::select(session, vector, index),
        Behavior::Radar => radar::select(session, vector),
        Behavior::Null => Ok(Some(StateUpdate::new())),
        Behavior::Design { brush } => design::select(session, vector, brush),
        Behavior::Entity => entity::select(session, vector),
    }
}

pub(crate) fn choose(session: &mut Session, choice: MenuChoice) -> Result<Option<StateUpdate>> {
    let Some(behavior) = session.state.behavior().cloned() else {
        return Ok(None);
    };
    match behavior {
        Behavior::Attack => attack::choose(session, choice),
        Behavior::Menu => menu::choose(session, choice),
        Behavior::CreateUnit {
            unit_to_build: None,
        } => create_unit::choose(session, choice),
        Behavior::CreateBuilding => create_building::choose(session, choice),
        Behavior::BuySkills => buy_skills::choose(session, choice),
        _ => Ok(None),
    }
}

// ============================================================================
// Helpers shared by the behaviors
// ============================================================================

/// The selected field and the unit currently standing on it.
fn selected_unit(session: &Session) -> Result<(Vector, Unit)> {
    let behavior = session.state.behavior().map_or("none", |behavior| behavior_name(behavior.kind()));
    let from = session
        .state
        .selected_position
        .ok_or(ClientError::NoSelection { behavior })?;
    let unit = session
        .state
        .map
        .unit(from)
        .cloned()
        .ok_or_else(|| ClientError::missing_unit(from))?;
    Ok((from, unit))
}

/// The selected field and the owner of the building on it.
fn selected_building(session: &Session) -> Result<(Vector, PlayerId)> {
    let behavior = session.state.behavior().map_or("none", |behavior| behavior_name(behavior.kind()));
    let from = session
        .state
        .selected_position
        .ok_or(ClientError::NoSelection { behavior })?;
    let building = session
        .state
        .map
        .building(from)
        .ok_or_else(|| ClientError::missing_building(from))?;
    Ok((from, building.player))
}

const fn behavior_name(kind: BehaviorKind) -> &'static str {
    match kind {
        BehaviorKind::Base => "Base",
        BehaviorKind::Move => "Move",
        BehaviorKind::Attack => "Attack",
        BehaviorKind::Menu => "Menu",
        BehaviorKind::Heal => "Heal",
        BehaviorKind::Rescue => "Rescue",
        BehaviorKind::Sabotage => "Sabotage",
        BehaviorKind::Transport => "Transport",
        BehaviorKind::CreateUnit => "CreateUnit",
        BehaviorKind::CreateBuilding => "CreateBuilding",
        BehaviorKind::DropUnit => "DropUnit",
        BehaviorKind::Radar => "Radar",
        BehaviorKind::BuySkills => "BuySkills",
        BehaviorKind::Null => "Null",
        BehaviorKind::Design => "Design",
        BehaviorKind::Entity => "Entity",
    }
}

/// Whether `player` can pay `cost`.
fn can_afford(session: &Session, player: PlayerId, cost: u32) -> bool {
    session
        .state
        .map
        .player(player)
        .is_some_and(|player| player.funds >= cost)
}

/// Show a flash on `vector` and return to idle.
///
/// Returns an empty update so callers in `select` do not trigger the
/// select fallback on top of the reset.
fn flash_reset(session: &mut Session, vector: Vector, reason: FlashReason) -> Result<Option<StateUpdate>> {
    debug!(?vector, ?reason, "Flashing and resetting");
    session.flash(vector, reason);
    session.reset_behavior()?;
    Ok(Some(StateUpdate::new()))
}

/// A radius over `vectors`, or a flash when there are none.
fn target_radius(
    session: &mut Session,
    from: Vector,
    vectors: Vec<Vector>,
    kind: RadiusType,
) -> Result<Option<StateUpdate>> {
    if vectors.is_empty() {
        return flash_reset(session, from, FlashReason::NoTargets);
    }
    Ok(Some(
        StateUpdate::new().radius(Some(RadiusInfo::from_vectors(vectors, kind))),
    ))
}

/// Select a target out of the active radius and perform `action` on it.
fn select_target(
    session: &mut Session,
    vector: Vector,
    action: impl FnOnce(Vector, Vector) -> Action,
) -> Result<Option<StateUpdate>> {
    let (from, _) = selected_unit(session)?;
    let in_radius = session
        .state
        .radius
        .as_ref()
        .is_some_and(|radius| radius.contains(vector));
    if !in_radius {
        return Ok(None);
    }
    perform(session, action(from, vector), None)
}

/// Dispatch `action` optimistically and play its local outcome.
///
/// Input is disabled until the local animation has committed. Then `then`
/// runs, or the session resets to its default behavior.
pub(crate) fn perform(session: &mut Session, action: Action, then: Option<Task>) -> Result<Option<StateUpdate>> {
    session.optimistic_action(action, then)?;
    Ok(Some(StateUpdate::reset().behavior(Behavior::Null)))
}

/// [`perform`] for continuations that are not running inside a hook.
pub(crate) fn run(session: &mut Session, action: Action, then: Option<Task>) -> Result<()> {
    match perform(session, action, then)? {
        Some(update) => session.update(update),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips() {
        for behavior in [
            Behavior::Base,
            Behavior::CreateUnit {
                unit_to_build: Some(UnitKind::Tank),
            },
            Behavior::DropUnit { index: 1 },
            Behavior::Design {
                brush: Brush::Erase,
            },
        ] {
            assert_eq!(Behavior::from_kind(behavior.kind()).kind(), behavior.kind());
        }
    }

    #[test]
    fn test_only_menus_navigate() {
        assert!(Behavior::Menu.navigate());
        assert!(Behavior::CreateUnit {
            unit_to_build: None
        }
        .navigate());
        assert!(!Behavior::CreateUnit {
            unit_to_build: Some(UnitKind::Infantry)
        }
        .navigate());
        assert!(!Behavior::Move.navigate());
    }

    #[test]
    fn test_menu_navigation_wraps() {
        let menu = Menu::new(vec![
            MenuChoice::Unit(UnitAction::Attack),
            MenuChoice::Unit(UnitAction::Wait),
        ]);
        assert_eq!(menu.navigate(Direction::Up).index, 1);
        assert_eq!(menu.navigate(Direction::Down).index, 1);
        assert_eq!(menu.navigate(Direction::Down).navigate(Direction::Right).index, 0);
        assert_eq!(
            menu.navigate(Direction::Up).current(),
            Some(MenuChoice::Unit(UnitAction::Wait))
        );
        assert_eq!(Menu::new(Vec::new()).navigate(Direction::Down).index, 0);
    }
}
