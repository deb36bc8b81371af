//! Client state and its reducer.
//!
//! [`State`] is the single aggregate the UI renders from. It is replaced
//! only through [`StateUpdate`] values applied by the session, which keeps
//! derived fields such as [`Vision`] consistent with their inputs.

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{
    ActionResponse, Building, Fields, MapData, PlayerId, Tile, Unit, Vector, Vision,
};

use crate::animation::AnimationQueue;
use crate::behavior::{ActiveBehavior, Behavior, BehaviorKind, Menu};
use crate::config::ProfileKind;
use crate::editor::EditorState;
use crate::radius::RadiusInfo;
use crate::scheduler::TimerId;

/// A selection waiting for its confirming select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmAction {
    /// The field that has to be selected again.
    pub to: Vector,
    /// For attacks after moving, the field the attack is launched from.
    pub origin: Option<Vector>,
}

/// Information panel content for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    /// The inspected field.
    pub vector: Vector,
    /// Terrain.
    pub tile: Option<Tile>,
    /// Unit on the field.
    pub unit: Option<Unit>,
    /// Building on the field.
    pub building: Option<Building>,
}

impl GameInfo {
    /// Collect information about `vector` on `map`.
    #[must_use]
    pub fn collect(map: &MapData, vector: Vector) -> Self {
        Self {
            vector,
            tile: map.tile(vector),
            unit: map.unit(vector).cloned(),
            building: map.building(vector).cloned(),
        }
    }
}

/// Everything the client renders.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// The map as the current viewer sees it.
    pub map: MapData,
    /// The active behavior.
    pub behavior: Option<ActiveBehavior>,
    /// What is currently playing.
    pub animations: AnimationQueue,
    /// Cursor position.
    pub position: Option<Vector>,
    /// Field of the selected unit or building.
    pub selected_position: Option<Vector>,
    /// The selected unit.
    pub selected_unit: Option<Unit>,
    /// The selected building.
    pub selected_building: Option<Building>,
    /// Target picked while choosing between a unit and a building.
    pub selected_attackable: Option<Vector>,
    /// Addressable fields of the active behavior.
    pub radius: Option<RadiusInfo>,
    /// Attack targets of the selected unit.
    pub attackable: Option<Fields>,
    /// Attack radius preview shown after hovering a unit.
    pub preview: Option<Fields>,
    /// Choices of a menu behavior.
    pub menu: Option<Menu>,
    /// Selection waiting for confirmation.
    pub confirm_action: Option<ConfirmAction>,
    /// The viewing player. Spectators have none.
    pub current_viewer: Option<PlayerId>,
    /// Derived from `current_viewer`.
    pub vision: Vision,
    /// Whether a replay is being played back.
    pub replaying: bool,
    /// Whether playback is paused.
    pub paused: bool,
    /// Whether fast-forward is on.
    pub fast_forward: bool,
    /// The pacing profile chosen by the processor.
    pub profile: ProfileKind,
    /// The last response committed to the map.
    pub last_action_response: Option<ActionResponse>,
    /// Info panel content.
    pub game_info: Option<GameInfo>,
    /// Field whose tooltip is visible.
    pub tooltip: Option<Vector>,
    /// Pending hover timer.
    pub timer: Option<TimerId>,
    /// Editor state, only in editor sessions.
    pub editor: Option<EditorState>,
    next_generation: u64,
}

impl State {
    /// Initial state for `viewer` looking at `map`.
    #[must_use]
    pub fn new(map: &MapData, viewer: Option<PlayerId>) -> Self {
        let vision = Vision::new(viewer);
        Self {
            map: vision.apply(map),
            behavior: None,
            animations: AnimationQueue::new(),
            position: None,
            selected_position: None,
            selected_unit: None,
            selected_building: None,
            selected_attackable: None,
            radius: None,
            attackable: None,
            preview: None,
            menu: None,
            confirm_action: None,
            current_viewer: viewer,
            vision,
            replaying: false,
            paused: false,
            fast_forward: false,
            profile: ProfileKind::Human,
            last_action_response: None,
            game_info: None,
            tooltip: None,
            timer: None,
            editor: None,
            next_generation: 0,
        }
    }

    /// The active behavior.
    #[must_use]
    pub fn behavior(&self) -> Option<&Behavior> {
        self.behavior.as_ref().map(|active| &active.behavior)
    }

    /// Kind of the active behavior.
    #[must_use]
    pub fn behavior_kind(&self) -> Option<BehaviorKind> {
        self.behavior().map(Behavior::kind)
    }

    /// Whether the viewer may act with entities of `player` right now.
    #[must_use]
    pub fn can_control(&self, player: PlayerId) -> bool {
        !self.replaying
            && !self.map.is_ended()
            && self.current_viewer == Some(player)
            && self.map.is_current_player(player)
    }

    /// Reducer. Behavior changes are handled by the session, which runs
    /// the deactivate and activate hooks around [`State::install`].
    pub(crate) fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            map,
            behavior: _,
            position,
            selected_position,
            selected_unit,
            selected_building,
            selected_attackable,
            radius,
            attackable,
            preview,
            menu,
            confirm_action,
            current_viewer,
            replaying,
            paused,
            fast_forward,
            profile,
            last_action_response,
            game_info,
            tooltip,
            timer,
            editor,
        } = update;

        if let Some(viewer) = current_viewer {
            self.current_viewer = viewer;
            self.vision = Vision::new(viewer);
            self.map = self.vision.apply(&self.map);
        }
        if let Some(map) = map {
            self.map = self.vision.apply(&map);
        }
        macro_rules! assign {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = $field {
                    self.$field = value;
                })*
            };
        }
        assign!(
            position,
            selected_position,
            selected_unit,
            selected_building,
            selected_attackable,
            radius,
            attackable,
            preview,
            menu,
            confirm_action,
            replaying,
            paused,
            fast_forward,
            profile,
            last_action_response,
            game_info,
            tooltip,
            timer,
            editor,
        );
    }

    /// Install a behavior instance with a fresh generation.
    pub(crate) fn install(&mut self, behavior: Option<Behavior>) {
        self.behavior = behavior.map(|behavior| {
            let generation = self.next_generation;
            self.next_generation += 1;
            ActiveBehavior {
                generation,
                behavior,
            }
        });
    }
}

/// A partial state. Unset fields are left untouched by the reducer.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct StateUpdate {
    pub(crate) map: Option<MapData>,
    pub(crate) behavior: Option<Option<Behavior>>,
    pub(crate) position: Option<Option<Vector>>,
    pub(crate) selected_position: Option<Option<Vector>>,
    pub(crate) selected_unit: Option<Option<Unit>>,
    pub(crate) selected_building: Option<Option<Building>>,
    pub(crate) selected_attackable: Option<Option<Vector>>,
    pub(crate) radius: Option<Option<RadiusInfo>>,
    pub(crate) attackable: Option<Option<Fields>>,
    pub(crate) preview: Option<Option<Fields>>,
    pub(crate) menu: Option<Option<Menu>>,
    pub(crate) confirm_action: Option<Option<ConfirmAction>>,
    pub(crate) current_viewer: Option<Option<PlayerId>>,
    pub(crate) replaying: Option<bool>,
    pub(crate) paused: Option<bool>,
    pub(crate) fast_forward: Option<bool>,
    pub(crate) profile: Option<ProfileKind>,
    pub(crate) last_action_response: Option<Option<ActionResponse>>,
    pub(crate) game_info: Option<Option<GameInfo>>,
    pub(crate) tooltip: Option<Option<Vector>>,
    pub(crate) timer: Option<Option<TimerId>>,
    pub(crate) editor: Option<Option<EditorState>>,
}

macro_rules! setters {
    ($($(#[$doc:meta])* $name:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self, value: $ty) -> Self {
                self.$name = Some(value);
                self
            }
        )*
    };
}

impl StateUpdate {
    /// An update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear selection, radius, menus and pending confirmations.
    pub fn reset() -> Self {
        Self::new()
            .selected_position(None)
            .selected_unit(None)
            .selected_building(None)
            .selected_attackable(None)
            .radius(None)
            .attackable(None)
            .preview(None)
            .menu(None)
            .confirm_action(None)
            .tooltip(None)
    }

    /// Install a new behavior instance.
    pub fn behavior(self, behavior: Behavior) -> Self {
        self.with_behavior(Some(behavior))
    }

    /// Install a behavior, or remove the active one with `None`.
    pub fn with_behavior(mut self, behavior: Option<Behavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Whether the update installs a behavior.
    #[must_use]
    pub const fn changes_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub(crate) fn take_behavior(&mut self) -> Option<Option<Behavior>> {
        self.behavior.take()
    }

    setters! {
        /// Replace the map.
        map: MapData,
        /// Move the cursor.
        position: Option<Vector>,
        /// Select a field.
        selected_position: Option<Vector>,
        /// Select a unit.
        selected_unit: Option<Unit>,
        /// Select a building.
        selected_building: Option<Building>,
        /// Pick an ambiguous attack target.
        selected_attackable: Option<Vector>,
        /// Replace the radius.
        radius: Option<RadiusInfo>,
        /// Replace the attack targets.
        attackable: Option<Fields>,
        /// Replace the attack preview.
        preview: Option<Fields>,
        /// Replace the menu.
        menu: Option<Menu>,
        /// Set or clear a pending confirmation.
        confirm_action: Option<ConfirmAction>,
        /// Change the viewer. Vision is re-derived.
        current_viewer: Option<PlayerId>,
        /// Toggle replay mode.
        replaying: bool,
        /// Toggle the paused flag.
        paused: bool,
        /// Toggle fast-forward.
        fast_forward: bool,
        /// Switch the pacing profile.
        profile: ProfileKind,
        /// Record the last committed response.
        last_action_response: Option<ActionResponse>,
        /// Show or hide the info panel.
        game_info: Option<GameInfo>,
        /// Show or hide a tooltip.
        tooltip: Option<Vector>,
        /// Track the hover timer.
        timer: Option<TimerId>,
        /// Replace the editor state.
        editor: Option<EditorState>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_rules::prelude::{Player, UnitKind};

    fn fog_map() -> MapData {
        MapData::new(10, 3, vec![Player::human(1), Player::human(2)])
            .with_fog(true)
            .with_unit(Vector::new(1, 2), Unit::new(UnitKind::Infantry, 1))
            .with_unit(Vector::new(9, 2), Unit::new(UnitKind::Infantry, 2))
    }

    #[test]
    fn test_new_state_applies_vision() {
        let state = State::new(&fog_map(), Some(1));
        assert!(state.map.unit(Vector::new(9, 2)).is_none());
        assert!(State::new(&fog_map(), None).map.unit(Vector::new(9, 2)).is_some());
    }

    #[test]
    fn test_committed_maps_are_masked() {
        let mut state = State::new(&fog_map(), None);
        state.apply(StateUpdate::new().current_viewer(Some(1)));
        assert_eq!(state.vision, Vision::new(Some(1)));
        assert!(state.map.unit(Vector::new(9, 2)).is_none());

        state.apply(StateUpdate::new().map(fog_map()));
        assert!(state.map.unit(Vector::new(9, 2)).is_none());
    }

    #[test]
    fn test_unset_fields_are_kept() {
        let mut state = State::new(&fog_map(), Some(1));
        state.apply(StateUpdate::new().position(Some(Vector::new(2, 2))));
        state.apply(StateUpdate::new().tooltip(Some(Vector::new(2, 2))));
        assert_eq!(state.position, Some(Vector::new(2, 2)));
        state.apply(StateUpdate::reset());
        assert_eq!(state.position, Some(Vector::new(2, 2)));
        assert_eq!(state.tooltip, None);
    }

    #[test]
    fn test_install_bumps_generation() {
        let mut state = State::new(&fog_map(), Some(1));
        state.install(Some(Behavior::Base));
        let first = state.behavior.clone().unwrap();
        state.install(Some(Behavior::Base));
        let second = state.behavior.clone().unwrap();
        assert_eq!(first.behavior, second.behavior);
        assert_ne!(first.generation, second.generation);
    }
}
