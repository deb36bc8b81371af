//! Input routing.
//!
//! Renderers translate pointer and keyboard input into [`InputEvent`]s.
//! The session forwards them to the active behavior and falls back to the
//! default behavior when a behavior does not handle a selection.

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{Direction, Vector};
use tracing::{debug, trace};

use crate::behavior::{self, BehaviorKind, MenuChoice};
use crate::error::Result;
use crate::session::Session;
use crate::state::StateUpdate;

/// A user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// The cursor hovers a field.
    Enter(Vector),
    /// A field was clicked.
    Select {
        /// The clicked field.
        vector: Vector,
        /// The neighboring field the pointer leaned towards, used to pick
        /// where an attack is launched from.
        sub_vector: Option<Vector>,
    },
    /// Back out of the current interaction.
    Cancel,
    /// Arrow keys.
    Navigate(Direction),
    /// A menu entry was clicked.
    Choose(MenuChoice),
    /// Enter key: choose the highlighted entry or select the cursor field.
    Accept,
}

impl Session {
    /// Route `event` to the active behavior. Errors go to the error
    /// handler.
    pub fn handle_input(&mut self, event: InputEvent) {
        trace!(?event, "Input");
        let result = match event {
            InputEvent::Enter(vector) => self.enter(vector),
            InputEvent::Select { vector, sub_vector } => self.select(vector, sub_vector),
            InputEvent::Cancel => self.cancel(),
            InputEvent::Navigate(direction) => self.navigate(direction),
            InputEvent::Choose(choice) => self.choose(choice),
            InputEvent::Accept => self.accept(),
        };
        if let Err(error) = result {
            self.throw_error(&error);
        }
    }

    /// Hover `vector`.
    pub fn enter(&mut self, vector: Vector) -> Result<()> {
        match behavior::enter(self, vector)? {
            Some(update) => self.update(update),
            None => Ok(()),
        }
    }

    /// Select `vector`.
    pub fn select(&mut self, vector: Vector, sub_vector: Option<Vector>) -> Result<()> {
        let confirm = self.config.confirm_actions;
        match behavior::select(self, vector, sub_vector, confirm)? {
            Some(update) => self.update(update),
            None => self.select_fallback(vector),
        }
    }

    /// Return to the default behavior and offer it the selection once.
    /// Selecting the selected field again only deselects it.
    fn select_fallback(&mut self, vector: Vector) -> Result<()> {
        let previous = self.state.selected_position;
        debug!(?vector, ?previous, "Select fallback");
        self.reset_behavior()?;
        if previous == Some(vector) {
            return Ok(());
        }
        let confirm = self.config.confirm_actions;
        match behavior::select(self, vector, None, confirm)? {
            Some(update) => self.update(update),
            None => Ok(()),
        }
    }

    /// Pick a menu entry.
    pub fn choose(&mut self, choice: MenuChoice) -> Result<()> {
        match behavior::choose(self, choice)? {
            Some(update) => self.update(update),
            None => {
                debug!(?choice, behavior = ?self.state.behavior_kind(), "Choice ignored");
                Ok(())
            }
        }
    }

    /// Step back: drop a pending confirmation or picker, otherwise return
    /// to the default behavior.
    pub fn cancel(&mut self) -> Result<()> {
        if matches!(self.state.behavior_kind(), None | Some(BehaviorKind::Null)) {
            return Ok(());
        }
        if self.state.confirm_action.is_some() {
            let radius = self.state.radius.as_ref().map(|radius| radius.with_locked(false));
            return self.update(StateUpdate::new().confirm_action(None).radius(radius));
        }
        if self.state.selected_attackable.is_some() {
            return self.update(StateUpdate::new().selected_attackable(None).menu(None));
        }
        self.reset_behavior()
    }

    /// Move the menu highlight, or the cursor when no menu is open.
    pub fn navigate(&mut self, direction: Direction) -> Result<()> {
        let navigates_menu = self.state.behavior().is_some_and(behavior::Behavior::navigate)
            || self.state.selected_attackable.is_some();
        if let Some(menu) = self.state.menu.as_ref().filter(|_| navigates_menu) {
            let menu = menu.navigate(direction);
            return self.update(StateUpdate::new().menu(Some(menu)));
        }
        let next = self
            .state
            .position
            .map_or(Vector::new(1, 1), |position| position.step(direction));
        if !self.state.map.contains(next) {
            return Ok(());
        }
        self.enter(next)
    }

    /// Choose the highlighted menu entry, or select the cursor field.
    pub fn accept(&mut self) -> Result<()> {
        if let Some(choice) = self.state.menu.as_ref().and_then(behavior::Menu::current) {
            return self.choose(choice);
        }
        match self.state.position {
            Some(vector) => self.select(vector, None),
            None => Ok(()),
        }
    }
}
