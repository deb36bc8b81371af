//! # Tactics Rules
//!
//! Map rules engine for the tactics client.
//!
//! This crate contains **only** deterministic rule logic:
//! - No rendering
//! - No IO
//! - No randomness
//!
//! Every function takes an immutable [`MapData`](map::MapData) snapshot and
//! either answers a query (movement radius, attack range, buildable units)
//! or returns a *new* snapshot. The client never mutates a map in place.
//!
//! ## Crate Structure
//!
//! - [`vector`] - Grid coordinates and directions
//! - [`entities`] - Units, buildings, players and their static catalogues
//! - [`map`] - The immutable map snapshot
//! - [`radius`] - Movement/attack radius and target queries
//! - [`action`] - Typed actions and action responses
//! - [`execute`] - Action executor and response application
//! - [`vision`] - Fog-of-war visibility and hidden response handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod entities;
pub mod error;
pub mod execute;
pub mod map;
pub mod radius;
pub mod vector;
pub mod vision;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, ActionResponse};
    pub use crate::entities::{
        Building, BuildingKind, Player, PlayerId, Skill, Tile, TransportedUnit, Unit, UnitKind,
        BARRIER_TOGGLE_COST, HEAL_COST, NEUTRAL,
    };
    pub use crate::error::{Result, RulesError};
    pub use crate::execute::{
        apply_action_response, apply_hidden_action_response, check_game_over, execute_action,
    };
    pub use crate::map::{MapData, Outcome};
    pub use crate::radius::{AttackMode, Fields, RadiusItem, UnitAction};
    pub use crate::vector::{Direction, Vector};
    pub use crate::vision::Vision;
}
