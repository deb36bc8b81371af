//! Error types for the client core.

use tactics_rules::prelude::{Action, MapData, RulesError, Vector};
use thiserror::Error;

use crate::animation::{AnimationId, AnimationKey};

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;

/// Top-level error type for the client core.
///
/// Rules and contract errors are never recovered automatically. They are
/// routed to the session's error handler.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// An action was issued after the game ended.
    #[error("Cannot issue {action}: the game has already ended")]
    GameEnded {
        /// The rejected action kind.
        action: &'static str,
    },

    /// An action was issued while remote actions are suppressed, e.g.
    /// during a replay.
    #[error("Cannot issue {action}: remote actions are suppressed")]
    RemoteActionsSuppressed {
        /// The rejected action kind.
        action: &'static str,
    },

    /// The rules engine rejected an action or response.
    #[error("Rules error for {action}: {source}\nMap: {map}")]
    Rules {
        /// Debug rendering of the offending action or response.
        action: String,
        /// The map snapshot serialized as JSON.
        map: String,
        /// The underlying rule violation.
        #[source]
        source: RulesError,
    },

    /// A response kind cannot be handled in the current context.
    #[error("Unhandled response {kind}: {reason}")]
    UnhandledResponse {
        /// Response kind.
        kind: &'static str,
        /// Why it could not be handled.
        reason: &'static str,
    },

    /// A routine expected an entity that is not on the map.
    #[error("Missing {entity} at {vector}")]
    MissingEntity {
        /// "unit" or "building".
        entity: &'static str,
        /// Expected position.
        vector: Vector,
    },

    /// A behavior that acts on a selection was activated without one.
    #[error("Behavior {behavior} requires a selected field")]
    NoSelection {
        /// Kind of the behavior.
        behavior: &'static str,
    },

    /// The animation queue does not hold the animation that completed.
    #[error("Animation invariant violated at {key:?}: expected {expected:?}, found {found:?}")]
    AnimationInvariant {
        /// Queue key of the completed animation.
        key: AnimationKey,
        /// The animation that reported completion.
        expected: AnimationId,
        /// The animation actually active on the key.
        found: Option<AnimationId>,
    },

    /// The remote collaborator failed.
    #[error("Transport error: {0}")]
    Transport(#[from] crate::events::TransportError),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Wrap a rules error with the offending action and map.
    #[must_use]
    pub fn rules(action: &Action, map: &MapData, source: RulesError) -> Self {
        Self::rules_with(format!("{action:?}"), map, source)
    }

    /// Wrap a rules error with a description of what was applied.
    #[must_use]
    pub fn rules_with(action: String, map: &MapData, source: RulesError) -> Self {
        let map = serde_json::to_string(map)
            .unwrap_or_else(|error| format!("<unserializable map: {error}>"));
        Self::Rules {
            action,
            map,
            source,
        }
    }

    /// A missing unit.
    #[must_use]
    pub const fn missing_unit(vector: Vector) -> Self {
        Self::MissingEntity {
            entity: "unit",
            vector,
        }
    }

    /// A missing building.
    #[must_use]
    pub const fn missing_building(vector: Vector) -> Self {
        Self::MissingEntity {
            entity: "building",
            vector,
        }
    }
}
