//! Error types for the rules engine.

use thiserror::Error;

use crate::vector::Vector;

/// Result type alias using [`RulesError`].
pub type Result<T> = std::result::Result<T, RulesError>;

/// A rule violation or malformed request against a map snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    /// The game already has a winner.
    #[error("Game has already ended")]
    GameEnded,

    /// No unit at the given position.
    #[error("No unit at {0}")]
    NoUnit(Vector),

    /// No building at the given position.
    #[error("No building at {0}")]
    NoBuilding(Vector),

    /// The entity belongs to a player other than the one whose turn it is.
    #[error("Entity at {vector} is not controlled by player {player}")]
    NotControlled {
        /// Position of the entity.
        vector: Vector,
        /// The player whose turn it is.
        player: u8,
    },

    /// The unit already moved or already completed its turn.
    #[error("Unit at {0} cannot act anymore this turn")]
    AlreadyActed(Vector),

    /// The target position is not reachable or not a valid target.
    #[error("Invalid target {to} from {from}")]
    InvalidTarget {
        /// Origin of the action.
        from: Vector,
        /// Rejected target.
        to: Vector,
    },

    /// The vector lies outside of the map.
    #[error("Vector {0} is outside of the map")]
    OutOfBounds(Vector),

    /// The entity lacks the capability required for the action.
    #[error("Entity at {vector} cannot {capability}")]
    MissingCapability {
        /// Position of the entity.
        vector: Vector,
        /// The missing capability, e.g. "capture".
        capability: &'static str,
    },

    /// Not enough funds.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Funds required.
        required: u32,
        /// Funds available.
        available: u32,
    },

    /// No player with this id exists on the map.
    #[error("Unknown player {0}")]
    UnknownPlayer(u8),

    /// A hidden response was applied without vision information.
    #[error("Hidden responses must be applied through apply_hidden_action_response")]
    HiddenResponse,

    /// The response kind cannot be applied to a map.
    #[error("Response cannot be applied: {0}")]
    Unsupported(&'static str),
}
