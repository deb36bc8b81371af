//! Animation queue.
//!
//! The queue is the ledger of what is currently playing. At most one
//! animation is active per [`AnimationKey`]; a second animation inserted on
//! an occupied key waits until the active one completes. Completion
//! callbacks are not stored here. The session keeps them by
//! [`AnimationId`] so the queue itself stays plain data.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tactics_rules::prelude::{Building, PlayerId, Skill, Unit, UnitKind, Vector};

/// Queue key: a map position or a synthetic id for animations that are
/// not tied to a field, such as turn banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnimationKey {
    /// A map position.
    Position(Vector),
    /// A non-positional animation.
    Synthetic(u64),
}

impl From<Vector> for AnimationKey {
    fn from(vector: Vector) -> Self {
        Self::Position(vector)
    }
}

/// Identity of one queued animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

/// Banner content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Banner {
    /// A new turn begins.
    Turn {
        /// The player whose turn starts.
        player: PlayerId,
        /// The round number.
        round: u32,
    },
    /// A player received funds outside of turn income.
    Reward {
        /// Receiver.
        player: PlayerId,
        /// Amount.
        funds: u32,
    },
    /// A skill was bought.
    Skill {
        /// Buyer.
        player: PlayerId,
        /// The skill.
        skill: Skill,
    },
    /// The game is over.
    GameOver {
        /// The winner, `None` for a draw.
        winner: Option<PlayerId>,
    },
}

/// Why a flash is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlashReason {
    /// The player cannot afford the action.
    InsufficientFunds,
    /// Nothing to target.
    NoTargets,
    /// No free field to place a unit on.
    NoSpace,
    /// A move stopped short of its destination.
    Blocked,
}

/// A visual effect descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Animation {
    /// A unit walking along `path`, starting at `from`.
    Move {
        /// Start of the walk.
        from: Vector,
        /// Fields visited after `from`.
        path: Vec<Vector>,
        /// The walking unit.
        unit: Unit,
    },
    /// A unit striking towards `target`.
    Attack {
        /// The attacked field.
        target: Vector,
    },
    /// A health bar animating to `health`.
    Damage {
        /// Health after the hit.
        health: u8,
    },
    /// A unit or building being destroyed.
    Explosion {
        /// The destroyed unit, `None` for buildings and hidden entities.
        unit: Option<UnitKind>,
    },
    /// A unit being healed to `health`.
    Heal {
        /// Health after healing.
        health: u8,
    },
    /// A neutral unit joining `player`.
    Rescue {
        /// The new owner.
        player: PlayerId,
    },
    /// A unit being sabotaged down to `health`.
    Sabotage {
        /// Health after sabotage.
        health: u8,
    },
    /// A building changing hands.
    Capture {
        /// The new owner.
        player: PlayerId,
    },
    /// A long range unit folding or unfolding.
    Fold {
        /// Whether the unit ends unfolded.
        unfolded: bool,
    },
    /// A barrier being raised or lowered.
    Barrier {
        /// Whether the barrier ends active.
        active: bool,
    },
    /// A unit appearing.
    Spawn {
        /// The new unit.
        unit: Unit,
    },
    /// A building being constructed.
    Build {
        /// The new building.
        building: Building,
    },
    /// A full-screen banner.
    Banner {
        /// Banner content.
        banner: Banner,
    },
    /// A transient error-colored banner on a field.
    Flash {
        /// What went wrong.
        reason: FlashReason,
    },
}

impl Animation {
    /// Short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::Damage { .. } => "damage",
            Self::Explosion { .. } => "explosion",
            Self::Heal { .. } => "heal",
            Self::Rescue { .. } => "rescue",
            Self::Sabotage { .. } => "sabotage",
            Self::Capture { .. } => "capture",
            Self::Fold { .. } => "fold",
            Self::Barrier { .. } => "barrier",
            Self::Spawn { .. } => "spawn",
            Self::Build { .. } => "build",
            Self::Banner { .. } => "banner",
            Self::Flash { .. } => "flash",
        }
    }
}

/// A queued animation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationEntry {
    /// Identity used to match completion reports.
    pub id: AnimationId,
    /// What to play.
    pub animation: Animation,
}

/// Returned by [`AnimationQueue::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// The animation that finished.
    pub entry: AnimationEntry,
    /// The waiting animation that became active on the same key, if any.
    pub started: Option<AnimationId>,
}

/// The active animation on a key did not match a completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueMismatch {
    /// The animation actually active on the key.
    pub found: Option<AnimationId>,
}

/// Active and waiting animations by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationQueue {
    next_id: u64,
    next_synthetic: u64,
    active: BTreeMap<AnimationKey, AnimationEntry>,
    waiting: BTreeMap<AnimationKey, VecDeque<AnimationEntry>>,
}

impl AnimationQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh key for a non-positional animation.
    pub fn synthetic_key(&mut self) -> AnimationKey {
        let key = AnimationKey::Synthetic(self.next_synthetic);
        self.next_synthetic += 1;
        key
    }

    /// Queue `animation` on `key`.
    ///
    /// Returns its id and whether it became active immediately.
    pub fn insert(&mut self, key: AnimationKey, animation: Animation) -> (AnimationId, bool) {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        let entry = AnimationEntry { id, animation };
        if self.active.contains_key(&key) {
            self.waiting.entry(key).or_default().push_back(entry);
            (id, false)
        } else {
            self.active.insert(key, entry);
            (id, true)
        }
    }

    /// Finish the active animation `id` on `key` and promote the next
    /// waiting one.
    ///
    /// # Errors
    ///
    /// Returns [`QueueMismatch`] if `id` is not the active animation on
    /// `key`. The queue is left untouched in that case.
    pub fn complete(&mut self, key: AnimationKey, id: AnimationId) -> Result<Completed, QueueMismatch> {
        let found = self.active.get(&key).map(|entry| entry.id);
        if found != Some(id) {
            return Err(QueueMismatch { found });
        }
        let entry = self.active.remove(&key).ok_or(QueueMismatch { found: None })?;

        let next = self.waiting.get_mut(&key).and_then(VecDeque::pop_front);
        if self.waiting.get(&key).is_some_and(VecDeque::is_empty) {
            self.waiting.remove(&key);
        }
        let started = next.map(|next| {
            let id = next.id;
            self.active.insert(key, next);
            id
        });
        Ok(Completed { entry, started })
    }

    /// Whether `id` is the active animation on `key`.
    #[must_use]
    pub fn is_active(&self, key: AnimationKey, id: AnimationId) -> bool {
        self.active.get(&key).is_some_and(|entry| entry.id == id)
    }

    /// The active animation on `key`.
    #[must_use]
    pub fn get(&self, key: AnimationKey) -> Option<&AnimationEntry> {
        self.active.get(&key)
    }

    /// Animations waiting behind the active one on `key`.
    #[must_use]
    pub fn waiting(&self, key: AnimationKey) -> usize {
        self.waiting.get(&key).map_or(0, VecDeque::len)
    }

    /// Active animations in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&AnimationKey, &AnimationEntry)> {
        self.active.iter()
    }

    /// Number of active animations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is playing or waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.waiting.is_empty()
    }
}
