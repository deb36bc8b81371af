//! State fingerprints.
//!
//! Two sessions that processed the same responses must end with the same
//! map and the same last response, no matter how fast they played the
//! animations. A fingerprint captures exactly that part of the state as
//! bytes, so comparisons do not depend on `PartialEq` of every nested type.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use tactics_client::prelude::State;
use tactics_rules::prelude::{ActionResponse, MapData};

/// The committed part of a client state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Serialized map and last response.
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct Committed<'a> {
    map: &'a MapData,
    last: Option<&'a ActionResponse>,
}

impl Fingerprint {
    /// Fingerprint of `state`.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be serialized.
    #[must_use]
    pub fn of(state: &State) -> Self {
        let committed = Committed {
            map: &state.map,
            last: state.last_action_response.as_ref(),
        };
        let bytes = bincode::serialize(&committed).expect("state serializes");
        Self { bytes }
    }

    /// A short hash for log output.
    #[must_use]
    pub fn hash64(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.bytes.hash(&mut hasher);
        hasher.finish()
    }

    /// Assert that `self` and `other` match.
    ///
    /// # Panics
    ///
    /// Panics with both hashes if the fingerprints differ.
    pub fn assert_matches(&self, other: &Self) {
        assert!(
            self == other,
            "States diverged!\n\
             Left:  {:016x} ({} bytes)\n\
             Right: {:016x} ({} bytes)",
            self.hash64(),
            self.bytes.len(),
            other.hash64(),
            other.bytes.len()
        );
    }
}
