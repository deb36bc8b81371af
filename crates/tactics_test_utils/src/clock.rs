//! Manual time for sessions under test.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tactics_client::prelude::{Clock, Session};

/// Upper bound on pump rounds in [`drive`], so a stuck session fails the
/// test instead of hanging it.
const MAX_ROUNDS: usize = 100_000;

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    /// A clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.0.set(self.0.get() + delta);
    }

    /// Jump to `now`. Never moves backwards.
    pub fn set(&self, now: Duration) {
        self.0.set(self.0.get().max(now));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Pump `session`, jumping `clock` from deadline to deadline, until the
/// session is idle or nothing can progress (e.g. while paused).
///
/// Returns the session time that passed.
///
/// # Panics
///
/// Panics if the session does not settle within a generous number of
/// rounds.
pub fn drive(session: &mut Session, clock: &ManualClock) -> Duration {
    let start = clock.now();
    for _ in 0..MAX_ROUNDS {
        session.pump();
        if session.is_idle() {
            return clock.now() - start;
        }
        match session.next_deadline() {
            Some(deadline) => clock.set(deadline),
            None => return clock.now() - start,
        }
    }
    panic!("Session did not settle after {MAX_ROUNDS} rounds: {session:?}");
}

/// Pump `session` while advancing `clock` by at most `budget`, stopping at
/// every deadline on the way.
pub fn advance(session: &mut Session, clock: &ManualClock, budget: Duration) {
    let end = clock.now() + budget;
    loop {
        session.pump();
        match session.next_deadline() {
            Some(deadline) if deadline <= end => clock.set(deadline),
            _ => break,
        }
    }
    clock.set(end);
    session.pump();
}
