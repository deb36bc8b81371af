//! # Tactics Client
//!
//! Interaction and animation core of the tactics game client.
//!
//! This crate contains **only** client logic:
//! - No rendering
//! - No networking stack
//! - No async runtime
//!
//! A [`Session`](session::Session) owns the client [`State`](state::State)
//! and is the only way to change it. Input is routed to the active
//! [`Behavior`](behavior::Behavior), actions are dispatched optimistically
//! to a remote [`ActionTransport`](events::ActionTransport), and
//! authoritative responses are replayed through the animation queue before
//! they are committed to the map.
//!
//! The host drives everything by calling
//! [`Session::pump`](session::Session::pump) on each frame. Time comes from
//! a [`Clock`](scheduler::Clock), so tests and headless tools can run the
//! whole pipeline on a manual clock.
//!
//! ## Crate Structure
//!
//! - [`state`] - Client state and its reducer
//! - [`behavior`] - Interaction modes and menus
//! - [`session`] - The session API, timers and frames
//! - [`dispatch`] - Optimistic action dispatch and reconciliation
//! - [`processor`] - Serial processing of response batches
//! - [`routines`] - Animation sequences per response kind
//! - [`animation`] - Animation descriptors and the per-field queue
//! - [`scheduler`] - Pausable timer registry
//! - [`input`] - Input events
//! - [`config`] - Behavior defaults and animation profiles
//! - [`editor`] - Map editor state

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod animation;
pub mod behavior;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod events;
pub mod input;
pub mod processor;
pub mod radius;
pub mod routines;
pub mod scheduler;
pub mod session;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::animation::{
        Animation, AnimationEntry, AnimationId, AnimationKey, AnimationQueue, Banner, FlashReason,
    };
    pub use crate::behavior::{Behavior, BehaviorKind, Menu, MenuChoice, TargetEntity};
    pub use crate::config::{AnimationProfile, ClientConfig, ProfileKind};
    pub use crate::dispatch::{Dispatched, RemoteHandle};
    pub use crate::editor::{Brush, EditorState};
    pub use crate::error::{ClientError, Result};
    pub use crate::events::{
        ActionTransport, GameActionResponse, OfflineTransport, RemoteResult, SessionEvent,
        StaticViewport, TransportError, Viewport,
    };
    pub use crate::input::InputEvent;
    pub use crate::radius::{RadiusInfo, RadiusType};
    pub use crate::scheduler::{Clock, Scheduler, SystemClock, TimerId};
    pub use crate::session::{Session, Task};
    pub use crate::state::{ConfirmAction, GameInfo, State, StateUpdate};
}
