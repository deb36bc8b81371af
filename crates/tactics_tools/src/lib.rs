//! # Tactics Tools
//!
//! Development tools for the tactics client: a headless replay runner for
//! recorded games and a validator for client configuration files.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod replay;
pub mod validate;
