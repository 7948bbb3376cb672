//! Podcast Core - Shared types library.
//!
//! This crate provides common types used across all podcast platform components:
//! - `web` - Server application (public pages, admin area, user area)
//! - `cli` - Command-line tools for migrations, accounts and local sessions
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, roles, slugs and statuses
//! - [`session`] - Session claims and the session store abstraction

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod session;
pub mod types;

pub use session::{SESSION_TTL_SECONDS, SessionClaim, SessionStore};
pub use types::*;
