//! Core types for the podcast platform.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{Role, RoleError};
pub use slug::{Slug, SlugError};
pub use status::AppointmentState;
