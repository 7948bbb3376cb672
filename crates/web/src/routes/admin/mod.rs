//! Administrator pages and actions.
//!
//! Everything here sits behind the `admin` role; the gate turns other
//! sessions away before these handlers run, and [`RequireAdmin`] checks again.
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

pub mod agenda;
pub mod dashboard;
pub mod podcasts;
pub mod users;
