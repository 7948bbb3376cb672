//! Creator pages and the appointment request action.

pub mod agenda;
pub mod appointments;
pub mod dashboard;
