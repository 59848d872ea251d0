//! Locate helpdesk users by email and reinstate suspended accounts.
//!
//! The [`domain::service::Service`] drives one lookup, and at most one
//! update, per address through the [`domain::ports::UserDirectory`] port.
//! [`infra::zendesk::ZendeskDirectory`] implements the port over the REST
//! API; [`reporting::ConsoleReporter`] renders progress for the terminal.

// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::model::{User, UserId};

pub mod domain;
pub mod infra;
pub mod reporting;

pub use domain::error::DirectoryError;
pub use domain::outcome::{Outcome, OutcomeStatus, Resolution, Summary};
pub use domain::ports::{ProgressEvent, Reporter, UserDirectory};
pub use domain::service::Service;
