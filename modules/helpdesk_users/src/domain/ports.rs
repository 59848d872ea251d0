use async_trait::async_trait;

use crate::contract::model::{User, UserId};
use crate::domain::error::DirectoryError;
use crate::domain::outcome::Summary;

/// Transport-agnostic access to the helpdesk's user records:
/// 1) search by email (GET)
/// 2) clear the suspended flag (PUT)
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// First user matching `email`, or `None` when the search is empty.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    /// Set `suspended = false` on the user. Any accepted update is a success;
    /// the updated record is returned when the platform echoes one back.
    /// Safe to call on an active user.
    async fn unsuspend(&self, id: UserId) -> Result<Option<User>, DirectoryError>;
}

/// Progress of a batch, emitted as the service moves through each address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    BatchStarted { total: usize },
    Checking { email: String },
    UserFound { user: User },
    NotFound { email: String },
    Unsuspending { user: User },
    Unsuspended { email: String },
    AlreadyActive { email: String },
    Failed { email: String, error: DirectoryError },
    BatchFinished { summary: Summary },
}

/// Output port: observe progress events (no knowledge of the terminal).
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Reporter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _event: &ProgressEvent) {}
}
