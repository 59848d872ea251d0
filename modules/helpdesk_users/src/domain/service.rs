use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::contract::model::User;
use crate::domain::error::DirectoryError;
use crate::domain::outcome::{Outcome, Resolution, Summary};
use crate::domain::ports::{ProgressEvent, Reporter, UserDirectory};

/// Domain service that reinstates suspended users.
/// Depends only on the directory and reporter ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    directory: Arc<dyn UserDirectory>,
    reporter: Arc<dyn Reporter>,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(directory: Arc<dyn UserDirectory>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            directory,
            reporter,
        }
    }

    /// Look up one address and unsuspend the match if needed.
    ///
    /// Never fails: directory errors are folded into [`Resolution::Error`].
    #[instrument(
        name = "helpdesk_users.service.check_and_unsuspend",
        skip(self),
        fields(email = %email)
    )]
    pub async fn check_and_unsuspend(&self, email: &str) -> Outcome {
        self.reporter.report(&ProgressEvent::Checking {
            email: email.to_string(),
        });

        let resolution = match self.resolve(email).await {
            Ok(resolution) => resolution,
            Err(error) => {
                warn!(error = %error, "processing failed");
                let message = error.to_string();
                self.reporter.report(&ProgressEvent::Failed {
                    email: email.to_string(),
                    error,
                });
                Resolution::Error(message)
            }
        };

        Outcome::new(email, resolution)
    }

    async fn resolve(&self, email: &str) -> Result<Resolution, DirectoryError> {
        let Some(user) = self.directory.find_by_email(email).await? else {
            debug!("no user matched");
            self.reporter.report(&ProgressEvent::NotFound {
                email: email.to_string(),
            });
            return Ok(Resolution::NotFound);
        };

        debug!(user_id = %user.id, suspended = user.suspended, "user matched");
        self.reporter
            .report(&ProgressEvent::UserFound { user: user.clone() });

        if !user.suspended {
            self.reporter.report(&ProgressEvent::AlreadyActive {
                email: email.to_string(),
            });
            return Ok(Resolution::AlreadyActive(user));
        }

        self.reporter
            .report(&ProgressEvent::Unsuspending { user: user.clone() });
        self.unsuspend(&user).await?;

        info!(user_id = %user.id, "user unsuspended");
        self.reporter.report(&ProgressEvent::Unsuspended {
            email: email.to_string(),
        });
        Ok(Resolution::Unsuspended(user))
    }

    async fn unsuspend(&self, user: &User) -> Result<(), DirectoryError> {
        let updated = self.directory.unsuspend(user.id).await?;
        if updated.is_some_and(|u| u.suspended) {
            warn!(user_id = %user.id, "update acknowledged but record still reports suspended");
        }
        Ok(())
    }

    /// Process every address strictly one after another and return the
    /// outcomes in input order. Entries are trimmed; empty ones are still
    /// looked up so the output lines up with the input.
    #[instrument(
        name = "helpdesk_users.service.process_emails",
        skip(self, emails),
        fields(total = emails.len())
    )]
    pub async fn process_emails<S>(&self, emails: &[S]) -> Vec<Outcome>
    where
        S: AsRef<str> + Sync,
    {
        info!("Processing batch");
        self.reporter.report(&ProgressEvent::BatchStarted {
            total: emails.len(),
        });

        let mut outcomes = Vec::with_capacity(emails.len());
        for raw in emails {
            outcomes.push(self.check_and_unsuspend(raw.as_ref().trim()).await);
        }

        let summary = Summary::from_outcomes(&outcomes);
        info!(
            total = summary.total,
            unsuspended = summary.unsuspended,
            already_active = summary.already_active,
            not_found = summary.not_found,
            errors = summary.errors,
            "Batch finished"
        );
        self.reporter
            .report(&ProgressEvent::BatchFinished { summary });

        outcomes
    }
}
