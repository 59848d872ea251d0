use serde::{Serialize, Serializer};

use crate::contract::model::User;

/// Terminal state of processing one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    NotFound,
    Unsuspended,
    AlreadyActive,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unsuspended => "unsuspended",
            Self::AlreadyActive => "already_active",
            Self::Error => "error",
        }
    }
}

/// What happened to one address. A user record is carried exactly when the
/// lookup matched and nothing failed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    AlreadyActive(User),
    Unsuspended(User),
    Error(String),
}

/// Per-input classification produced by the batch runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub email: String,
    pub resolution: Resolution,
}

impl Outcome {
    pub fn new(email: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            email: email.into(),
            resolution,
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self.resolution {
            Resolution::NotFound => OutcomeStatus::NotFound,
            Resolution::AlreadyActive(_) => OutcomeStatus::AlreadyActive,
            Resolution::Unsuspended(_) => OutcomeStatus::Unsuspended,
            Resolution::Error(_) => OutcomeStatus::Error,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match &self.resolution {
            Resolution::AlreadyActive(user) | Resolution::Unsuspended(user) => Some(user),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct OutcomeRecord<'a> {
    email: &'a str,
    status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutcomeRecord {
            email: &self.email,
            status: self.status(),
            user: self.user(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub unsuspended: usize,
    pub already_active: usize,
    pub not_found: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome.status() {
                    OutcomeStatus::NotFound => summary.not_found += 1,
                    OutcomeStatus::Unsuspended => summary.unsuspended += 1,
                    OutcomeStatus::AlreadyActive => summary.already_active += 1,
                    OutcomeStatus::Error => summary.errors += 1,
                }
                summary
            })
    }
}
