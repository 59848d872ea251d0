#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use helpdesk_users::{DirectoryError, ProgressEvent, Reporter, User, UserDirectory, UserId};

pub fn user(id: u64, email: &str, suspended: bool) -> User {
    User {
        id: UserId(id),
        name: format!("User {id}"),
        email: Some(email.to_string()),
        suspended,
    }
}

/// In-memory directory keyed by email, recording every call.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<String, User>>,
    failing_lookups: HashSet<String>,
    failing_updates: HashSet<UserId>,
    silent_updates: bool,
    sticky_suspension: bool,
    pub lookups: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<UserId>>,
}

impl InMemoryDirectory {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users
            .into_iter()
            .map(|u| (u.email.clone().unwrap_or_default(), u))
            .collect();
        Self {
            users: Mutex::new(map),
            ..Self::default()
        }
    }

    pub fn failing_lookup(mut self, email: &str) -> Self {
        self.failing_lookups.insert(email.to_string());
        self
    }

    pub fn failing_update(mut self, id: u64) -> Self {
        self.failing_updates.insert(UserId(id));
        self
    }

    /// Accept updates without echoing the record back.
    pub fn silent_updates(mut self) -> Self {
        self.silent_updates = true;
        self
    }

    /// Accept updates but keep reporting the user as suspended.
    pub fn sticky_suspension(mut self) -> Self {
        self.sticky_suspension = true;
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<UserId> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        self.lookups.lock().unwrap().push(email.to_string());
        if self.failing_lookups.contains(email) {
            return Err(DirectoryError::remote(500, "search unavailable"));
        }
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn unsuspend(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        self.updates.lock().unwrap().push(id);
        if self.failing_updates.contains(&id) {
            return Err(DirectoryError::transport("connection reset by peer"));
        }
        let mut users = self.users.lock().unwrap();
        let user = users
            .values_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DirectoryError::remote(404, "RecordNotFound"))?;
        user.suspended = self.sticky_suspension;
        Ok((!self.silent_updates).then(|| user.clone()))
    }
}

/// Reporter that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
