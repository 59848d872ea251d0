use async_trait::async_trait;
use restkit::{decode_body, ClientError, TracedClient};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::contract::model::{User, UserId};
use crate::domain::error::DirectoryError;
use crate::domain::ports::UserDirectory;

/// HTTP adapter implementing the UserDirectory port over the Zendesk
/// Support API (`/api/v2`). The client must already carry the base URL and
/// the `<agent-email>/token` credentials.
#[derive(Clone)]
pub struct ZendeskDirectory {
    client: TracedClient,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Serialize)]
struct UpdateRequest {
    user: SuspensionPatch,
}

#[derive(Debug, Serialize)]
struct SuspensionPatch {
    suspended: bool,
}

impl ZendeskDirectory {
    pub fn new(client: TracedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserDirectory for ZendeskDirectory {
    #[instrument(
        name = "helpdesk_users.http.zendesk.search_users",
        skip_all,
        fields(base = %self.client.base_url(), email = %email)
    )]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let response: SearchResponse = self
            .client
            .get_json("users/search.json", &[("query", email)])
            .await
            .map_err(DirectoryError::from)?;

        let matches = response.users.len();
        let first = response.users.into_iter().next();
        if let Some(user) = &first {
            if matches > 1 && !is_exact_match(user, email) {
                warn!(
                    matches,
                    first_email = user.email.as_deref().unwrap_or_default(),
                    "search returned several users and the first is not an exact match"
                );
            }
        }

        Ok(first)
    }

    #[instrument(
        name = "helpdesk_users.http.zendesk.unsuspend_user",
        skip_all,
        fields(base = %self.client.base_url(), user_id = %id)
    )]
    async fn unsuspend(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        let body = UpdateRequest {
            user: SuspensionPatch { suspended: false },
        };

        let payload = self
            .client
            .put_text(&format!("users/{}.json", id), &body)
            .await
            .map_err(DirectoryError::from)?;

        match decode_body::<UserEnvelope>(payload) {
            Ok(envelope) => Ok(Some(envelope.user)),
            Err(e) => {
                warn!(error = %e, "update accepted without a user record in the response");
                Ok(None)
            }
        }
    }
}

fn is_exact_match(user: &User, email: &str) -> bool {
    user.email
        .as_deref()
        .is_some_and(|found| found.eq_ignore_ascii_case(email))
}

impl From<ClientError> for DirectoryError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Status { status, body } => Self::remote(status.as_u16(), body),
            ClientError::Decode { source, .. } => Self::invalid_response(source.to_string()),
            other => Self::transport(other.to_string()),
        }
    }
}
