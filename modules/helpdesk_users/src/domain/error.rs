use thiserror::Error;

/// Failure of a call to the user directory. "No such user" is not an error;
/// lookups report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Request failed with status code {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Unexpected response: {message}")]
    InvalidResponse { message: String },
}

impl DirectoryError {
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
