//! Small REST client toolkit.
//!
//! Provides [`TracedClient`], a `reqwest::Client` bound to a base URL and
//! optional basic-auth credentials, which wraps every outgoing call in an
//! `outgoing_http` tracing span and decodes JSON bodies.

pub mod client;
pub mod error;

pub use client::{decode_body, TracedClient, TracedClientBuilder};
pub use error::ClientError;
pub use reqwest::StatusCode;
