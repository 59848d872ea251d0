//! Traced HTTP client bound to a base URL.
//!
//! Every request goes through [`TracedClient::execute`], which opens an
//! `outgoing_http` span and records the response status on it. Paths passed to
//! the convenience methods are resolved relative to the base URL, so a base of
//! `https://acme.example.com/api/v2` and a path of `users/1.json` end up at
//! `https://acme.example.com/api/v2/users/1.json`.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{field, Instrument, Level};
use url::Url;

use crate::error::ClientError;

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// HTTP client preconfigured with a base URL and optional basic-auth
/// credentials. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TracedClient {
    inner: reqwest::Client,
    base_url: Url,
    auth: Option<BasicAuth>,
}

impl TracedClient {
    /// Wrap an existing reqwest client without credentials.
    pub fn new(inner: reqwest::Client, base_url: Url) -> Self {
        Self {
            inner,
            base_url: with_trailing_slash(base_url),
            auth: None,
        }
    }

    pub fn builder(base_url: Url) -> TracedClientBuilder {
        TracedClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL. A leading `/` is ignored so the
    /// base path is never dropped.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::invalid_url(path, e))
    }

    /// Create a request builder for `path` with credentials already applied.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(path)?;
        let builder = self.inner.request(method, url);
        Ok(match &self.auth {
            Some(auth) => builder.basic_auth(&auth.username, Some(&auth.password)),
            None => builder,
        })
    }

    /// Execute a built request inside an `outgoing_http` span.
    pub async fn execute(&self, req: Request) -> Result<Response, ClientError> {
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            otel.kind = "client",
            http.status_code = field::Empty,
            error = field::Empty,
        );
        let recorder = span.clone();

        async move {
            let response = self.inner.execute(req).await?;

            let status = response.status();
            recorder.record("http.status_code", status.as_u16());
            if status.is_client_error() || status.is_server_error() {
                recorder.record("error", true);
            }
            tracing::debug!(status = status.as_u16(), "response received");

            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Send a prepared request and decode a JSON body from a 2xx response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.execute(builder.build()?).await?;
        decode_json(response).await
    }

    /// GET `path` with query parameters and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let builder = self.request(Method::GET, path)?.query(query);
        self.send_json(builder).await
    }

    /// PUT a JSON body to `path` and return the raw body of a 2xx response.
    /// For endpoints whose reply is optional to the caller; see [`decode_body`].
    pub async fn put_text<B>(&self, path: &str, body: &B) -> Result<String, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PUT, path)?.json(body);
        let response = self.execute(builder.build()?).await?;
        success_body(response).await
    }
}

/// Builder for [`TracedClient`].
#[derive(Debug)]
pub struct TracedClientBuilder {
    base_url: Url,
    auth: Option<BasicAuth>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl TracedClientBuilder {
    fn new(base_url: Url) -> Self {
        Self {
            base_url,
            auth: None,
            timeout: None,
            user_agent: None,
        }
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<TracedClient, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(TracedClient {
            inner: builder.build()?,
            base_url: with_trailing_slash(self.base_url),
            auth: self.auth,
        })
    }
}

async fn success_body(response: Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::status(status, body));
    }
    Ok(body)
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    decode_body(success_body(response).await?)
}

/// Decode a JSON payload, keeping the raw text on failure.
pub fn decode_body<T: DeserializeOwned>(body: String) -> Result<T, ClientError> {
    serde_json::from_str(&body).map_err(|source| ClientError::Decode { body, source })
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
