//! HTTP client module
//!
//! `ApiClient` wraps reqwest, attaches the session's bearer token and runs
//! the refresh-and-replay protocol when the backend rejects a token.

use crate::config::Config;
use crate::error::{EstateError, Result};
use crate::session::AuthSession;
use crate::utils::UrlUtils;
use log::debug;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub mod auth;
pub mod request;
pub mod response;

pub use request::{ApiRequest, RequestBody};
pub use response::{decode_payload, Envelope};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Authenticated API client
///
/// Cheap to clone; clones share the connection pool, cookie jar and session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<Config>,
    session: Arc<AuthSession>,
}

impl ApiClient {
    /// Create a new API client with the given configuration and session
    pub fn new(config: Config, session: Arc<AuthSession>) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            // holds the httpOnly refresh cookie set by the backend
            .cookie_store(true);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().map_err(EstateError::Http)?;
        Ok(Self {
            client,
            config: Arc::new(config),
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Send a request, refreshing the token and replaying once on an authentication failure
    pub async fn send(&self, mut request: ApiRequest) -> Result<Response> {
        let sent_with = if request.authenticated {
            self.session.token()
        } else {
            None
        };
        let response = self.dispatch(&request, sent_with.as_deref()).await?;
        if !self.needs_refresh(&request, response.status()) {
            return Ok(response);
        }

        request.mark_retried();
        let token = self
            .session
            .refresh_after_failure(sent_with.as_deref(), || self.request_new_token())
            .await?;

        debug!("Replaying {} {}", request.method, request.path);
        self.dispatch(&request, Some(&token)).await
    }

    /// Send a request and turn non-success statuses into `EstateError::Api`
    pub async fn execute(&self, request: ApiRequest) -> Result<Response> {
        let response = self.send(request).await?;
        check_status(response).await
    }

    /// Send a request and decode its (optionally enveloped) JSON payload
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        decode_payload(read_json(response).await?)
    }

    /// Send a request whose response body is not needed
    pub async fn perform(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await?;
        Ok(())
    }

    /// Call the refresh endpoint. The refresh cookie rides along in the cookie jar.
    pub async fn request_new_token(&self) -> Result<String> {
        let request = ApiRequest::post(self.config.refresh_path.clone())
            .public()
            .json(&json!({}))?;
        let response = self.dispatch(&request, None).await?;
        let response = check_status(response).await?;
        let body: RefreshResponse = decode_payload(read_json(response).await?)?;
        if body.access_token.is_empty() {
            return Err(EstateError::Auth(
                "refresh response did not contain a token".to_string(),
            ));
        }
        Ok(body.access_token)
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let built = request.build(&self.client, &self.config, token)?;
        debug!("> {} {}", built.method(), built.url());
        let response = self.client.execute(built).await.map_err(EstateError::Http)?;
        debug!("< {} {}", response.status().as_u16(), request.path);
        Ok(response)
    }

    fn needs_refresh(&self, request: &ApiRequest, status: StatusCode) -> bool {
        let auth_failure = status == StatusCode::UNAUTHORIZED
            || (status == StatusCode::FORBIDDEN && self.config.refresh_on_forbidden);
        if !auth_failure || !request.authenticated || request.is_retried() {
            return false;
        }
        let url = self.config.endpoint(&request.path);
        !UrlUtils::same_endpoint(&url, &self.config.refresh_url())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(EstateError::Api {
        status: status.as_u16(),
        message: response::error_message(status, &body),
    })
}

async fn read_json(response: Response) -> Result<Value> {
    let bytes = response.bytes().await.map_err(EstateError::Http)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
