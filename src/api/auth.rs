//! Authentication endpoints

use crate::error::Result;
use crate::http::auth::Auth;
use crate::http::{ApiClient, ApiRequest};
use crate::models::User;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: User,
}

/// New account details for `/auth/registration`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Profile handed over by an OAuth provider after sign-in
#[derive(Debug, Clone, Serialize)]
pub struct OAuthProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: String,
    pub provider: String,
}

/// Credential, OAuth and password endpoints
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password and keep the returned access token
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = ApiRequest::post("/auth/v2/login")
            .public()
            .json(&json!({ "email": email, "password": password }))?;
        let response: LoginResponse = self.client.fetch(request).await?;
        self.client.session().set_token(&response.access_token)?;
        if let Some(exp) = Auth::token_expiry(&response.access_token) {
            debug!("Access token expires at {}", exp);
        }
        info!("Signed in as {}", email);
        Ok(response)
    }

    /// Sign out. Local credentials are cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        if let Err(err) = self.client.perform(ApiRequest::post("/auth/v2/logout")).await {
            warn!("Logout request failed: {}", err);
        }
        self.client.session().clear()
    }

    /// Currently signed-in user
    pub async fn me(&self) -> Result<User> {
        let response: MeResponse = self.client.fetch(ApiRequest::get("/auth/v2/me")).await?;
        Ok(response.user)
    }

    /// Force a token refresh. Joins an in-flight refresh instead of starting a second one.
    pub async fn refresh(&self) -> Result<String> {
        let session = self.client.session();
        let current = session.token();
        session
            .refresh_after_failure(current.as_deref(), || self.client.request_new_token())
            .await
    }

    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let request = ApiRequest::post("/auth/registration")
            .public()
            .json(registration)?;
        self.client.perform(request).await
    }

    /// Exchange an OAuth profile for a backend session
    pub async fn oauth_login(&self, profile: &OAuthProfile) -> Result<()> {
        let request = ApiRequest::post("/auth/oauth-login")
            .public()
            .json(profile)?;
        let body: Value = self.client.fetch(request).await?;
        let token = body
            .get("accessToken")
            .or_else(|| body.get("backendToken"))
            .and_then(Value::as_str);
        if let Some(token) = token {
            self.client.session().set_token(token)?;
        }
        info!("Signed in with {}", profile.provider);
        Ok(())
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        let request = ApiRequest::post("/auth/v2/change-password").json(&json!({
            "currentPassword": current_password,
            "newPassword": new_password,
        }))?;
        self.client.perform(request).await
    }

    /// Complete a password reset with the emailed token
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<Option<String>> {
        let request = ApiRequest::post("/auth/reset-password")
            .public()
            .json(&json!({ "token": token, "password": password }))?;
        let body: Value = self.client.fetch(request).await?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}
