//! Profile endpoints

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::User;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Editable account fields; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.phone.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Clone)]
pub struct ProfileApi {
    client: ApiClient,
}

impl ProfileApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<User> {
        let request = ApiRequest::patch("/users/me").json(update)?;
        let response: UserResponse = self.client.fetch(request).await?;
        Ok(response.user)
    }

    /// Upload a new avatar image
    pub async fn upload_avatar(&self, path: &Path) -> Result<User> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar".to_string());
        let request =
            ApiRequest::post("/auth/me/avatar").file("avatar", file_name, bytes, mime_for(path));
        let response: UserResponse = self.client.fetch(request).await?;
        Ok(response.user)
    }
}

fn mime_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mime.to_string())
}
