//! Favorite endpoints

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{PropertyRef, PropertySummary};
use serde::Deserialize;
use serde_json::json;

const FAVORITES_PATH: &str = "/v2/favorites";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteCheck {
    #[serde(default)]
    is_favorite: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct FavoriteEntry {
    #[serde(rename = "propertyId", default)]
    property: Option<PropertyRef>,
}

#[derive(Clone)]
pub struct FavoritesApi {
    client: ApiClient,
}

impl FavoritesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Whether the signed-in user has favorited the property. A missing flag reads as `false`.
    pub async fn check(&self, property_id: &str) -> Result<bool> {
        let path = format!("{}/{}", FAVORITES_PATH, property_id);
        let check: Option<FavoriteCheck> = self.client.fetch(ApiRequest::get(path)).await?;
        Ok(check.and_then(|c| c.is_favorite).unwrap_or(false))
    }

    pub async fn add(&self, property_id: &str) -> Result<()> {
        let request = ApiRequest::post(FAVORITES_PATH).json(&json!({ "propertyId": property_id }))?;
        self.client.perform(request).await
    }

    pub async fn remove(&self, property_id: &str) -> Result<()> {
        let request =
            ApiRequest::delete(FAVORITES_PATH).json(&json!({ "propertyId": property_id }))?;
        self.client.perform(request).await
    }

    /// Favorited properties of a user. Entries whose property is no longer populated are skipped.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PropertySummary>> {
        let path = format!("/favorites/{}", user_id);
        let entries: Option<Vec<FavoriteEntry>> = self.client.fetch(ApiRequest::get(path)).await?;
        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry.property {
                Some(PropertyRef::Populated(summary)) => Some(summary),
                _ => None,
            })
            .collect())
    }
}
