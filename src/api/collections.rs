//! Collection endpoints

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{Collection, CollectionItem};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
struct CollectionList {
    #[serde(default)]
    collections: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
struct CreatedCollection {
    collection: Collection,
}

#[derive(Debug, Default, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<CollectionItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCollection<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_default: Option<bool>,
}

#[derive(Clone)]
pub struct CollectionsApi {
    client: ApiClient,
}

impl CollectionsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Collection>> {
        let list: Option<CollectionList> =
            self.client.fetch(ApiRequest::get("/collections")).await?;
        Ok(list.map(|l| l.collections).unwrap_or_default())
    }

    pub async fn create(&self, name: &str, is_default: Option<bool>) -> Result<Collection> {
        let request = ApiRequest::post("/collections").json(&NewCollection { name, is_default })?;
        let created: CreatedCollection = self.client.fetch(request).await?;
        Ok(created.collection)
    }

    pub async fn add_item(&self, collection_id: &str, property_id: &str) -> Result<()> {
        let request =
            ApiRequest::post(items_path(collection_id)).json(&json!({ "propertyId": property_id }))?;
        self.client.perform(request).await
    }

    pub async fn remove_item(&self, collection_id: &str, property_id: &str) -> Result<()> {
        let request = ApiRequest::delete(items_path(collection_id))
            .json(&json!({ "propertyId": property_id }))?;
        self.client.perform(request).await
    }

    pub async fn list_items(&self, collection_id: &str) -> Result<Vec<CollectionItem>> {
        let list: Option<ItemList> = self
            .client
            .fetch(ApiRequest::get(items_path(collection_id)))
            .await?;
        Ok(list.map(|l| l.items).unwrap_or_default())
    }
}

fn items_path(collection_id: &str) -> String {
    format!("/collections/{}/items", collection_id)
}
