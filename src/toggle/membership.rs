//! Backends for optimistic toggles

use crate::api::{CollectionsApi, FavoritesApi};
use crate::error::Result;
use std::future::Future;

/// A user-to-property relationship that can be read, added and removed
pub trait Membership: Send + Sync {
    fn check(&self) -> impl Future<Output = Result<bool>> + Send;
    fn add(&self) -> impl Future<Output = Result<()>> + Send;
    fn remove(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Favorite flag of one property
#[derive(Clone)]
pub struct FavoriteMembership {
    api: FavoritesApi,
    property_id: String,
}

impl FavoriteMembership {
    pub fn new(api: FavoritesApi, property_id: impl Into<String>) -> Self {
        Self {
            api,
            property_id: property_id.into(),
        }
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }
}

impl Membership for FavoriteMembership {
    async fn check(&self) -> Result<bool> {
        self.api.check(&self.property_id).await
    }

    async fn add(&self) -> Result<()> {
        self.api.add(&self.property_id).await
    }

    async fn remove(&self) -> Result<()> {
        self.api.remove(&self.property_id).await
    }
}

/// Presence of one property in one collection
#[derive(Clone)]
pub struct CollectionMembership {
    api: CollectionsApi,
    collection_id: String,
    property_id: String,
}

impl CollectionMembership {
    pub fn new(
        api: CollectionsApi,
        collection_id: impl Into<String>,
        property_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            collection_id: collection_id.into(),
            property_id: property_id.into(),
        }
    }
}

impl Membership for CollectionMembership {
    async fn check(&self) -> Result<bool> {
        let items = self.api.list_items(&self.collection_id).await?;
        Ok(items
            .iter()
            .any(|item| item.property.id() == self.property_id))
    }

    async fn add(&self) -> Result<()> {
        self.api
            .add_item(&self.collection_id, &self.property_id)
            .await
    }

    async fn remove(&self) -> Result<()> {
        self.api
            .remove_item(&self.collection_id, &self.property_id)
            .await
    }
}
