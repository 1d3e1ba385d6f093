//! Property listing and search endpoints

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{Pagination, Property, PropertyPage};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Sort choices offered by the search screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Recent,
    PriceAsc,
    PriceDesc,
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recent" => Ok(SortKey::Recent),
            "price_asc" | "price-asc" => Ok(SortKey::PriceAsc),
            "price_desc" | "price-desc" => Ok(SortKey::PriceDesc),
            _ => Err(()),
        }
    }
}

/// Search filters for `GET /properties`
///
/// Only fields that are set are sent. Amenities become repeated keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyQuery {
    pub all: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub city: Option<String>,
    pub search_query: Option<String>,
    pub amenities: Vec<String>,
}

impl PropertyQuery {
    pub fn sorted(mut self, key: SortKey) -> Self {
        let (field, order) = match key {
            SortKey::Recent => ("createdAt", SortOrder::Desc),
            SortKey::PriceAsc => ("price", SortOrder::Asc),
            SortKey::PriceDesc => ("price", SortOrder::Desc),
        };
        self.sort_by = Some(field.to_string());
        self.order = Some(order);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                pairs.push((key.to_string(), value));
            }
        };
        push("all", self.all.map(|v| v.to_string()));
        push("page", self.page.map(|v| v.to_string()));
        push("limit", self.limit.map(|v| v.to_string()));
        push("sortBy", self.sort_by.clone());
        push("order", self.order.map(|v| v.to_string()));
        push("priceMin", self.price_min.map(|v| v.to_string()));
        push("priceMax", self.price_max.map(|v| v.to_string()));
        push("bedrooms", self.bedrooms.map(|v| v.to_string()));
        push("bathrooms", self.bathrooms.map(|v| v.to_string()));
        push("propertyType", self.property_type.clone());
        push("status", self.status.clone());
        push("city", self.city.clone());
        push("searchQuery", self.search_query.clone());
        for amenity in &self.amenities {
            push("amenities", Some(amenity.clone()));
        }
        pairs
    }
}

/// `data` of a search response: paginated object, or a bare array with `all=true`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    Page(PropertyPage),
    All(Vec<Property>),
}

#[derive(Clone)]
pub struct PropertiesApi {
    client: ApiClient,
}

impl PropertiesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PropertyQuery) -> Result<PropertyPage> {
        let request = ApiRequest::get("/properties")
            .public()
            .query_pairs(query.to_query_pairs());
        let listing: Listing = self.client.fetch(request).await?;
        Ok(match listing {
            Listing::Page(page) => page,
            Listing::All(properties) => PropertyPage {
                pagination: Some(Pagination {
                    total: properties.len() as u64,
                    page: 1,
                    pages: 1,
                    limit: properties.len() as u32,
                }),
                properties,
            },
        })
    }

    pub async fn get(&self, id: &str) -> Result<Property> {
        self.client
            .fetch(ApiRequest::get(format!("/properties/{}", id)))
            .await
    }

    pub async fn similar(&self, id: &str) -> Result<Vec<Property>> {
        self.client
            .fetch(ApiRequest::get(format!("/properties/similar-prop/{}", id)))
            .await
    }

    pub async fn featured(&self) -> Result<Vec<Property>> {
        self.client
            .fetch(ApiRequest::get("/properties/featured"))
            .await
    }

    pub async fn newest(&self) -> Result<Vec<Property>> {
        self.client.fetch(ApiRequest::get("/properties/new")).await
    }
}
