//! Marketplace data models
//!
//! Field names follow the backend's camelCase JSON. Most fields are optional
//! because endpoints populate different subsets of each document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Signed-in user as returned by `/auth/v2/me`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub subrole: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Best available name for display
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Unknown user".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
}

/// Owner or assignee reference populated on a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Approved,
    Rejected,
    Pending,
    Rented,
    Sold,
    Deleted,
}

/// A property listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub purpose: Option<Purpose>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub owner: Option<Person>,
    #[serde(default)]
    pub total_area: Option<f64>,
    #[serde(default)]
    pub total_units: Option<u32>,
    #[serde(default)]
    pub total_bedrooms: Option<u32>,
    #[serde(default)]
    pub total_bathrooms: Option<u32>,
    #[serde(default)]
    pub total_garages: Option<u32>,
    #[serde(default)]
    pub total_kitchens: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub slider_images: Vec<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub financing_available: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub limit: u32,
}

/// One page of a property search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyPage {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Minimal property shape populated into collections and inquiries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Property reference that is either populated or a bare id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyRef {
    Populated(PropertySummary),
    Id(String),
}

impl PropertyRef {
    pub fn id(&self) -> &str {
        match self {
            PropertyRef::Populated(summary) => &summary.id,
            PropertyRef::Id(id) => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PropertyRef::Populated(summary) => {
                summary.title.as_deref().unwrap_or("Untitled Property")
            }
            PropertyRef::Id(_) => "Untitled Property",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "propertyId")]
    pub property: PropertyRef,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    Pending,
    Assigned,
    Resolved,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Pending => "pending",
            InquiryStatus::Assigned => "assigned",
            InquiryStatus::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for InquiryStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InquiryStatus::Pending),
            "assigned" => Ok(InquiryStatus::Assigned),
            "resolved" => Ok(InquiryStatus::Resolved),
            _ => Err(()),
        }
    }
}

/// A buyer inquiry about a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub property: PropertyRef,
    #[serde(rename = "name", default)]
    pub inquirer_name: Option<String>,
    #[serde(rename = "email", default)]
    pub inquirer_email: Option<String>,
    #[serde(rename = "message", default)]
    pub initial_message: Option<String>,
    #[serde(default)]
    pub status: Option<InquiryStatus>,
    #[serde(default)]
    pub assigned_to: Option<Person>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFrom {
    Buyer,
    Seller,
    Agent,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub from: MessageFrom,
    pub text: String,
    #[serde(rename = "createdAt", alias = "at", default)]
    pub at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Message,
    Visit,
    Offer,
    Status,
    Doc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub kind: TimelineKind,
    pub title: String,
    #[serde(rename = "createdAt", alias = "at", default)]
    pub at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Inquiry header plus its message thread and timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InquiryThread {
    pub inquiry: Inquiry,
    pub messages: Vec<Message>,
    pub timeline: Vec<TimelineEvent>,
}
