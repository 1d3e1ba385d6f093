//! Typed endpoint services
//!
//! Each service is a thin, cloneable handle over [`ApiClient`]. Obtain them
//! through the accessor methods on the client.

use crate::http::ApiClient;

pub mod auth;
pub mod collections;
pub mod favorites;
pub mod inquiries;
pub mod profile;
pub mod properties;

pub use auth::{AuthApi, LoginResponse, OAuthProfile, Registration};
pub use collections::CollectionsApi;
pub use favorites::FavoritesApi;
pub use inquiries::{InquiriesApi, InquiryFilter};
pub use profile::{ProfileApi, ProfileUpdate};
pub use properties::{PropertiesApi, PropertyQuery, SortKey, SortOrder};

impl ApiClient {
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn favorites(&self) -> FavoritesApi {
        FavoritesApi::new(self.clone())
    }

    pub fn collections(&self) -> CollectionsApi {
        CollectionsApi::new(self.clone())
    }

    pub fn properties(&self) -> PropertiesApi {
        PropertiesApi::new(self.clone())
    }

    pub fn inquiries(&self) -> InquiriesApi {
        InquiriesApi::new(self.clone())
    }

    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }
}
