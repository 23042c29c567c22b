//! User profile records returned by the user lookup route.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl UserProfile {
    /// Placeholder profile derived from the id; stands in for a user store.
    pub fn sample(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: format!("user{id}@example.com"),
            name: format!("User {id}"),
        }
    }
}
