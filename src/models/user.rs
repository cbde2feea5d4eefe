use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Public view of a user record. The password hash is never part of this
/// struct, so it cannot leak through serialization.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub given_name: String,
    pub last_name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row used by the auth flows: identity plus stored hash.
#[derive(Debug, FromRow)]
pub struct Credential {
    pub id: Uuid,
    pub password_hash: String,
}

/// Allow-listed mutable profile fields for `PUT /users/settings/{id}`.
///
/// Anything outside this set (id, password hash, timestamps) cannot be
/// touched through the settings endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsUpdate {
    #[validate(length(min = 3, max = 254))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub given_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
}
