use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Application user as exposed by the API (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for registering a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "username and password are required"))]
    pub username: String,

    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "username and password are required"))]
    pub password: String,
}
