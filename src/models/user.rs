use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::validation::{only_digits, Shape};

/// Stored user document. The id lives beside the document, not inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone_number: String,
    pub telegram_id: i64,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserPayload {
    #[validate(
        required(message = "first_name is required"),
        length(min = 1, message = "first_name is required")
    )]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[validate(
        required(message = "phone_number is required"),
        length(min = 12, message = "phone_number must be at least 12 digits"),
        custom(function = "only_digits", message = "phone_number must contain only digits")
    )]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(
        required(message = "telegram_id is required"),
        range(min = 1, message = "telegram_id must be positive")
    )]
    pub telegram_id: Option<i64>,
}

/// Normalized registration and update input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub telegram_id: i64,
}

impl Shape for NewUser {
    type Draft = RegisterUserPayload;

    fn from_draft(draft: RegisterUserPayload) -> Self {
        NewUser {
            first_name: draft.first_name.unwrap_or_default(),
            last_name: draft.last_name,
            phone_number: draft.phone_number.unwrap_or_default(),
            telegram_id: draft.telegram_id.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub telegram_id: i64,
    pub is_verified: bool,
    pub created_at: String,
}

impl UserResponse {
    pub fn new(id: &str, user: &User) -> Self {
        UserResponse {
            id: id.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            telegram_id: user.telegram_id,
            is_verified: user.is_verified,
            created_at: super::iso(&user.created_at),
        }
    }
}
