use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::validation::{only_digits, Shape};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessOwner {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone_number: String,
    pub telegram_id: Option<i64>,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BusinessOwnerPayload {
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
    #[validate(range(min = 1, message = "telegram_id must be positive"))]
    pub telegram_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewBusinessOwner {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub telegram_id: Option<i64>,
}

impl Shape for NewBusinessOwner {
    type Draft = BusinessOwnerPayload;

    fn from_draft(draft: BusinessOwnerPayload) -> Self {
        NewBusinessOwner {
            first_name: draft.first_name.unwrap_or_default(),
            last_name: draft.last_name,
            phone_number: draft.phone_number.unwrap_or_default(),
            telegram_id: draft.telegram_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessOwnerResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub telegram_id: Option<i64>,
    pub date_created: String,
    pub is_verified: bool,
}

impl BusinessOwnerResponse {
    pub fn new(id: &str, owner: &BusinessOwner) -> Self {
        BusinessOwnerResponse {
            id: id.to_string(),
            first_name: owner.first_name.clone(),
            last_name: owner.last_name.clone(),
            phone_number: owner.phone_number.clone(),
            telegram_id: owner.telegram_id,
            date_created: super::iso(&owner.date_created),
            is_verified: owner.is_verified,
        }
    }
}
