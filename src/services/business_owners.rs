use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{BusinessOwner, BusinessOwnerResponse, NewBusinessOwner};
use crate::services::lifecycle::Resource;
use crate::services::registration::{self, Registrant};

pub const COLLECTION: &str = "business_owners";

impl Registrant for BusinessOwner {
    fn phone_number(&self) -> &str {
        &self.phone_number
    }

    fn is_verified(&self) -> bool {
        self.is_verified
    }
}

impl Resource for BusinessOwner {
    const COLLECTION: &'static str = COLLECTION;
    const NOT_FOUND: &'static str = "Business owner not found";

    type Input = NewBusinessOwner;
    type Output = BusinessOwnerResponse;

    fn represent(id: &str, doc: &Self, _config: &AppConfig) -> BusinessOwnerResponse {
        BusinessOwnerResponse::new(id, doc)
    }

    fn before_create(conn: &Connection, input: &NewBusinessOwner) -> Result<(), AppError> {
        registration::release_unverified::<BusinessOwner>(
            conn,
            COLLECTION,
            &input.phone_number,
            "PHONE_EXISTS",
            "Phone number already exists",
        )
    }

    fn before_update(
        conn: &Connection,
        id: &str,
        current: &Self,
        input: &NewBusinessOwner,
    ) -> Result<(), AppError> {
        registration::ensure_phone_free(conn, COLLECTION, id, current, &input.phone_number)
    }

    fn build(input: NewBusinessOwner, now: DateTime<Utc>) -> Self {
        BusinessOwner {
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            telegram_id: input.telegram_id,
            date_created: now,
            is_verified: false,
        }
    }

    fn merge(current: Self, input: NewBusinessOwner) -> Self {
        BusinessOwner {
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            telegram_id: input.telegram_id,
            ..current
        }
    }
}

/// Whether a business owner with this id exists.
pub fn exists(conn: &Connection, id: &str) -> Result<bool, AppError> {
    Ok(crate::db::queries::document_exists(conn, COLLECTION, id)?)
}
