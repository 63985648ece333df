use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Business, BusinessResponse, NewBusiness};
use crate::services::business_owners;
use crate::services::lifecycle::Resource;

pub const COLLECTION: &str = "businesses";

fn owner_must_exist(conn: &Connection, owner_id: &str) -> Result<(), AppError> {
    if business_owners::exists(conn, owner_id)? {
        Ok(())
    } else {
        Err(AppError::not_found(
            "OWNER_NOT_FOUND",
            "Business owner not found",
        ))
    }
}

impl Resource for Business {
    const COLLECTION: &'static str = COLLECTION;
    const NOT_FOUND: &'static str = "Business not found";

    type Input = NewBusiness;
    type Output = BusinessResponse;

    fn represent(id: &str, doc: &Self, config: &AppConfig) -> BusinessResponse {
        BusinessResponse::new(id, doc, &config.public_base_url)
    }

    fn before_create(conn: &Connection, input: &NewBusiness) -> Result<(), AppError> {
        owner_must_exist(conn, &input.business_owner_id)
    }

    fn before_update(
        conn: &Connection,
        _id: &str,
        current: &Self,
        input: &NewBusiness,
    ) -> Result<(), AppError> {
        if current.business_owner_id == input.business_owner_id {
            return Ok(());
        }
        owner_must_exist(conn, &input.business_owner_id)
    }

    fn build(input: NewBusiness, now: DateTime<Utc>) -> Self {
        Business {
            business_name: input.business_name,
            business_phone_number: input.business_phone_number,
            business_owner_id: input.business_owner_id,
            business_address: input.business_address,
            business_images: input.business_images,
            business_hours: input.business_hours,
            place_id: input.place_id,
            business_status: input.business_status.unwrap_or_default(),
            date_created: now,
        }
    }

    fn merge(current: Self, input: NewBusiness) -> Self {
        Business {
            business_name: input.business_name,
            business_phone_number: input.business_phone_number,
            business_owner_id: input.business_owner_id,
            business_address: input.business_address,
            business_images: input.business_images,
            business_hours: input.business_hours,
            place_id: input.place_id,
            business_status: input.business_status.unwrap_or(current.business_status),
            date_created: current.date_created,
        }
    }
}

/// Businesses belonging to one owner; `OWNER_NOT_FOUND` for unknown owners.
pub fn list_by_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Vec<(String, Business)>, AppError> {
    owner_must_exist(conn, owner_id)?;
    Ok(queries::find_by_field(
        conn,
        COLLECTION,
        "business_owner_id",
        owner_id,
    )?)
}
