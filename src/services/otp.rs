//! One-time verification codes.
//!
//! A code is eligible only while it is the newest unused code of its user
//! and no more than [`OTP_EXPIRY_MINUTES`] old. Expired codes stay unused in
//! storage; a newer code orphans every older one.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{OtpCode, User};
use crate::services::{lifecycle, users};
use crate::state::AppState;

pub const COLLECTION: &str = "otps";
pub const OTP_EXPIRY_MINUTES: i64 = 15;

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn sms_text(code: &str) -> String {
    format!(
        "Your barbershop verification code: {code}. It expires in {OTP_EXPIRY_MINUTES} minutes."
    )
}

/// Stores a fresh unused code for `user_id` and returns it.
pub fn issue(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> anyhow::Result<OtpCode> {
    let otp = OtpCode {
        user_id: user_id.to_string(),
        otp_code: generate_code(),
        date_created: now,
        used: false,
    };
    let id = uuid::Uuid::new_v4().to_string();
    anyhow::ensure!(
        queries::insert_document(conn, COLLECTION, &id, &otp)?,
        "otp id {id} already taken"
    );
    tracing::info!(user_id, "otp issued");
    Ok(otp)
}

/// The newest unused code of a user, with its document id.
fn latest_unused(conn: &Connection, user_id: &str) -> anyhow::Result<Option<(String, OtpCode)>> {
    let codes: Vec<(String, OtpCode)> =
        queries::find_by_field(conn, COLLECTION, "user_id", user_id)?;
    Ok(codes
        .into_iter()
        .filter(|(_, otp)| !otp.used)
        .max_by_key(|(_, otp)| otp.date_created))
}

#[derive(Debug, Serialize)]
pub struct SendOutcome {
    pub message: String,
    pub user_id: String,
    pub sms_sent: bool,
}

/// Issues a code for the user holding `phone_number` and texts it.
pub async fn send(
    state: &AppState,
    phone_number: &str,
    now: DateTime<Utc>,
) -> Result<SendOutcome, AppError> {
    let (user_id, otp) = {
        let db = state.db()?;
        let mut holders: Vec<(String, User)> =
            queries::find_by_field(&db, users::COLLECTION, "phone_number", phone_number)?;
        if holders.is_empty() {
            return Err(AppError::not_found("USER_NOT_FOUND", "User not found"));
        }
        let (user_id, _) = holders.swap_remove(0);
        let otp = issue(&db, &user_id, now)?;
        (user_id, otp)
    };

    let sms_sent = match state.sms.send_sms(phone_number, &sms_text(&otp.otp_code)).await {
        Ok(sent) => sent,
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "failed to send otp sms");
            false
        }
    };

    Ok(SendOutcome {
        message: if sms_sent {
            "OTP sent successfully".to_string()
        } else {
            "OTP created but SMS could not be sent".to_string()
        },
        user_id,
        sms_sent,
    })
}

/// Consumes `code` and marks the user verified.
pub fn verify(
    conn: &mut Connection,
    user_id: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<(String, User), AppError> {
    let tx = conn.transaction()?;

    let (otp_id, mut otp) = match latest_unused(&tx, user_id)? {
        Some((id, otp)) if otp.otp_code == code => (id, otp),
        _ => return Err(AppError::bad_request("INVALID_OTP", "Invalid OTP")),
    };

    if now - otp.date_created > Duration::minutes(OTP_EXPIRY_MINUTES) {
        return Err(AppError::bad_request("OTP_EXPIRED", "OTP has expired"));
    }

    let mut user = match lifecycle::get::<User>(&tx, user_id) {
        Err(AppError::NotFound { .. }) => {
            return Err(AppError::not_found("USER_NOT_FOUND", "User not found"))
        }
        found => found?,
    };

    otp.used = true;
    queries::replace_document(&tx, COLLECTION, &otp_id, &otp)?;
    user.is_verified = true;
    queries::replace_document(&tx, users::COLLECTION, user_id, &user)?;

    tx.commit()?;
    tracing::info!(user_id, "user verified");
    Ok((user_id.to_string(), user))
}
