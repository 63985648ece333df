use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{SendOtp, UserResponse, VerifyOtp};
use crate::services::otp::{self, SendOutcome};
use crate::state::AppState;
use crate::validation::Valid;

// POST /otp/send
pub async fn send(
    State(state): State<Arc<AppState>>,
    Valid(input): Valid<SendOtp>,
) -> Result<Json<SendOutcome>, AppError> {
    let outcome = otp::send(&state, &input.phone_number, Utc::now()).await?;
    Ok(Json(outcome))
}

#[derive(Serialize)]
pub struct VerifyResponse {
    message: &'static str,
    is_verified: bool,
    user: UserResponse,
}

// POST /otp/verify
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Valid(input): Valid<VerifyOtp>,
) -> Result<Json<VerifyResponse>, AppError> {
    let (id, user) = {
        let mut db = state.db()?;
        otp::verify(&mut db, &input.user_id, &input.otp_code, Utc::now())?
    };

    Ok(Json(VerifyResponse {
        message: "OTP verified successfully",
        is_verified: user.is_verified,
        user: UserResponse::new(&id, &user),
    }))
}
