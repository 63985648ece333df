use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::validation::{uz_phone_number, Shape};

/// A one-time verification code. Moves from unused to used exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OtpCode {
    pub user_id: String,
    pub otp_code: String,
    pub date_created: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpPayload {
    #[validate(
        required(message = "phone_number is required"),
        custom(
            function = "uz_phone_number",
            message = "phone_number must be in format 998XXXXXXXXX"
        )
    )]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SendOtp {
    pub phone_number: String,
}

impl Shape for SendOtp {
    type Draft = SendOtpPayload;

    fn from_draft(draft: SendOtpPayload) -> Self {
        SendOtp {
            phone_number: draft.phone_number.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpPayload {
    #[validate(
        required(message = "user_id is required"),
        length(min = 16, message = "user_id is required")
    )]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(
        required(message = "otp_code is required"),
        range(min = 100000, max = 999999, message = "otp_code must be 6 digits")
    )]
    pub otp_code: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct VerifyOtp {
    pub user_id: String,
    pub otp_code: String,
}

impl Shape for VerifyOtp {
    type Draft = VerifyOtpPayload;

    fn from_draft(draft: VerifyOtpPayload) -> Self {
        VerifyOtp {
            user_id: draft.user_id.unwrap_or_default(),
            otp_code: draft.otp_code.unwrap_or_default().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::validation::{check, Source};
    use serde_json::{json, Value};

    fn verify(value: Value) -> Result<VerifyOtp, AppError> {
        check::<VerifyOtp>(value.as_object().cloned().unwrap(), Source::Body)
    }

    #[test]
    fn otp_code_accepts_numbers_and_numeric_strings() {
        let a = verify(json!({"user_id": "0123456789abcdef", "otp_code": 123456})).unwrap();
        let b = verify(json!({"user_id": "0123456789abcdef", "otp_code": "123456"})).unwrap();
        assert_eq!(a.otp_code, "123456");
        assert_eq!(b.otp_code, "123456");
    }

    #[test]
    fn otp_code_must_have_six_digits() {
        let err = verify(json!({"user_id": "0123456789abcdef", "otp_code": 12345})).unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].field, "otp_code");
        assert_eq!(errors[0].error, "otp_code must be 6 digits");
    }

    #[test]
    fn send_requires_uzbek_number() {
        let ok = check::<SendOtp>(
            json!({"phone_number": "998901234567"}).as_object().cloned().unwrap(),
            Source::Body,
        );
        assert!(ok.is_ok());

        let err = check::<SendOtp>(
            json!({"phone_number": "12345"}).as_object().cloned().unwrap(),
            Source::Body,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
