use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// One rejected field of an incoming payload. `field` is a dotted path
/// (`business_hours.3.start_time`) or `body` for payload-wide problems.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),

    #[error("Request body is empty")]
    EmptyBody,

    #[error("Query parameters are required")]
    EmptyRequest,

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("Google Places API key not configured")]
    ApiKeyMissing,

    #[error("{message}")]
    Upstream {
        status: StatusCode,
        code: String,
        message: String,
    },
}

impl AppError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        AppError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::ApiKeyMissing => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::EmptyBody
            | AppError::EmptyRequest
            | AppError::Validation(_)
            | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Upstream { status, .. } => *status,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::EmptyBody => "EMPTY_BODY",
            AppError::EmptyRequest => "EMPTY_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::BadRequest { code, .. } => *code,
            AppError::ApiKeyMissing => "API_KEY_MISSING",
            AppError::Upstream { code, .. } => code.as_str(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), "{self}");
        }

        let body = match &self {
            AppError::Validation(errors) => serde_json::json!({
                "validation_errors": errors,
                "error_code": self.error_code(),
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
                "error_code": self.error_code(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_faults_surface_as_internal_error() {
        let err = AppError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn domain_codes_are_passed_through() {
        let err = AppError::conflict("PHONE_EXISTS", "Phone number already exists");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "PHONE_EXISTS");

        let err = AppError::Upstream {
            status: StatusCode::BAD_REQUEST,
            code: "OVER_QUERY_LIMIT".to_string(),
            message: "quota".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "OVER_QUERY_LIMIT");
    }
}
