// Application error taxonomy and its HTTP mapping.
//
// Internal errors (database, token handling, unexpected) are logged
// server-side with full detail; clients only ever see generic messages.
// Validation failures are the exception: they carry every broken rule so a
// single response lists all violations at once.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Request validation error: {0}")]
    RequestShape(#[from] ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] JsonRejection),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(errors),
            ),
            AppError::RequestShape(errors) => {
                let details: Vec<String> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| match &e.message {
                            Some(msg) => format!("{}: {}", field, msg),
                            None => format!("{}: invalid value", field),
                        })
                    })
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    "Validation failed".to_string(),
                    Some(details),
                )
            }
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "Invalid JSON".to_string(), None),
            AppError::Jwt(ref e) => {
                tracing::error!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => Json(json!({
                "error": error_message,
                "details": details,
                "status": status.as_u16()
            })),
            None => Json(json!({
                "error": error_message,
                "status": status.as_u16()
            })),
        };

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = AppError::Validation(vec![
            "customer_name is required".to_string(),
            "items cannot be empty".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.contains("customer_name is required"));
        assert!(message.contains("items cannot be empty"));
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        let cases = [
            (AppError::Validation(vec!["x".into()]), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("Access denied".into()), StatusCode::FORBIDDEN),
            (
                AppError::NotFound("Inquiry not found".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Jwt(jsonwebtoken::errors::ErrorKind::InvalidToken.into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
