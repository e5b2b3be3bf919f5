use crate::models::{ApiResponse, ErrorCode};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use std::collections::BTreeMap;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    /// Unique constraint on `tickets.token` rejected an insert.
    #[error("Duplicate ticket token: {0}")]
    DuplicateToken(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) if is_token_violation(&detail) => {
                AppError::DuplicateToken(detail)
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

/// Whether a unique violation message names the ticket token index or column.
/// Postgres reports the index name, SQLite the `table.column` pair.
fn is_token_violation(detail: &str) -> bool {
    detail.contains("idx_tickets_token_unique") || detail.contains("tickets.token")
}

impl AppError {
    pub fn status_code_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::AuthError(_) | AppError::JwtError(_) => {
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::DuplicateToken(_) => (StatusCode::CONFLICT, "DUPLICATE_TOKEN"),
            AppError::Gone(_) => (StatusCode::GONE, "GONE"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::ExternalApiError(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Message sent to clients. Details of server side failures stay in the
    /// logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Gone(msg)
            | AppError::ExternalApiError(msg) => msg.clone(),
            AppError::JwtError(_) => "Invalid token".to_string(),
            AppError::Forbidden => "Forbidden".to_string(),
            AppError::DuplicateToken(_) => "Duplicate ticket token".to_string(),
            AppError::DatabaseError(_) => "Database error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

/// Errors the HTTP routes report. Domain errors carry a dotted message code,
/// the others a fixed message.
fn listed_errors() -> Vec<AppError> {
    let codes = |f: fn(String) -> AppError, list: &[&str]| -> Vec<AppError> {
        list.iter().map(|c| f(c.to_string())).collect()
    };

    let mut errors = Vec::new();
    errors.extend(codes(AppError::AuthError, &["credential.not_found"]));
    errors.extend(codes(
        AppError::NotFound,
        &[
            "user.not_found",
            "client.not_found",
            "employee.not_found",
            "validation.not_found",
            "ticket.not_found",
            "store.not_found",
            "caisse.not_found",
        ],
    ));
    errors.extend(codes(
        AppError::Conflict,
        &[
            "client.already_exists",
            "employee.already_exists",
            "validation.already_validated",
            "ticket.already_claimed",
        ],
    ));
    errors.extend(codes(AppError::Gone, &["validation.expired"]));
    errors.extend([
        AppError::ValidationError("Invalid request field".to_string()),
        AppError::JwtError(jsonwebtoken::errors::ErrorKind::InvalidToken.into()),
        AppError::Forbidden,
        AppError::ExternalApiError("External service error".to_string()),
        AppError::DatabaseError(DbErr::Custom(String::new())),
        AppError::InternalError(String::new()),
    ]);
    errors
}

/// Every error a client can receive, keyed by message code, or by kind for
/// errors whose message is free text.
pub fn error_catalog() -> BTreeMap<String, ErrorCode> {
    listed_errors()
        .iter()
        .map(|err| {
            let (status, code) = err.status_code_and_code();
            let message = err.public_message();
            let key = if is_message_code(&message) {
                message.clone()
            } else {
                code.to_string()
            };
            let entry = ErrorCode {
                code: code.to_string(),
                status: status.as_u16(),
                message,
            };
            (key, entry)
        })
        .collect()
}

/// `ticket.not_found` style codes: lowercase words joined by dots.
fn is_message_code(message: &str) -> bool {
    message.contains('.')
        && message
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '.' || c == '_')
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code) = self.status_code_and_code();
        if status_code.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }

        HttpResponse::build(status_code).json(ApiResponse::<()>::error(
            error_code.to_string(),
            self.public_message(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("ticket.not_found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Gone("validation.expired".into()).status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            AppError::Conflict("client.already_exists".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InternalError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_plain_db_error_is_not_duplicate_token() {
        let err: AppError = DbErr::Custom("connection reset".into()).into();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn test_error_catalog() {
        let catalog = error_catalog();

        let claimed = &catalog["ticket.already_claimed"];
        assert_eq!(claimed.status, 409);
        assert_eq!(claimed.code, "CONFLICT");
        assert_eq!(catalog["validation.expired"].status, 410);
        assert_eq!(catalog["caisse.not_found"].status, 404);
        assert_eq!(catalog["credential.not_found"].code, "AUTH_ERROR");

        assert_eq!(catalog["FORBIDDEN"].status, 403);
        assert_eq!(catalog["AUTH_ERROR"].message, "Invalid token");
        assert_eq!(catalog["DATABASE_ERROR"].message, "Database error");
        assert_eq!(catalog["VALIDATION_ERROR"].status, 400);
        assert_eq!(catalog["INTERNAL_ERROR"].status, 500);
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err: AppError = DbErr::Custom("relation \"tickets\" does not exist".into()).into();
        assert_eq!(err.public_message(), "Database error");
        assert_eq!(
            AppError::InternalError("secret path".into()).public_message(),
            "Internal server error"
        );
        assert_eq!(
            AppError::NotFound("ticket.not_found".into()).public_message(),
            "ticket.not_found"
        );
    }

    #[test]
    fn test_token_violation_detection() {
        assert!(is_token_violation(
            r#"duplicate key value violates unique constraint "idx_tickets_token_unique""#
        ));
        assert!(is_token_violation(
            "UNIQUE constraint failed: tickets.token"
        ));
        assert!(!is_token_violation(
            r#"duplicate key value violates unique constraint "idx_credentials_email_unique""#
        ));
        assert!(!is_token_violation(
            r#"duplicate key value violates unique constraint "tickets_pkey""#
        ));
    }
}
