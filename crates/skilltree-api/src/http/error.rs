//! Application error type mapping to HTTP status codes and envelope format.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use skilltree_types::error::{NotFoundKind, SkillError};

use crate::http::response::{ApiErrorDetail, ApiMeta};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the hierarchy engine.
    Skill(SkillError),
    /// Malformed request body or parameters.
    Validation(String),
}

impl From<SkillError> for AppError {
    fn from(e: SkillError) -> Self {
        AppError::Skill(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

impl AppError {
    /// Status, machine-readable code, and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Skill(SkillError::Validation(msg)) | AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Skill(SkillError::NotFound(NotFoundKind::Skill)) => (
                StatusCode::NOT_FOUND,
                "SKILL_NOT_FOUND",
                "Skill not found".to_string(),
            ),
            AppError::Skill(SkillError::NotFound(NotFoundKind::Parent)) => (
                StatusCode::NOT_FOUND,
                "PARENT_NOT_FOUND",
                "Parent not found".to_string(),
            ),
            AppError::Skill(e @ SkillError::Cycle) => {
                (StatusCode::BAD_REQUEST, "CYCLE_DETECTED", e.to_string())
            }
            AppError::Skill(e @ SkillError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = serde_json::json!({
            "data": null,
            "meta": ApiMeta::now(uuid::Uuid::now_v7().to_string(), 0),
            "errors": [ApiErrorDetail {
                code: code.to_string(),
                message,
            }],
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases = [
            (SkillError::Validation("bad".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (SkillError::NotFound(NotFoundKind::Skill), StatusCode::NOT_FOUND, "SKILL_NOT_FOUND"),
            (SkillError::NotFound(NotFoundKind::Parent), StatusCode::NOT_FOUND, "PARENT_NOT_FOUND"),
            (SkillError::Cycle, StatusCode::BAD_REQUEST, "CYCLE_DETECTED"),
            (SkillError::Storage("locked".into()), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        ];
        for (err, status, code) in cases {
            let (s, c, _) = AppError::from(err).parts();
            assert_eq!((s, c), (status, code));
        }
    }

    #[test]
    fn test_cycle_message_names_parent_or_descendant() {
        let (_, _, message) = AppError::from(SkillError::Cycle).parts();
        assert!(message.contains("parent or descendant"));
    }
}
