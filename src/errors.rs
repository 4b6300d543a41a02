use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    /// Caller input broke a precondition; nothing was sent to either store.
    ValidationError(Vec<FieldError>),
    /// One or more asset uploads failed; earlier successes are left orphaned.
    UploadError(Vec<UploadFailure>),
    /// The document store rejected a create or delete.
    PersistError(String),
    NotFound(String),
    /// The document store could not be read or its response parsed.
    FetchError(String),
    UnauthorizedAccess,
    InternalError(String),
}

impl AppError {
    /// Short tag naming the stage that failed, for callers and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::UploadError(_) => "upload",
            AppError::PersistError(_) => "persist",
            AppError::NotFound(_) => "not_found",
            AppError::FetchError(_) => "fetch",
            AppError::UnauthorizedAccess => "auth",
            AppError::InternalError(_) => "internal",
        }
    }

    pub fn validation(field: &str, message: &str) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }

    pub fn persist(err: impl fmt::Display) -> Self {
        AppError::PersistError(err.to_string())
    }

    pub fn fetch(err: impl fmt::Display) -> Self {
        AppError::FetchError(err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Validation error: {}", messages)
            }
            AppError::UploadError(failures) => {
                let files = failures.iter()
                    .map(|failure| failure.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Upload failed: {}", files)
            }
            AppError::PersistError(msg) => write!(f, "Persist failed: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::FetchError(msg) => write!(f, "Fetch failed: {}", msg),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "stage": self.stage(),
                    "details": errors
                })
            }
            AppError::UploadError(failures) => {
                serde_json::json!({
                    "error": self.to_string(),
                    "stage": self.stage(),
                    "details": failures
                })
            }
            _ => {
                serde_json::json!({
                    "error": self.to_string(),
                    "stage": self.stage()
                })
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UploadError(_) => StatusCode::BAD_GATEWAY,
            AppError::PersistError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::FetchError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("IO error: {}", err))
    }
}

/// Failures reported by an asset store implementation.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum AssetError {
    #[display("Asset store rejected upload ({_0}): {_1}")]
    Rejected(u16, String),

    #[display("Asset store unreachable: {_0}")]
    Transport(String),

    #[display("Invalid asset store response: {_0}")]
    InvalidResponse(String),

    #[display("Asset store misconfigured: {_0}")]
    Misconfigured(String),
}

impl std::error::Error for AssetError {}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        AssetError::Transport(err.to_string())
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Which file failed to upload and why. `index` is the file's position in
/// the submitted batch.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UploadFailure {
    pub index: usize,
    pub file_name: String,
    pub reason: String,
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file #{} '{}' ({})", self.index + 1, self.file_name, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_names_each_failed_file() {
        let err = AppError::UploadError(vec![UploadFailure {
            index: 1,
            file_name: "crowning.jpg".into(),
            reason: "timeout".into(),
        }]);

        assert_eq!(err.to_string(), "Upload failed: file #2 'crowning.jpg' (timeout)");
        assert_eq!(err.stage(), "upload");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_error_maps_to_bad_request() {
        let err = AppError::validation("title", "Gallery title is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Validation error: title: Gallery title is required");
    }

    #[test]
    fn fetch_error_asks_for_retry() {
        let err = AppError::fetch("connection refused");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.stage(), "fetch");
    }
}
