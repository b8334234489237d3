use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable tag carried by every [Error].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BindError,
    ValidateError,
    NotFound,
    CreateError,
    UpdateError,
    PatchError,
    FetchError,
    GetByIdError,
    DeleteError,
    PathNotFound,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BindError => "bind_error",
            ErrorKind::ValidateError => "validate_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CreateError => "create_error",
            ErrorKind::UpdateError => "update_error",
            ErrorKind::PatchError => "patch_error",
            ErrorKind::FetchError => "fetch_error",
            ErrorKind::GetByIdError => "get_by_id_error",
            ErrorKind::DeleteError => "delete_error",
            ErrorKind::PathNotFound => "path_not_found",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure produced by the domain and rendered verbatim as the response body.
///
/// Serialized as `{"type": ..., "status": ..., "detail": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} - {status}: {detail}")]
pub struct Error {
    #[serde(rename = "type")]
    kind: ErrorKind,
    status: u16,
    detail: String,
}

impl Error {
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const SERVICE_UNAVAILABLE: u16 = 503;

    pub fn new(kind: ErrorKind, status: u16, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Self::BAD_REQUEST, detail)
    }

    pub fn forbidden(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Self::FORBIDDEN, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, Self::NOT_FOUND, detail)
    }

    pub fn internal(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::new(kind, Self::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_serialize_uses_wire_field_names() {
        let error = Error::forbidden(ErrorKind::UpdateError, "device is in use");
        let result = serde_json::to_value(&error).unwrap();
        let expected = serde_json::json!({
            "type": "update_error",
            "status": 403,
            "detail": "device is in use",
        });

        assert_eq!(result, expected);
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let kinds = [
            ErrorKind::BindError,
            ErrorKind::ValidateError,
            ErrorKind::NotFound,
            ErrorKind::GetByIdError,
            ErrorKind::PathNotFound,
        ];

        for kind in kinds {
            let result = serde_json::to_value(kind).unwrap();

            assert_eq!(result, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn test_display() {
        let error = Error::not_found("device not found");

        assert_eq!(error.to_string(), "not_found - 404: device not found");
    }
}
