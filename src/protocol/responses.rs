//! Response envelope
//!
//! Every endpoint answers with exactly one of two JSON shapes, discriminated
//! by `status`:
//!
//! ```json
//! {"status": "success", "message": "...", "data": {...}}
//! {"status": "error", "error": "not_found", "details": "..."}
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::handlers::{file_error_status, hub_error_status};
use crate::error::{FileOpError, HubError};

/// Outcome of any operation, as seen by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OperationResult {
    Success {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl OperationResult {
    /// Success carrying a serialized payload
    pub fn success_with<T: Serialize>(message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => OperationResult::Success {
                message: message.into(),
                data: Some(value),
            },
            Err(e) => {
                error!("Failed to serialize response payload: {}", e);
                OperationResult::error("internal_error", Some("response could not be encoded"))
            }
        }
    }

    pub fn error(category: impl Into<String>, details: Option<&str>) -> Self {
        OperationResult::Error {
            error: category.into(),
            details: details.map(str::to_string),
        }
    }
}

impl From<&FileOpError> for OperationResult {
    fn from(err: &FileOpError) -> Self {
        OperationResult::error(err.category(), Some(err.to_string().as_str()))
    }
}

impl From<&HubError> for OperationResult {
    fn from(err: &HubError) -> Self {
        OperationResult::error(err.category(), Some(err.to_string().as_str()))
    }
}

/// An envelope paired with the HTTP status it is sent with
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: OperationResult,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: OperationResult) -> Self {
        Self { status, body }
    }

    pub fn ok(body: OperationResult) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn bad_request(category: &str, details: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            OperationResult::error(category, Some(details)),
        )
    }

    pub fn internal(details: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            OperationResult::error("internal_error", Some(details)),
        )
    }
}

impl From<&FileOpError> for ApiResponse {
    fn from(err: &FileOpError) -> Self {
        Self::new(file_error_status(err), OperationResult::from(err))
    }
}

impl From<&HubError> for ApiResponse {
    fn from(err: &HubError) -> Self {
        Self::new(hub_error_status(err), OperationResult::from(err))
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_shape() {
        let result = OperationResult::success_with("Listed 1 entries", &json!(["a"]));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"status": "success", "message": "Listed 1 entries", "data": ["a"]})
        );
    }

    #[test]
    fn success_without_data_omits_field() {
        let parsed: OperationResult =
            serde_json::from_value(json!({"status": "success", "message": "ok"})).unwrap();
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value, json!({"status": "success", "message": "ok"}));
    }

    #[test]
    fn error_shape_from_file_error() {
        let err = FileOpError::PathEscape("../../etc/passwd".into());
        let value = serde_json::to_value(OperationResult::from(&err)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "error",
                "error": "path_escape",
                "details": "Path escapes the base directory: ../../etc/passwd"
            })
        );
        assert_eq!(ApiResponse::from(&err).status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn envelope_parses_back() {
        let parsed: OperationResult =
            serde_json::from_value(json!({"status": "error", "error": "not_found"})).unwrap();
        assert_eq!(parsed, OperationResult::error("not_found", None));
    }
}
