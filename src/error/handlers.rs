//! Error handlers
//!
//! Maps errors onto HTTP status codes and envelope categories.

use axum::http::StatusCode;
use log::{error, warn};

use crate::error::types::{FileOpError, HubError};

/// Log a file operation failure at a level matching its severity
pub fn log_file_error(operation: &str, err: &FileOpError) {
    match err {
        FileOpError::Io { .. } => error!("{} failed: {}", operation, err),
        _ => warn!("{} rejected: {}", operation, err),
    }
}

/// Log a hub failure
pub fn log_hub_error(operation: &str, err: &HubError) {
    match err {
        HubError::InvalidInput(_) | HubError::NotConfigured => {
            warn!("{} rejected: {}", operation, err)
        }
        _ => error!("{} failed: {}", operation, err),
    }
}

/// Convert a file operation error to an HTTP status
pub fn file_error_status(err: &FileOpError) -> StatusCode {
    match err {
        FileOpError::NotFound(_) => StatusCode::NOT_FOUND,
        FileOpError::PathEscape(_) => StatusCode::FORBIDDEN,
        FileOpError::NotADirectory(_)
        | FileOpError::IsADirectory(_)
        | FileOpError::AlreadyExists(_)
        | FileOpError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FileOpError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a hub error to an HTTP status
pub fn hub_error_status(err: &HubError) -> StatusCode {
    match err {
        HubError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        HubError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        HubError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        HubError::Upstream { status: 404, .. } => StatusCode::NOT_FOUND,
        HubError::Upstream { .. } | HubError::Request(_) | HubError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_errors_map_to_http_statuses() {
        assert_eq!(
            file_error_status(&FileOpError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            file_error_status(&FileOpError::PathEscape("../x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            file_error_status(&FileOpError::AlreadyExists("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            file_error_status(&FileOpError::NotADirectory("x".into())),
            StatusCode::BAD_REQUEST
        );
        let io = FileOpError::Io {
            path: "x".into(),
            source: std::io::Error::other("disk on fire"),
        };
        assert_eq!(file_error_status(&io), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn hub_timeout_is_gateway_timeout() {
        assert_eq!(
            hub_error_status(&HubError::Timeout(30)),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            hub_error_status(&HubError::NotConfigured),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
