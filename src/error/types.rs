//! Error types
//!
//! Defines domain-specific error types for the file operations, the hub
//! client, and server startup.

use std::fmt;
use std::io;

/// File operation errors
///
/// Every variant carries the caller's relative input, never an absolute
/// filesystem path, so the text is safe to hand back to a client.
#[derive(Debug)]
pub enum FileOpError {
    PathEscape(String),
    NotFound(String),
    NotADirectory(String),
    IsADirectory(String),
    AlreadyExists(String),
    InvalidInput(String),
    Io { path: String, source: io::Error },
}

impl FileOpError {
    /// Wrap an I/O failure, promoting the kinds the taxonomy names explicitly.
    pub fn from_io(path: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FileOpError::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => FileOpError::AlreadyExists(path.to_string()),
            io::ErrorKind::NotADirectory => FileOpError::NotADirectory(path.to_string()),
            io::ErrorKind::IsADirectory => FileOpError::IsADirectory(path.to_string()),
            _ => FileOpError::Io {
                path: path.to_string(),
                source,
            },
        }
    }

    /// Short machine-usable category string
    pub fn category(&self) -> &'static str {
        match self {
            FileOpError::PathEscape(_) => "path_escape",
            FileOpError::NotFound(_) => "not_found",
            FileOpError::NotADirectory(_) => "not_a_directory",
            FileOpError::IsADirectory(_) => "is_a_directory",
            FileOpError::AlreadyExists(_) => "already_exists",
            FileOpError::InvalidInput(_) => "invalid_input",
            FileOpError::Io { .. } => "io_error",
        }
    }
}

impl fmt::Display for FileOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOpError::PathEscape(p) => {
                write!(f, "Path escapes the base directory: {}", p)
            }
            FileOpError::NotFound(p) => write!(f, "Path not found: {}", p),
            FileOpError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            FileOpError::IsADirectory(p) => write!(f, "Is a directory: {}", p),
            FileOpError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            FileOpError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            FileOpError::Io { path, source } => write!(f, "I/O error on {}: {}", path, source),
        }
    }
}

impl std::error::Error for FileOpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileOpError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Hub client errors
#[derive(Debug)]
pub enum HubError {
    NotConfigured,
    InvalidInput(String),
    Timeout(u64),
    Upstream { status: u16, body: String },
    Request(String),
    Decode(String),
}

impl HubError {
    /// Short machine-usable category string
    pub fn category(&self) -> &'static str {
        match self {
            HubError::NotConfigured => "hub_not_configured",
            HubError::InvalidInput(_) => "invalid_input",
            HubError::Timeout(_) => "hub_timeout",
            HubError::Upstream { .. } => "hub_upstream_error",
            HubError::Request(_) => "hub_request_failed",
            HubError::Decode(_) => "hub_request_failed",
        }
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::NotConfigured => write!(f, "No hub URL configured"),
            HubError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            HubError::Timeout(secs) => write!(f, "Hub did not answer within {}s", secs),
            HubError::Upstream { status, body } => {
                write!(f, "Hub responded with status {}: {}", status, body)
            }
            HubError::Request(msg) => write!(f, "Hub request failed: {}", msg),
            HubError::Decode(msg) => write!(f, "Hub response could not be decoded: {}", msg),
        }
    }
}

impl std::error::Error for HubError {}

/// Server startup errors
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    BaseDirectory(io::Error),
    Bind(String, io::Error),
    Serve(io::Error),
    Hub(HubError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::BaseDirectory(e) => write!(f, "Base directory unusable: {}", e),
            ServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ServerError::Serve(e) => write!(f, "Server stopped: {}", e),
            ServerError::Hub(e) => write!(f, "Hub client setup failed: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<HubError> for ServerError {
    fn from(error: HubError) -> Self {
        ServerError::Hub(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_is_promoted() {
        let err = FileOpError::from_io("a.yaml", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.category(), "not_found");
        assert_eq!(err.to_string(), "Path not found: a.yaml");
    }

    #[test]
    fn permission_denied_stays_io() {
        let err = FileOpError::from_io(
            "secrets.yaml",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.category(), "io_error");
        assert!(err.to_string().starts_with("I/O error on secrets.yaml"));
    }

    #[test]
    fn config_errors_become_server_errors() {
        let err: ServerError = config::ConfigError::Message("port must be non-zero".into()).into();
        assert!(matches!(err, ServerError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: port must be non-zero");
    }
}
