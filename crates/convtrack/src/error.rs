use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvtrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to read token file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove token file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Classification of every failure an operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No bearer token was available; nothing was sent.
    Unauthenticated,
    /// The server refused access to a resource owned by someone else.
    AccessDenied,
    /// Transport failure or an unexpected non-success status.
    NetworkFailure,
    /// Rejected locally before any request was made.
    ValidationFailure,
    /// The server rejected the request with a 4xx status.
    ServerValidationFailure,
}

/// Failure of a single client operation.
///
/// Every variant is recoverable: the caller keeps its previous state and the
/// user may simply repeat the action.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Access denied")]
    AccessDenied,

    #[error("Download failed with HTTP status {status}")]
    DownloadFailed { status: u16 },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Failed to decode server response: {0}")]
    Decode(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Server rejected request ({status}){}", detail_suffix(.detail))]
    ServerRejected { status: u16, detail: Option<String> },

    #[error("Failed to save '{filename}': {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unauthenticated => ErrorKind::Unauthenticated,
            ClientError::AccessDenied => ErrorKind::AccessDenied,
            ClientError::Validation(_) => ErrorKind::ValidationFailure,
            ClientError::ServerRejected { .. } => ErrorKind::ServerValidationFailure,
            ClientError::DownloadFailed { .. }
            | ClientError::Transport(_)
            | ClientError::UnexpectedStatus { .. }
            | ClientError::Decode(_)
            | ClientError::Save { .. } => ErrorKind::NetworkFailure,
        }
    }

    /// Human-readable detail supplied by the server, if any.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            ClientError::ServerRejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ConvtrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(ClientError::Unauthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(ClientError::AccessDenied.kind(), ErrorKind::AccessDenied);
        assert_eq!(
            ClientError::DownloadFailed { status: 500 }.kind(),
            ErrorKind::NetworkFailure
        );
        assert_eq!(
            ClientError::Validation("empty".into()).kind(),
            ErrorKind::ValidationFailure
        );
        assert_eq!(
            ClientError::ServerRejected {
                status: 402,
                detail: None
            }
            .kind(),
            ErrorKind::ServerValidationFailure
        );
    }

    #[test]
    fn test_server_rejected_display() {
        let err = ClientError::ServerRejected {
            status: 413,
            detail: Some("File too large".into()),
        };
        assert_eq!(err.to_string(), "Server rejected request (413): File too large");
        assert_eq!(err.server_detail(), Some("File too large"));

        let bare = ClientError::ServerRejected {
            status: 400,
            detail: None,
        };
        assert_eq!(bare.to_string(), "Server rejected request (400)");
        assert_eq!(bare.server_detail(), None);
    }
}
