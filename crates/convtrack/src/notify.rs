//! User-facing notices.
//!
//! Operations return typed results; this module turns those results into
//! the short messages a UI shows and fans them out to whoever is listening.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::ClientError;

pub const LOAD_FAILED: &str = "Failed to load conversions";
pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const ACCESS_DENIED: &str = "Access denied. You can only download your own files.";
pub const DOWNLOAD_FAILED: &str = "Failed to download file";
pub const RENAME_SUCCEEDED: &str = "Name updated";
pub const RENAME_FAILED: &str = "Failed to update name";
pub const DELETE_SUCCEEDED: &str = "Conversion deleted";
pub const DELETE_FAILED: &str = "Failed to delete conversion";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// The user action a result belongs to.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    LoadList,
    Download,
    Rename,
    Delete,
    Upload { file_name: &'a str },
}

/// Message for a failed operation.
pub fn failure_message(op: Operation<'_>, err: &ClientError) -> String {
    match op {
        Operation::LoadList => LOAD_FAILED.to_string(),
        Operation::Download => match err {
            ClientError::Unauthenticated => NOT_AUTHENTICATED.to_string(),
            ClientError::AccessDenied => ACCESS_DENIED.to_string(),
            _ => DOWNLOAD_FAILED.to_string(),
        },
        Operation::Rename => match err {
            ClientError::Validation(message) => message.clone(),
            _ => err
                .server_detail()
                .map(str::to_string)
                .unwrap_or_else(|| RENAME_FAILED.to_string()),
        },
        Operation::Delete => err
            .server_detail()
            .map(str::to_string)
            .unwrap_or_else(|| DELETE_FAILED.to_string()),
        Operation::Upload { file_name } => {
            let reason = match err {
                ClientError::Validation(message) => message.as_str(),
                _ => err.server_detail().unwrap_or(UNKNOWN_ERROR),
            };
            format!("Failed to upload {}: {}", file_name, reason)
        }
    }
}

/// Message for a successful operation, if the action announces success.
pub fn success_message(op: Operation<'_>) -> Option<String> {
    match op {
        Operation::LoadList | Operation::Download => None,
        Operation::Rename => Some(RENAME_SUCCEEDED.to_string()),
        Operation::Delete => Some(DELETE_SUCCEEDED.to_string()),
        Operation::Upload { file_name } => Some(format!("{} uploaded successfully!", file_name)),
    }
}

/// Broadcasts notices to any number of listeners.
///
/// A notice sent while nobody listens (for instance after the view that
/// started a slow request has gone away) is dropped.
#[derive(Clone)]
pub struct NoticeCenter {
    sender: broadcast::Sender<Notice>,
}

impl NoticeCenter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, notice: Notice) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(Notice::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::error(message));
    }

    /// Publishes the notice matching an operation's outcome.
    pub fn report<T>(&self, op: Operation<'_>, result: &Result<T, ClientError>) {
        match result {
            Ok(_) => {
                if let Some(message) = success_message(op) {
                    self.success(message);
                }
            }
            Err(err) => {
                log::warn!("{:?} failed: {}", op, err);
                self.error(failure_message(op, err));
            }
        }
    }
}

impl Default for NoticeCenter {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_messages_distinguish_access_denied() {
        let denied = failure_message(Operation::Download, &ClientError::AccessDenied);
        let failed = failure_message(
            Operation::Download,
            &ClientError::DownloadFailed { status: 404 },
        );
        let transport = failure_message(
            Operation::Download,
            &ClientError::Transport("reset".into()),
        );
        assert_eq!(denied, ACCESS_DENIED);
        assert_eq!(failed, DOWNLOAD_FAILED);
        assert_eq!(transport, DOWNLOAD_FAILED);
        assert_ne!(denied, failed);
        assert_eq!(
            failure_message(Operation::Download, &ClientError::Unauthenticated),
            NOT_AUTHENTICATED
        );
    }

    #[test]
    fn test_server_detail_is_surfaced_verbatim() {
        let err = ClientError::ServerRejected {
            status: 402,
            detail: Some("Insufficient credits. Please contact administrator.".into()),
        };
        assert_eq!(
            failure_message(Operation::Upload { file_name: "a.mp3" }, &err),
            "Failed to upload a.mp3: Insufficient credits. Please contact administrator."
        );
        assert_eq!(
            failure_message(Operation::Delete, &err),
            "Insufficient credits. Please contact administrator."
        );

        let bare = ClientError::UnexpectedStatus { status: 500 };
        assert_eq!(
            failure_message(Operation::Upload { file_name: "a.mp3" }, &bare),
            "Failed to upload a.mp3: Unknown error"
        );
        assert_eq!(failure_message(Operation::Rename, &bare), RENAME_FAILED);
    }

    #[test]
    fn test_load_failure_message() {
        let err = ClientError::Transport("connection refused".into());
        assert_eq!(failure_message(Operation::LoadList, &err), LOAD_FAILED);
    }

    #[test]
    fn test_report_publishes_to_subscribers() {
        let center = NoticeCenter::new(8);
        let mut rx = center.subscribe();

        center.report::<()>(Operation::Rename, &Ok(()));
        center.report::<()>(Operation::Delete, &Err(ClientError::AccessDenied));
        center.report::<()>(Operation::LoadList, &Ok(()));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, NoticeLevel::Success);
        assert_eq!(first.message, RENAME_SUCCEEDED);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.level, NoticeLevel::Error);
        assert_eq!(second.message, DELETE_FAILED);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_without_listeners_is_dropped() {
        let center = NoticeCenter::default();
        center.error("nobody is listening");
    }
}
