//! Media submission.
//!
//! Creating a job is owned by the server; the client only checks that the
//! file looks like something the service accepts and derives the initial
//! display name from the file name.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};

use crate::error::ClientError;

/// Media extensions accepted by the conversion service (lowercase, no dot).
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "flac", "aac", "ogg", "opus", "webm", "mp4", "mkv", "mov",
];

/// Language value meaning "let the service detect it".
const AUTO_LANGUAGE: &str = "auto";

/// A validated upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    path: PathBuf,
    file_name: String,
    display_name: String,
    language: Option<String>,
}

impl UploadRequest {
    /// Validates `path` and prepares an upload. `language` of `None`, empty
    /// or `"auto"` leaves detection to the service.
    pub fn from_path(path: impl Into<PathBuf>, language: Option<&str>) -> Result<Self, ClientError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ClientError::Validation(format!("'{}' is not a file path", path.display()))
            })?
            .to_string();

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ClientError::Validation(format!(
                "File type .{} not supported",
                extension
            )));
        }

        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case(AUTO_LANGUAGE))
            .map(str::to_string);

        Ok(Self {
            display_name: display_name_for(&file_name),
            path,
            file_name,
            language,
        })
    }

    /// Replaces the derived display name; blank names are ignored.
    pub fn with_display_name(mut self, name: &str) -> Self {
        if !name.trim().is_empty() {
            self.display_name = name.to_string();
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub(crate) async fn to_multipart(&self) -> Result<Form, ClientError> {
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            ClientError::Validation(format!("Cannot read '{}': {}", self.path.display(), e))
        })?;
        let mime = mime_guess::from_path(&self.path).first_or_octet_stream();
        let part = Part::bytes(data)
            .file_name(self.file_name.clone())
            .mime_str(mime.essence_str())?;

        let mut form = Form::new()
            .part("file", part)
            .text("display_name", self.display_name.clone());
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }
        Ok(form)
    }
}

/// File name without its last extension; the full name when nothing remains.
pub fn display_name_for(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(0) | None => file_name.to_string(),
        Some(idx) => file_name[..idx].to_string(),
    }
}
