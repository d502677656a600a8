//! Authenticated artifact downloads.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::api::{ArtifactKind, ConversionApi, JobId};
use crate::credentials::CredentialAccessor;
use crate::download::sink::ArtifactSink;
use crate::error::ClientError;
use crate::sanitize::redact_path;

/// Result of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub job_id: JobId,
    pub kind: ArtifactKind,
    /// Name the artifact was offered under.
    pub filename: String,
    /// Where the sink actually put it.
    pub path: PathBuf,
    pub size: usize,
}

/// File name an artifact is saved under: `"{display_name}.{ext}"`.
pub fn artifact_filename(display_name: &str, kind: ArtifactKind) -> String {
    format!("{}.{}", display_name, kind.extension())
}

/// Fetches protected artifacts and hands them to a sink.
///
/// The token is read from the accessor on every call and never kept.
pub struct ArtifactDownloader {
    api: Arc<dyn ConversionApi>,
    credentials: Arc<dyn CredentialAccessor>,
    sink: Arc<dyn ArtifactSink>,
}

impl ArtifactDownloader {
    pub fn new(
        api: Arc<dyn ConversionApi>,
        credentials: Arc<dyn CredentialAccessor>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            api,
            credentials,
            sink,
        }
    }

    pub async fn download(
        &self,
        id: JobId,
        kind: ArtifactKind,
        display_name: &str,
    ) -> Result<SavedArtifact, ClientError> {
        let Some(token) = self.credentials.bearer_token() else {
            warn!("Download of job {} skipped: no bearer token", id);
            return Err(ClientError::Unauthenticated);
        };

        let body = self.api.download(id, kind, &token).await?;
        drop(token);

        let filename = artifact_filename(display_name, kind);
        let path = self.sink.save(&body, &filename)?;
        info!(
            "Saved {} artifact of job {} as {} ({} bytes)",
            kind,
            id,
            redact_path(&path),
            body.len()
        );

        Ok(SavedArtifact {
            job_id: id,
            kind,
            filename,
            path,
            size: body.len(),
        })
    }
}
