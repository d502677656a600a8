//! REST client for the conversion service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::Instrument;

use crate::api::models::{ArtifactKind, Job, JobId, JobPage, ListQuery, UserProfile};
use crate::config::ServerConfig;
use crate::credentials::CredentialAccessor;
use crate::error::ClientError;
use crate::sanitize::redact_url;
use crate::upload::UploadRequest;

/// Maximum length of an error body kept for diagnostics.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Operations the client needs from the conversion service.
///
/// Every call is a single request: no retries, no backoff.
#[async_trait]
pub trait ConversionApi: Send + Sync {
    /// Fetches one page of jobs visible to the viewer.
    async fn list(&self, query: &ListQuery) -> Result<JobPage, ClientError>;

    /// Sets a job's display name.
    async fn rename(&self, id: JobId, display_name: &str) -> Result<(), ClientError>;

    /// Deletes a job and its artifacts.
    async fn delete(&self, id: JobId) -> Result<(), ClientError>;

    /// Fetches an artifact body using an explicit bearer token.
    ///
    /// Only the status code of a failed response is interpreted.
    async fn download(
        &self,
        id: JobId,
        kind: ArtifactKind,
        token: &SecretString,
    ) -> Result<Vec<u8>, ClientError>;

    /// Submits a media file for conversion.
    async fn upload(&self, request: &UploadRequest) -> Result<Job, ClientError>;

    /// Returns the authenticated viewer.
    async fn current_user(&self) -> Result<UserProfile, ClientError>;
}

/// Error body shape of the service; `detail` is only used when it is a string.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// Maps a non-success response of a JSON endpoint to a classified error.
async fn classify_failure(response: Response) -> ClientError {
    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return ClientError::AccessDenied;
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail.as_str().map(str::to_string));
        return ClientError::ServerRejected {
            status: status.as_u16(),
            detail,
        };
    }

    debug!(
        "Unexpected response ({}): {}",
        status,
        truncate_body(&body)
    );
    ClientError::UnexpectedStatus {
        status: status.as_u16(),
    }
}

/// Creates an HTTP client with the configured timeouts.
fn create_http_client(connect: Duration, request: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .connect_timeout(connect)
        .timeout(request)
        .build()
        .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))
}

/// [`ConversionApi`] over HTTP.
pub struct HttpConversionApi {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialAccessor>,
}

impl HttpConversionApi {
    pub fn new(
        config: &ServerConfig,
        credentials: Arc<dyn CredentialAccessor>,
    ) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!("Using conversion service at {}", redact_url(&base_url));
        Ok(Self {
            client: create_http_client(config.connect_timeout(), config.request_timeout())?,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the stored token, read afresh for this request.
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorized(builder).send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_failure(response).await)
        }
    }
}

#[async_trait]
impl ConversionApi for HttpConversionApi {
    async fn list(&self, query: &ListQuery) -> Result<JobPage, ClientError> {
        let span = tracing::info_span!(
            "api.list",
            limit = query.limit,
            filtered = query.search.is_some()
        );
        async {
            let request = self
                .client
                .get(self.url("/api/conversions/"))
                .query(&query.to_params());
            let page: JobPage = self.send(request).await?.json().await?;
            debug!("Listed {} of {} jobs", page.conversions.len(), page.total);
            Ok(page)
        }
        .instrument(span)
        .await
    }

    async fn rename(&self, id: JobId, display_name: &str) -> Result<(), ClientError> {
        let span = tracing::info_span!("api.rename", job_id = id.0);
        async {
            let request = self
                .client
                .patch(self.url(&format!("/api/conversions/{}", id)))
                .json(&serde_json::json!({ "display_name": display_name }));
            self.send(request).await?;
            info!("Renamed job {}", id);
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, id: JobId) -> Result<(), ClientError> {
        let span = tracing::info_span!("api.delete", job_id = id.0);
        async {
            let request = self
                .client
                .delete(self.url(&format!("/api/conversions/{}", id)));
            self.send(request).await?;
            info!("Deleted job {}", id);
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn download(
        &self,
        id: JobId,
        kind: ArtifactKind,
        token: &SecretString,
    ) -> Result<Vec<u8>, ClientError> {
        let span = tracing::info_span!("api.download", job_id = id.0, kind = kind.extension());
        async {
            let response = self
                .client
                .get(self.url(&format!(
                    "/api/conversions/{}/download/{}",
                    id,
                    kind.extension()
                )))
                .bearer_auth(token.expose_secret())
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::FORBIDDEN {
                return Err(ClientError::AccessDenied);
            }
            if !status.is_success() {
                return Err(ClientError::DownloadFailed {
                    status: status.as_u16(),
                });
            }

            let bytes = response.bytes().await?;
            debug!("Downloaded {} bytes", bytes.len());
            Ok(bytes.to_vec())
        }
        .instrument(span)
        .await
    }

    async fn upload(&self, request: &UploadRequest) -> Result<Job, ClientError> {
        let span = tracing::info_span!("api.upload", file = %request.file_name());
        async {
            let form = request.to_multipart().await?;
            let builder = self
                .client
                .post(self.url("/api/conversions/upload"))
                .multipart(form);
            let job: Job = self.send(builder).await?.json().await?;
            info!("Uploaded {} as job {}", request.file_name(), job.id);
            Ok(job)
        }
        .instrument(span)
        .await
    }

    async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let request = self.client.get(self.url("/api/auth/me"));
        let profile: UserProfile = self.send(request).await?.json().await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentials;

    fn server(url: &str) -> ServerConfig {
        ServerConfig {
            base_url: url.to_string(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = HttpConversionApi::new(
            &server("http://localhost:8000/"),
            Arc::new(MemoryCredentials::default()),
        )
        .unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(
            api.url("/api/conversions/"),
            "http://localhost:8000/api/conversions/"
        );
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("... (truncated)"));
        assert!(truncated.len() < 250);
        assert_eq!(truncate_body("short"), "short");
    }
}
