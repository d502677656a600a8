//! Shared helpers for convtrack integration tests.
//!
//! - JSON builders for server payloads
//! - `TestServer`, a wiremock server plus an API client pointed at it

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::MockServer;

use convtrack::api::{HttpConversionApi, UserProfile};
use convtrack::board::ConversionBoard;
use convtrack::config::{PollingConfig, ServerConfig};
use convtrack::credentials::MemoryCredentials;
use convtrack::download::FileSystemSink;
use convtrack::notify::NoticeCenter;

pub const TOKEN: &str = "test-token-123";

/// Builder for a job as the server returns it.
pub struct JobJson {
    value: Value,
}

impl JobJson {
    pub fn new(id: i64, display_name: &str) -> Self {
        Self {
            value: json!({
                "id": id,
                "display_name": display_name,
                "original_filename": format!("{}.mp3", display_name),
                "status": "pending",
                "created_at": "2024-03-01T09:00:00",
                "updated_at": "2024-03-01T09:00:00",
                "has_txt": false,
                "has_docx": false,
                "has_pdf": false
            }),
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.value["status"] = json!(status);
        self
    }

    /// Completed with the given artifacts available.
    pub fn completed(mut self, txt: bool, docx: bool, pdf: bool) -> Self {
        self.value["status"] = json!("completed");
        self.value["duration"] = json!(125.0);
        self.value["model_used"] = json!("nova-3");
        self.value["language"] = json!("en");
        self.value["has_txt"] = json!(txt);
        self.value["has_docx"] = json!(docx);
        self.value["has_pdf"] = json!(pdf);
        self
    }

    pub fn failed(mut self, message: &str) -> Self {
        self.value["status"] = json!("failed");
        self.value["error_message"] = json!(message);
        self
    }

    pub fn owner(mut self, username: &str) -> Self {
        self.value["user"] = json!({
            "id": 42,
            "username": username,
            "email": format!("{}@example.com", username)
        });
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

pub fn page(jobs: Vec<Value>) -> Value {
    let total = jobs.len();
    json!({ "conversions": jobs, "total": total })
}

pub fn viewer(is_admin: bool) -> UserProfile {
    UserProfile {
        id: 1,
        username: if is_admin { "admin" } else { "alice" }.to_string(),
        email: "viewer@example.com".to_string(),
        is_active: true,
        is_admin,
        credits: 30.0,
    }
}

/// A mock conversion service and a client for it.
pub struct TestServer {
    pub server: MockServer,
    pub credentials: Arc<MemoryCredentials>,
    pub downloads: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_token(Some(TOKEN)).await
    }

    pub async fn with_token(token: Option<&str>) -> Self {
        Self {
            server: MockServer::start().await,
            credentials: Arc::new(MemoryCredentials::new(token)),
            downloads: TempDir::new().expect("temp dir"),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            base_url: self.server.uri(),
            connect_timeout_secs: 2,
            request_timeout_secs: 5,
        }
    }

    pub fn api(&self) -> Arc<HttpConversionApi> {
        Arc::new(
            HttpConversionApi::new(&self.server_config(), self.credentials.clone())
                .expect("client"),
        )
    }

    pub fn board(&self, is_admin: bool, interval_ms: u64) -> ConversionBoard {
        let polling = PollingConfig {
            interval_ms,
            ..PollingConfig::default()
        };
        ConversionBoard::new(
            viewer(is_admin),
            self.api(),
            self.credentials.clone(),
            Arc::new(FileSystemSink::new(self.downloads.path())),
            &polling,
            NoticeCenter::new(64),
        )
    }

    /// Query pairs of every list request received so far.
    pub async fn list_queries(&self) -> Vec<Vec<(String, String)>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/api/conversions/")
            .map(|r| r.url.query_pairs().into_owned().collect())
            .collect()
    }
}
