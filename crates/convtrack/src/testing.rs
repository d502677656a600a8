//! In-memory [`ConversionApi`] for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::api::{ArtifactKind, ConversionApi, Job, JobId, JobPage, ListQuery, UserProfile};
use crate::error::ClientError;
use crate::upload::UploadRequest;

/// Builds a job through the same deserialization path as server data.
pub(crate) fn job(id: i64, status: &str) -> Job {
    let completed = status == "completed";
    serde_json::from_value(serde_json::json!({
        "id": id,
        "display_name": format!("Job {}", id),
        "original_filename": format!("job{}.mp3", id),
        "status": status,
        "duration": if completed { Some(61.0) } else { None },
        "model_used": "nova-3",
        "language": if completed { Some("en") } else { None },
        "error_message": if status == "failed" { Some("boom") } else { None },
        "created_at": "2024-01-15T10:30:00",
        "updated_at": "2024-01-15T10:31:00",
        "has_txt": completed,
        "has_docx": completed,
        "has_pdf": completed
    }))
    .expect("valid job fixture")
}

enum Scripted {
    Jobs(Vec<Job>, Duration),
    Fail(ClientError),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    jobs: Mutex<Vec<Job>>,
    scripted: Mutex<VecDeque<Scripted>>,
    list_calls: Mutex<Vec<ListQuery>>,
    rename_failures: Mutex<VecDeque<ClientError>>,
    renames: Mutex<Vec<(JobId, String)>>,
    deletes: Mutex<Vec<JobId>>,
    downloads: Mutex<Vec<(JobId, ArtifactKind, String)>>,
    download_result: Mutex<Option<Result<Vec<u8>, u16>>>,
}

impl FakeApi {
    pub(crate) fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            ..Default::default()
        }
    }

    pub(crate) fn set_jobs(&self, jobs: Vec<Job>) {
        *self.jobs.lock().unwrap() = jobs;
    }

    pub(crate) fn push_list_response(&self, jobs: Vec<Job>, delay: Duration) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Scripted::Jobs(jobs, delay));
    }

    pub(crate) fn fail_next_list(&self, err: ClientError) {
        self.scripted.lock().unwrap().push_back(Scripted::Fail(err));
    }

    pub(crate) fn fail_next_rename(&self, err: ClientError) {
        self.rename_failures.lock().unwrap().push_back(err);
    }

    /// `Ok(body)` or `Err(status)` for every subsequent download.
    pub(crate) fn set_download_result(&self, result: Result<Vec<u8>, u16>) {
        *self.download_result.lock().unwrap() = Some(result);
    }

    fn current_jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }

    pub(crate) fn list_calls(&self) -> Vec<ListQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    pub(crate) fn renames(&self) -> Vec<(JobId, String)> {
        self.renames.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<JobId> {
        self.deletes.lock().unwrap().clone()
    }

    pub(crate) fn downloads(&self) -> Vec<(JobId, ArtifactKind, String)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversionApi for FakeApi {
    async fn list(&self, query: &ListQuery) -> Result<JobPage, ClientError> {
        self.list_calls.lock().unwrap().push(query.clone());
        let scripted = self.scripted.lock().unwrap().pop_front();
        let jobs = match scripted {
            Some(Scripted::Jobs(jobs, delay)) => {
                tokio::time::sleep(delay).await;
                jobs
            }
            Some(Scripted::Fail(err)) => return Err(err),
            None => self.current_jobs(),
        };
        let jobs: Vec<Job> = match &query.search {
            Some(search) => jobs
                .into_iter()
                .filter(|j| {
                    j.owner
                        .as_ref()
                        .is_some_and(|o| o.username.contains(search.as_str()))
                })
                .collect(),
            None => jobs,
        };
        Ok(JobPage {
            total: jobs.len() as u64,
            conversions: jobs,
        })
    }

    async fn rename(&self, id: JobId, display_name: &str) -> Result<(), ClientError> {
        if let Some(err) = self.rename_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.renames
            .lock()
            .unwrap()
            .push((id, display_name.to_string()));
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
            job.display_name = display_name.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: JobId) -> Result<(), ClientError> {
        self.deletes.lock().unwrap().push(id);
        self.jobs.lock().unwrap().retain(|j| j.id != id);
        Ok(())
    }

    async fn download(
        &self,
        id: JobId,
        kind: ArtifactKind,
        token: &SecretString,
    ) -> Result<Vec<u8>, ClientError> {
        self.downloads
            .lock()
            .unwrap()
            .push((id, kind, token.expose_secret().to_string()));
        let result = self.download_result.lock().unwrap().clone();
        match result {
            Some(Ok(body)) => Ok(body),
            Some(Err(403)) => Err(ClientError::AccessDenied),
            Some(Err(status)) => Err(ClientError::DownloadFailed { status }),
            None => Ok(format!("{} for job {}", kind, id).into_bytes()),
        }
    }

    async fn upload(&self, request: &UploadRequest) -> Result<Job, ClientError> {
        let mut created = job(99, "pending");
        created.display_name = request.display_name().to_string();
        created.original_filename = request.file_name().to_string();
        self.jobs.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn current_user(&self) -> Result<UserProfile, ClientError> {
        Ok(UserProfile {
            id: 1,
            username: "tester".to_string(),
            email: "tester@example.com".to_string(),
            is_active: true,
            is_admin: false,
            credits: 60.0,
        })
    }
}
