//! The conversion board for one viewer.
//!
//! [`ConversionBoard`] wires the job list, poller, downloader, rename
//! editor and owner filter together. Every user action returns its typed
//! result and is also reported on the board's [`NoticeCenter`]; a
//! successful change is followed by a refresh.

pub mod editor;
pub mod search;
pub mod view;

pub use editor::{EditState, RenameEditor, RenameOutcome};
pub use search::SearchFilter;

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::api::{ArtifactKind, ConversionApi, Job, JobId, UserProfile};
use crate::config::PollingConfig;
use crate::credentials::CredentialAccessor;
use crate::download::{ArtifactDownloader, ArtifactSink, SavedArtifact};
use crate::error::ClientError;
use crate::jobs::{JobList, PollHandle, PollingScheduler};
use crate::notify::{NoticeCenter, Operation};
use crate::upload::UploadRequest;

const ADMIN_ONLY: &str = "Search is only available to administrators";

pub struct ConversionBoard {
    viewer: UserProfile,
    jobs: Arc<JobList>,
    scheduler: PollingScheduler,
    downloader: ArtifactDownloader,
    editor: RenameEditor,
    filter: SearchFilter,
    notices: NoticeCenter,
    poll: Option<PollHandle>,
}

impl ConversionBoard {
    pub fn new(
        viewer: UserProfile,
        api: Arc<dyn ConversionApi>,
        credentials: Arc<dyn CredentialAccessor>,
        sink: Arc<dyn ArtifactSink>,
        polling: &PollingConfig,
        notices: NoticeCenter,
    ) -> Self {
        let jobs = Arc::new(JobList::new(Arc::clone(&api), polling.page_limit));
        Self {
            scheduler: PollingScheduler::new(Arc::clone(&jobs), polling.interval(), notices.clone()),
            downloader: ArtifactDownloader::new(api, credentials, sink),
            editor: RenameEditor::new(),
            filter: SearchFilter::new(),
            viewer,
            jobs,
            notices,
            poll: None,
        }
    }

    /// Loads the board and arms the polling timer.
    pub async fn mount(&mut self) {
        // Failure is already reported; the board still mounts empty
        let _ = self.refresh().await;
        if self.poll.is_none() {
            self.poll = Some(self.scheduler.start(self.filter.subscribe()));
        }
        info!("Board mounted for {}", self.viewer.username);
    }

    /// Stops polling. Requests already in flight still complete.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.stop();
            self.editor.cancel();
            debug!("Board unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.poll.is_some()
    }

    pub fn viewer(&self) -> &UserProfile {
        &self.viewer
    }

    pub fn jobs(&self) -> &Arc<JobList> {
        &self.jobs
    }

    pub fn notices(&self) -> &NoticeCenter {
        &self.notices
    }

    pub fn editor(&self) -> &RenameEditor {
        &self.editor
    }

    /// Filter in effect for list requests.
    pub fn active_filter(&self) -> Option<String> {
        self.filter.active()
    }

    /// Re-fetches with the active filter.
    pub async fn refresh(&self) -> Result<usize, ClientError> {
        let result = self.jobs.refresh(self.filter.active().as_deref()).await;
        if result.is_err() {
            self.notices.report(Operation::LoadList, &result);
        }
        result
    }

    /// The owner filter, for privileged viewers only.
    pub fn search(&mut self) -> Option<&mut SearchFilter> {
        if self.viewer.is_privileged() {
            Some(&mut self.filter)
        } else {
            None
        }
    }

    /// Applies the typed filter and refreshes.
    pub async fn submit_search(&mut self) -> Result<usize, ClientError> {
        let Some(filter) = self.search() else {
            return Err(ClientError::Validation(ADMIN_ONLY.to_string()));
        };
        filter.submit();
        self.refresh().await
    }

    /// Removes the filter and refreshes unfiltered.
    pub async fn clear_search(&mut self) -> Result<usize, ClientError> {
        let Some(filter) = self.search() else {
            return Err(ClientError::Validation(ADMIN_ONLY.to_string()));
        };
        filter.clear();
        self.refresh().await
    }

    /// Looks a job up in the current snapshot, which only holds the first
    /// page of results.
    fn find(&self, id: JobId) -> Result<Job, ClientError> {
        self.jobs.get(id).ok_or_else(|| {
            ClientError::Validation(format!(
                "Conversion {} is not among the {} most recent conversions on the board",
                id,
                self.jobs.page_limit()
            ))
        })
    }

    /// Opens the rename editor on a job. Fails if the job is not on the board.
    pub fn begin_edit(&mut self, id: JobId) -> Result<(), ClientError> {
        let job = self.find(id)?;
        self.editor.begin(&job);
        Ok(())
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        self.editor.set_draft(text)
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    pub async fn commit_edit(&mut self) -> Result<RenameOutcome, ClientError> {
        let result = self.editor.commit(&self.jobs).await;
        match &result {
            Ok(RenameOutcome::Renamed { .. }) => {
                self.notices.report(Operation::Rename, &result);
                let _ = self.refresh().await;
            }
            Ok(RenameOutcome::Unchanged { .. }) => {}
            Err(_) => self.notices.report(Operation::Rename, &result),
        }
        result
    }

    /// Downloads an artifact of a job on the board under its display name.
    pub async fn download(
        &self,
        id: JobId,
        kind: ArtifactKind,
    ) -> Result<SavedArtifact, ClientError> {
        let result = match self.find(id) {
            Ok(job) if job.available_artifacts().contains(&kind) => {
                self.downloader.download(id, kind, &job.display_name).await
            }
            Ok(_) => Err(ClientError::Validation(format!(
                "{} is not available for conversion {}",
                kind.label(),
                id
            ))),
            Err(e) => Err(e),
        };
        self.notices.report(Operation::Download, &result);
        result
    }

    /// Deletes a job. Confirmation is up to the caller.
    pub async fn delete(&mut self, id: JobId) -> Result<(), ClientError> {
        let result = self.jobs.api().delete(id).await;
        self.notices.report(Operation::Delete, &result);
        if result.is_ok() {
            if self.editor.editing() == Some(id) {
                self.editor.cancel();
            }
            let _ = self.refresh().await;
        }
        result
    }

    /// Submits a media file; the new job shows up after the refresh.
    pub async fn upload(
        &self,
        path: &Path,
        language: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<Job, ClientError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let result = match UploadRequest::from_path(path, language) {
            Ok(request) => {
                let request = match display_name {
                    Some(name) => request.with_display_name(name),
                    None => request,
                };
                self.jobs.api().upload(&request).await
            }
            Err(e) => Err(e),
        };

        self.notices.report(
            Operation::Upload {
                file_name: &file_name,
            },
            &result,
        );
        if result.is_ok() {
            let _ = self.refresh().await;
        }
        result
    }

    /// Text rendering of the current board.
    pub fn render(&self) -> String {
        view::render_board(
            &self.jobs.snapshot(),
            self.jobs.is_loading(),
            self.filter.active().as_deref(),
            self.viewer.is_privileged(),
            self.editor.state(),
        )
    }
}
