//! Inline rename of a single job.

use log::debug;

use crate::api::{Job, JobId};
use crate::error::ClientError;
use crate::jobs::JobList;

pub const EMPTY_NAME: &str = "Name cannot be empty";
const NOT_EDITING: &str = "No rename in progress";

/// Edit state of the board. Only one job can be edited at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing { job_id: JobId, draft: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The server accepted the new name.
    Renamed { job_id: JobId, name: String },
    /// The draft matched the current name; nothing was sent.
    Unchanged { job_id: JobId },
}

#[derive(Debug, Default)]
pub struct RenameEditor {
    state: EditState,
}

impl RenameEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn editing(&self) -> Option<JobId> {
        match &self.state {
            EditState::Editing { job_id, .. } => Some(*job_id),
            EditState::Viewing => None,
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Viewing => None,
        }
    }

    /// Starts editing `job` with its current name as the draft. Any other
    /// edit in progress is discarded.
    pub fn begin(&mut self, job: &Job) {
        if let Some(previous) = self.editing().filter(|id| *id != job.id) {
            debug!("Discarding rename of job {} to edit job {}", previous, job.id);
        }
        self.state = EditState::Editing {
            job_id: job.id,
            draft: job.display_name.clone(),
        };
    }

    /// Replaces the draft text. Ignored when nothing is being edited.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            EditState::Editing { draft, .. } => {
                *draft = text.into();
                true
            }
            EditState::Viewing => false,
        }
    }

    pub fn cancel(&mut self) {
        self.state = EditState::Viewing;
    }

    /// Sends the draft to the server.
    ///
    /// A blank draft is rejected locally. A draft equal to the current name
    /// ends the edit without a request. On any failure the edit stays open
    /// with the draft as typed.
    pub async fn commit(&mut self, jobs: &JobList) -> Result<RenameOutcome, ClientError> {
        let EditState::Editing { job_id, draft } = &self.state else {
            return Err(ClientError::Validation(NOT_EDITING.to_string()));
        };
        let job_id = *job_id;
        let name = draft.trim().to_string();

        if name.is_empty() {
            return Err(ClientError::Validation(EMPTY_NAME.to_string()));
        }
        if jobs
            .get(job_id)
            .is_some_and(|current| current.display_name == name)
        {
            self.state = EditState::Viewing;
            return Ok(RenameOutcome::Unchanged { job_id });
        }

        jobs.api().rename(job_id, &name).await?;
        self.state = EditState::Viewing;
        Ok(RenameOutcome::Renamed { job_id, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{job, FakeApi};
    use std::sync::Arc;

    async fn loaded(api: &Arc<FakeApi>) -> JobList {
        let list = JobList::new(api.clone(), 100);
        list.refresh(None).await.unwrap();
        list
    }

    #[tokio::test]
    async fn test_successful_commit_returns_to_viewing() {
        let api = Arc::new(FakeApi::new(vec![job(1, "completed")]));
        let list = loaded(&api).await;
        let mut editor = RenameEditor::new();

        editor.begin(&list.get(JobId(1)).unwrap());
        assert_eq!(editor.draft(), Some("Job 1"));
        editor.set_draft("Quarterly review");

        let outcome = editor.commit(&list).await.unwrap();
        assert_eq!(
            outcome,
            RenameOutcome::Renamed {
                job_id: JobId(1),
                name: "Quarterly review".to_string()
            }
        );
        assert_eq!(editor.state(), &EditState::Viewing);
        assert_eq!(api.renames(), vec![(JobId(1), "Quarterly review".to_string())]);

        list.refresh(None).await.unwrap();
        assert_eq!(list.get(JobId(1)).unwrap().display_name, "Quarterly review");
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_draft() {
        let api = Arc::new(FakeApi::new(vec![job(1, "completed")]));
        let list = loaded(&api).await;
        let mut editor = RenameEditor::new();
        editor.begin(&list.get(JobId(1)).unwrap());
        editor.set_draft("Draft  ");

        api.fail_next_rename(ClientError::UnexpectedStatus { status: 500 });
        let err = editor.commit(&list).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
        assert_eq!(
            editor.state(),
            &EditState::Editing {
                job_id: JobId(1),
                draft: "Draft  ".to_string()
            }
        );
        assert_eq!(list.get(JobId(1)).unwrap().display_name, "Job 1");
    }

    #[tokio::test]
    async fn test_blank_draft_is_rejected_locally() {
        let api = Arc::new(FakeApi::new(vec![job(1, "pending")]));
        let list = loaded(&api).await;
        let mut editor = RenameEditor::new();
        editor.begin(&list.get(JobId(1)).unwrap());
        editor.set_draft("   ");

        let err = editor.commit(&list).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(err.to_string(), format!("Validation failed: {}", EMPTY_NAME));
        assert_eq!(editor.draft(), Some("   "));
        assert!(api.renames().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_draft_sends_nothing() {
        let api = Arc::new(FakeApi::new(vec![job(1, "pending")]));
        let list = loaded(&api).await;
        let mut editor = RenameEditor::new();
        editor.begin(&list.get(JobId(1)).unwrap());

        let outcome = editor.commit(&list).await.unwrap();
        assert_eq!(outcome, RenameOutcome::Unchanged { job_id: JobId(1) });
        assert_eq!(editor.state(), &EditState::Viewing);
        assert!(api.renames().is_empty());
    }

    #[tokio::test]
    async fn test_only_one_row_edited_at_a_time() {
        let api = Arc::new(FakeApi::new(vec![job(1, "pending"), job(2, "pending")]));
        let list = loaded(&api).await;
        let mut editor = RenameEditor::new();

        editor.begin(&list.get(JobId(1)).unwrap());
        editor.set_draft("first draft");
        editor.begin(&list.get(JobId(2)).unwrap());
        assert_eq!(editor.editing(), Some(JobId(2)));
        assert_eq!(editor.draft(), Some("Job 2"));

        editor.cancel();
        assert_eq!(editor.editing(), None);
        assert!(!editor.set_draft("ignored"));
        assert!(editor.commit(&list).await.is_err());
    }
}
