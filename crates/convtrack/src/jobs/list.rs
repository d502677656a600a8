//! The job board: the client's only copy of the job collection.
//!
//! Every refresh fetches the first page and swaps it in whole. There is no
//! merging with the previous snapshot and no attempt to order concurrent
//! refreshes: whichever completes last wins.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, warn};

use crate::api::{ConversionApi, Job, JobId, ListQuery};
use crate::error::ClientError;

/// Owner of the job snapshot. Readers clone the `Arc`, never the jobs.
pub struct JobList {
    api: Arc<dyn ConversionApi>,
    page_limit: u32,
    snapshot: RwLock<Arc<Vec<Job>>>,
    loading: AtomicBool,
    revision: AtomicU64,
}

impl JobList {
    pub fn new(api: Arc<dyn ConversionApi>, page_limit: u32) -> Self {
        Self {
            api,
            page_limit,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            loading: AtomicBool::new(true),
            revision: AtomicU64::new(0),
        }
    }

    pub fn api(&self) -> &Arc<dyn ConversionApi> {
        &self.api
    }

    /// Most jobs one refresh fetches; older jobs are never on the board.
    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Re-fetches the board, optionally filtered by owner, and replaces the
    /// snapshot. On failure the previous snapshot stays in place.
    ///
    /// Returns the number of jobs in the new snapshot.
    pub async fn refresh(&self, filter: Option<&str>) -> Result<usize, ClientError> {
        let query = ListQuery::first_page(self.page_limit, filter);
        let result = self.api.list(&query).await;

        let outcome = match result {
            Ok(page) => {
                let count = page.conversions.len();
                self.replace(page.conversions);
                Ok(count)
            }
            Err(e) => {
                warn!("Job list refresh failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        };

        if self.loading.swap(false, Ordering::AcqRel) {
            debug!("Initial job list load finished");
        }
        outcome
    }

    fn replace(&self, jobs: Vec<Job>) {
        let mut guard = match self.snapshot.write() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Job list lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        for job in &jobs {
            if let Some(previous) = guard.iter().find(|p| p.id == job.id) {
                if !previous.status().can_advance_to(job.status()) {
                    warn!(
                        "Job {} went from {} back to {}, accepting server state",
                        job.id,
                        previous.status(),
                        job.status()
                    );
                }
            }
        }

        *guard = Arc::new(jobs);
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Job>> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => {
                warn!("Job list lock was poisoned, recovering");
                Arc::clone(&poisoned.into_inner())
            }
        }
    }

    /// True when any job is pending or processing.
    pub fn has_active_jobs(&self) -> bool {
        self.snapshot().iter().any(Job::is_active)
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.snapshot().iter().find(|j| j.id == id).cloned()
    }

    /// True until the first refresh has completed, successfully or not.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Number of snapshots applied so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}
