//! Fixed-interval status polling.
//!
//! One timer runs for as long as the board is mounted. On every tick it
//! looks at the live job snapshot and refreshes only while some job is
//! still pending or processing. Snapshot updates never touch the timer;
//! only a filter change re-arms it, and dropping the [`PollHandle`] stops it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::jobs::list::JobList;
use crate::notify::{NoticeCenter, Operation};

/// Periodic refresher for a [`JobList`].
pub struct PollingScheduler {
    jobs: Arc<JobList>,
    interval: Duration,
    notices: NoticeCenter,
}

impl PollingScheduler {
    pub fn new(jobs: Arc<JobList>, interval: Duration, notices: NoticeCenter) -> Self {
        Self {
            jobs,
            interval,
            notices,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms the timer on the current runtime.
    ///
    /// `filter` carries the active owner filter; a new value re-arms the
    /// timer, and the loop ends once its sender is dropped.
    pub fn start(&self, filter: watch::Receiver<Option<String>>) -> PollHandle {
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.jobs),
            self.interval,
            self.notices.clone(),
            filter,
        ));
        info!("Job polling started (every {:?})", self.interval);
        PollHandle { task: Some(task) }
    }
}

async fn poll_loop(
    jobs: Arc<JobList>,
    period: Duration,
    notices: NoticeCenter,
    mut filter: watch::Receiver<Option<String>>,
) {
    // First tick one full period after arming
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if !jobs.has_active_jobs() {
                    continue;
                }
                let active = filter.borrow().clone();
                debug!("Active jobs present, refreshing");

                // Refreshes are not serialized; a slow one may overlap the next
                let jobs = Arc::clone(&jobs);
                let notices = notices.clone();
                tokio::spawn(async move {
                    let result = jobs.refresh(active.as_deref()).await;
                    if result.is_err() {
                        notices.report(Operation::LoadList, &result);
                    }
                });
            }
            changed = filter.changed() => {
                if changed.is_err() {
                    debug!("Filter source closed, stopping job polling");
                    break;
                }
                timer.reset();
                debug!("Owner filter changed, polling timer re-armed");
            }
        }
    }
}

/// Keeps polling alive; dropping it cancels the timer.
///
/// Refreshes already in flight are left to finish.
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stops polling.
    pub fn stop(mut self) {
        self.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Job polling stopped");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
