//! Job board state and its polling timer.

pub mod list;
pub mod poller;

pub use list::JobList;
pub use poller::{PollHandle, PollingScheduler};
