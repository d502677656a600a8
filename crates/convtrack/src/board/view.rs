//! Text rendering of the board.

use std::fmt::Write as _;

use crate::api::{Job, JobState};
use crate::board::editor::EditState;

pub const LOADING: &str = "Loading conversions...";
pub const EMPTY_BOARD: &str = "No conversions yet. Upload an audio file to get started!";
pub const EMPTY_FILTERED: &str = "No conversions found for this user.";

/// `m:ss`, or a dash when the duration is unknown or zero.
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s > 0.0 => {
            let total = s.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "\u{2014}".to_string(),
    }
}

/// The detail line under a job's name.
pub fn status_line(job: &Job) -> String {
    match &job.state {
        JobState::Pending => "Waiting to process...".to_string(),
        JobState::Processing => "Processing...".to_string(),
        JobState::Failed { error_message } => format!("Failed: {}", error_message),
        JobState::Completed { duration, .. } => format!(
            "Duration: {} \u{2022} Language: {} \u{2022} Model: {}",
            format_duration(*duration),
            job.language.as_deref().unwrap_or("").to_uppercase(),
            job.model_used.as_deref().unwrap_or("")
        ),
    }
}

/// Owner line shown to privileged viewers.
pub fn owner_line(job: &Job) -> Option<String> {
    job.owner
        .as_ref()
        .map(|o| format!("{} ({})", o.username, o.email))
}

fn status_marker(job: &Job) -> &'static str {
    match &job.state {
        JobState::Pending | JobState::Processing => "[..]",
        JobState::Completed { .. } => "[ok]",
        JobState::Failed { .. } => "[!!]",
    }
}

/// Renders one row.
pub fn render_row(job: &Job, show_owner: bool, edit: &EditState) -> String {
    let mut out = String::new();
    let title = match edit {
        EditState::Editing { job_id, draft } if *job_id == job.id => {
            format!("[editing] {}", draft)
        }
        _ => job.display_name.clone(),
    };
    let _ = writeln!(out, "{} #{} {}", status_marker(job), job.id, title);
    let _ = writeln!(out, "     {}", status_line(job));

    if show_owner {
        if let Some(owner) = owner_line(job) {
            let _ = writeln!(out, "     {}", owner);
        }
    }

    let artifacts = job.available_artifacts();
    if !artifacts.is_empty() {
        let labels: Vec<&str> = artifacts.iter().map(|k| k.extension()).collect();
        let _ = writeln!(out, "     Download: {}", labels.join(" "));
    }
    out
}

/// Renders the whole board.
pub fn render_board(
    jobs: &[Job],
    loading: bool,
    filter: Option<&str>,
    show_owner: bool,
    edit: &EditState,
) -> String {
    if loading {
        return format!("{}\n", LOADING);
    }

    let mut out = String::new();
    if let Some(filter) = filter {
        let _ = writeln!(out, "Showing results for: {}", filter);
    }
    if jobs.is_empty() {
        let empty = if filter.is_some() {
            EMPTY_FILTERED
        } else {
            EMPTY_BOARD
        };
        let _ = writeln!(out, "{}", empty);
        return out;
    }
    for job in jobs {
        out.push_str(&render_row(job, show_owner, edit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::JobId;
    use crate::testing::job;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(61.0)), "1:01");
        assert_eq!(format_duration(Some(3599.9)), "59:59");
        assert_eq!(format_duration(Some(7265.0)), "121:05");
        assert_eq!(format_duration(Some(0.0)), "\u{2014}");
        assert_eq!(format_duration(None), "\u{2014}");
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status_line(&job(1, "pending")), "Waiting to process...");
        assert_eq!(status_line(&job(1, "processing")), "Processing...");
        assert_eq!(status_line(&job(1, "failed")), "Failed: boom");
        assert_eq!(
            status_line(&job(1, "completed")),
            "Duration: 1:01 \u{2022} Language: EN \u{2022} Model: nova-3"
        );
    }

    #[test]
    fn test_row_lists_downloads_only_when_completed() {
        let done = render_row(&job(3, "completed"), false, &EditState::Viewing);
        assert!(done.contains("Download: txt docx pdf"));
        let pending = render_row(&job(4, "pending"), false, &EditState::Viewing);
        assert!(!pending.contains("Download"));
    }

    #[test]
    fn test_row_shows_draft_while_editing() {
        let edit = EditState::Editing {
            job_id: JobId(3),
            draft: "New nam".to_string(),
        };
        assert!(render_row(&job(3, "completed"), false, &edit).contains("[editing] New nam"));
        assert!(render_row(&job(4, "completed"), false, &edit).contains("Job 4"));
    }

    #[test]
    fn test_empty_board_messages() {
        let edit = EditState::Viewing;
        assert_eq!(render_board(&[], true, None, false, &edit), "Loading conversions...\n");
        assert!(render_board(&[], false, None, false, &edit).contains(EMPTY_BOARD));
        let filtered = render_board(&[], false, Some("alice"), true, &edit);
        assert!(filtered.contains("Showing results for: alice"));
        assert!(filtered.contains(EMPTY_FILTERED));
    }
}
