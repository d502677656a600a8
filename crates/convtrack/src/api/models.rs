//! Wire and domain types for conversion jobs.
//!
//! The server sends flat records with a free-form `status` string and three
//! artifact flags. They are folded into [`JobState`] on deserialization so
//! that artifacts only exist on completed jobs and an error message only on
//! failed ones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(JobId)
    }
}

/// Status tag of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// True while the server may still change this job.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    /// Staying in the same status is allowed; terminal statuses never move.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self == next {
            return true;
        }
        self.is_active() && next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downloadable output format of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Text,
    Word,
    Pdf,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Text, ArtifactKind::Word, ArtifactKind::Pdf];

    /// File extension of the saved artifact; also the download path segment.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Text => "txt",
            ArtifactKind::Word => "docx",
            ArtifactKind::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Text => "TXT",
            ArtifactKind::Word => "WORD",
            ArtifactKind::Pdf => "PDF",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ArtifactKind::Text),
            "docx" | "word" => Ok(ArtifactKind::Word),
            "pdf" => Ok(ArtifactKind::Pdf),
            other => Err(format!(
                "unknown artifact kind '{}' (expected txt, docx or pdf)",
                other
            )),
        }
    }
}

/// Availability of each artifact kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub txt: bool,
    pub docx: bool,
    pub pdf: bool,
}

impl ArtifactSet {
    pub fn contains(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Text => self.txt,
            ArtifactKind::Word => self.docx,
            ArtifactKind::Pdf => self.pdf,
        }
    }

    /// Available kinds in display order (text, word, pdf).
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        !(self.txt || self.docx || self.pdf)
    }
}

/// Lifecycle state of a job, carrying the data only that state may hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed {
        artifacts: ArtifactSet,
        duration: Option<f64>,
    },
    Failed {
        error_message: String,
    },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Owner of a job, only sent to administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub credits: Option<f64>,
}

/// A conversion job as observed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JobRecord")]
pub struct Job {
    pub id: JobId,
    pub display_name: String,
    pub original_filename: String,
    #[serde(flatten)]
    pub state: JobState,
    pub model_used: Option<String>,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerInfo>,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Artifacts that can be downloaded; always empty unless completed.
    pub fn available_artifacts(&self) -> Vec<ArtifactKind> {
        match &self.state {
            JobState::Completed { artifacts, .. } => artifacts.kinds(),
            _ => Vec::new(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { error_message } => Some(error_message),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        match &self.state {
            JobState::Completed { duration, .. } => *duration,
            _ => None,
        }
    }
}

const UNKNOWN_FAILURE: &str = "Unknown error";

/// Flat record as returned by the server.
#[derive(Debug, Clone, Deserialize)]
struct JobRecord {
    id: JobId,
    display_name: String,
    original_filename: String,
    status: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    model_used: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    has_txt: bool,
    #[serde(default)]
    has_docx: bool,
    #[serde(default)]
    has_pdf: bool,
    #[serde(default)]
    user: Option<OwnerInfo>,
}

fn parse_status(s: &str, id: JobId) -> JobStatus {
    match s {
        "pending" => JobStatus::Pending,
        "processing" => JobStatus::Processing,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        other => {
            log::warn!(
                "Unknown job status '{}' for job {}, treating as pending",
                other,
                id
            );
            JobStatus::Pending
        }
    }
}

impl From<JobRecord> for Job {
    fn from(record: JobRecord) -> Self {
        let status = parse_status(&record.status, record.id);
        let flags = ArtifactSet {
            txt: record.has_txt,
            docx: record.has_docx,
            pdf: record.has_pdf,
        };

        if status != JobStatus::Completed && !flags.is_empty() {
            log::warn!(
                "Job {} reports artifacts while {}, ignoring them",
                record.id,
                status
            );
        }
        if status != JobStatus::Failed && record.error_message.is_some() {
            log::debug!("Job {} carries an error message while {}", record.id, status);
        }

        let state = match status {
            JobStatus::Pending => JobState::Pending,
            JobStatus::Processing => JobState::Processing,
            JobStatus::Completed => JobState::Completed {
                artifacts: flags,
                duration: record.duration,
            },
            JobStatus::Failed => JobState::Failed {
                error_message: record
                    .error_message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
            },
        };

        Self {
            id: record.id,
            display_name: record.display_name,
            original_filename: record.original_filename,
            state,
            model_used: record.model_used,
            language: record.language,
            created_at: record.created_at,
            updated_at: record.updated_at,
            owner: record.user,
        }
    }
}

/// Accepts RFC 3339 timestamps and the naive ISO form the server emits,
/// which is taken to be UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
}

/// One page of the job list.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPage {
    pub conversions: Vec<Job>,
    #[serde(default)]
    pub total: u64,
}

/// Parameters of a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: u32,
    /// Owner substring filter, honoured for administrators only.
    pub search: Option<String>,
}

impl ListQuery {
    /// First page with an optional owner filter. Empty filters are dropped.
    pub fn first_page(limit: u32, search: Option<&str>) -> Self {
        Self {
            offset: 0,
            limit,
            search: search.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Query-string pairs using the server's parameter names.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("skip", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search_user", search.clone()));
        }
        params
    }
}

/// The authenticated viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub credits: f64,
}

fn default_true() -> bool {
    true
}

impl UserProfile {
    /// Elevated privilege: sees every job and may filter by owner.
    pub fn is_privileged(&self) -> bool {
        self.is_admin
    }
}
