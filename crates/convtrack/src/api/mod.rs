//! Conversion service API: wire models and the HTTP client.

pub mod client;
pub mod models;

pub use client::{ConversionApi, HttpConversionApi};
pub use models::{
    ArtifactKind, ArtifactSet, Job, JobId, JobPage, JobState, JobStatus, ListQuery, OwnerInfo,
    UserProfile,
};
