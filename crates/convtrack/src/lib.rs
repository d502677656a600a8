pub mod api;
pub mod board;
pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod notify;
pub mod sanitize;
pub mod upload;

#[cfg(test)]
mod testing;

pub use api::{
    ArtifactKind, ConversionApi, HttpConversionApi, Job, JobId, JobPage, JobStatus, ListQuery,
    UserProfile,
};
pub use board::{ConversionBoard, EditState, RenameEditor, RenameOutcome, SearchFilter};
pub use config::{load_config, ClientConfig};
pub use credentials::{CredentialAccessor, MemoryCredentials, TokenStore};
pub use download::{ArtifactDownloader, ArtifactSink, FileSystemSink, SavedArtifact};
pub use error::{ClientError, ConfigError, ConvtrackError, CredentialError, ErrorKind, Result};
pub use jobs::{JobList, PollHandle, PollingScheduler};
pub use notify::{Notice, NoticeCenter, NoticeLevel, Operation};
pub use upload::UploadRequest;
