pub mod downloader;
pub mod sink;

pub use downloader::{artifact_filename, ArtifactDownloader, SavedArtifact};
pub use sink::{ArtifactSink, FileSystemSink};
