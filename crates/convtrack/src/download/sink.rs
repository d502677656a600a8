//! Where downloaded artifacts end up.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ClientError;

/// Receives a downloaded artifact under a suggested file name.
pub trait ArtifactSink: Send + Sync {
    /// Saves `body` and returns where it landed.
    fn save(&self, body: &[u8], filename: &str) -> Result<PathBuf, ClientError>;
}

/// Saves artifacts into a directory.
///
/// The body is first written to a temporary file next to the target and
/// then moved into place, so a failed save never leaves a partial file.
/// An existing file is never overwritten; a numbered variant is used
/// instead (`Notes.txt`, `Notes_2.txt`, ...).
pub struct FileSystemSink {
    directory: PathBuf,
}

impl FileSystemSink {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn stage(&self, body: &[u8], filename: &str) -> Result<NamedTempFile, ClientError> {
        let save_err = |source| ClientError::Save {
            filename: filename.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.directory).map_err(save_err)?;
        let mut staged = NamedTempFile::new_in(&self.directory).map_err(save_err)?;
        staged.write_all(body).map_err(save_err)?;
        staged.flush().map_err(save_err)?;
        Ok(staged)
    }
}

impl ArtifactSink for FileSystemSink {
    fn save(&self, body: &[u8], filename: &str) -> Result<PathBuf, ClientError> {
        let safe_name = safe_filename(filename);
        // Dropping the staged file on any early return removes it
        let mut staged = self.stage(body, &safe_name)?;

        let (base, ext) = match safe_name.rfind('.') {
            Some(dot) if dot > 0 => (&safe_name[..dot], &safe_name[dot..]),
            _ => (safe_name.as_str(), ""),
        };

        for counter in 1..=1000 {
            let candidate = if counter == 1 {
                safe_name.clone()
            } else {
                format!("{}_{}{}", base, counter, ext)
            };
            let target = self.directory.join(&candidate);

            match staged.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    staged = e.file;
                }
                Err(e) => {
                    return Err(ClientError::Save {
                        filename: candidate,
                        source: e.error,
                    })
                }
            }
        }

        Err(ClientError::Save {
            filename: safe_name,
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "too many files with this name",
            ),
        })
    }
}

/// Replaces characters that would escape the target directory.
fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}
