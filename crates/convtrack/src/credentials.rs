//! Bearer token access.
//!
//! Operations never hold on to a token: every request asks the accessor
//! again, so a token removed from storage (logout, expiry cleanup) takes
//! effect on the very next operation. Sources are consulted in priority
//! order:
//!
//! 1. **Env var** - for scripted use (e.g. `CONVTRACK_TOKEN`)
//! 2. **Token file** - the persistent store written at login

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use secrecy::SecretString;

use crate::config::{expand_home, CredentialsConfig};
use crate::error::CredentialError;

/// Synchronous read/clear access to the current bearer token.
pub trait CredentialAccessor: Send + Sync {
    /// Returns the current token, or `None` when the viewer is signed out.
    fn bearer_token(&self) -> Option<SecretString>;

    /// Forgets the stored token.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Token persisted on disk, optionally overridden by an environment variable.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    file: Option<PathBuf>,
    env_var: Option<String>,
}

impl TokenStore {
    pub fn new(file: Option<PathBuf>, env_var: Option<String>) -> Self {
        Self { file, env_var }
    }

    pub fn from_config(config: &CredentialsConfig) -> Self {
        Self {
            file: config
                .token_file
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| PathBuf::from(expand_home(p))),
            env_var: config.token_env_var.clone().filter(|v| !v.is_empty()),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn read_env(&self) -> Result<Option<SecretString>, CredentialError> {
        let Some(name) = &self.env_var else {
            return Ok(None);
        };
        match std::env::var(name) {
            Ok(value) => Ok(non_empty(&value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(CredentialError::EnvVarNotUnicode { name: name.clone() })
            }
        }
    }

    fn read_file(&self) -> Result<Option<SecretString>, CredentialError> {
        let Some(path) = &self.file else {
            return Ok(None);
        };
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(non_empty(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::ReadFile {
                path: path.clone(),
                source: e,
            }),
        }
    }
}

fn non_empty(raw: &str) -> Option<SecretString> {
    // Token files and env vars often carry a trailing newline
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(SecretString::from(trimmed.to_string()))
    }
}

impl CredentialAccessor for TokenStore {
    fn bearer_token(&self) -> Option<SecretString> {
        let resolved = match self.read_env() {
            Ok(Some(token)) => Ok(Some(token)),
            Ok(None) => self.read_file(),
            Err(e) => Err(e),
        };
        resolved.unwrap_or_else(|e| {
            log::warn!("Could not read bearer token: {}", e);
            None
        })
    }

    fn clear(&self) -> Result<(), CredentialError> {
        if let Some(name) = &self.env_var {
            log::debug!("Token from environment variable '{}' cannot be cleared", name);
        }
        let Some(path) = &self.file else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => {
                log::info!("Removed stored token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialError::RemoveFile {
                path: path.clone(),
                source: e,
            }),
        }
    }
}

/// In-process token holder for embedding and tests.
#[derive(Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentials {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: RwLock::new(token.and_then(non_empty)),
        }
    }

    pub fn set(&self, token: &str) {
        let mut guard = match self.token.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Credential lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        *guard = non_empty(token);
    }
}

impl CredentialAccessor for MemoryCredentials {
    fn bearer_token(&self) -> Option<SecretString> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                log::warn!("Credential lock was poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut guard = match self.token.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
        Ok(())
    }
}
