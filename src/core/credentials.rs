//! Access-token storage for the backend session.
//!
//! The file store keeps `credentials.json` in the config directory with restrictive
//! permissions (0o600 on Unix), written through a temp file and a rename.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use serde::{Deserialize, Serialize};

use crate::core::paths;

/// Errors when loading or storing credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("No config directory available")]
    NoConfigDir,
    #[error("Failed to store credentials: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid credentials file: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tokens {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Where the bearer token for backend calls lives.
pub trait CredentialStore: Send + Sync {
    /// The stored access token, if any.
    fn access_token(&self) -> Option<String>;
    fn save_token(&self, access: &str, refresh: Option<&str>) -> Result<(), CredentialError>;
    /// Forget the stored tokens. Removing absent tokens is not an error.
    fn remove_token(&self) -> Result<(), CredentialError>;
}

fn tokens(access: &str, refresh: Option<&str>) -> Tokens {
    Tokens {
        access_token: access.trim().to_string(),
        refresh_token: refresh
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: Mutex<Option<Tokens>>,
}

impl MemoryCredentialStore {
    pub fn with_token(access: &str) -> Self {
        MemoryCredentialStore {
            tokens: Mutex::new(Some(tokens(access, None))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        let guard = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|t| t.access_token.clone())
    }

    fn save_token(&self, access: &str, refresh: Option<&str>) -> Result<(), CredentialError> {
        let mut guard = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(tokens(access, refresh));
        Ok(())
    }

    fn remove_token(&self) -> Result<(), CredentialError> {
        let mut guard = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentialStore { path: path.into() }
    }

    /// Store at `credentials.json` in the config directory.
    pub fn default_location() -> Result<Self, CredentialError> {
        let dir = paths::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(dir.join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Tokens>, CredentialError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let tokens: Tokens = serde_json::from_str(&data)?;
        if tokens.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(tokens))
    }
}

impl CredentialStore for FileCredentialStore {
    /// Returns `None` if the file is absent, empty, or unreadable.
    fn access_token(&self) -> Option<String> {
        match self.load() {
            Ok(tokens) => tokens.map(|t| t.access_token),
            Err(e) => {
                log::warn!("ignoring credentials at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save_token(&self, access: &str, refresh: Option<&str>) -> Result<(), CredentialError> {
        let dir = self.path.parent().ok_or_else(|| {
            CredentialError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Invalid credentials path",
            ))
        })?;
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(&tokens(access, refresh))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        #[cfg(unix)]
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        fs::rename(tmp, &self.path)?;
        log::info!("credentials saved to {}", self.path.display());
        Ok(())
    }

    fn remove_token(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
