//! Session token storage.
//!
//! The token is owned by an explicit store created by the composition root
//! and initialized once at startup. The API client reads it on every request.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{debug, error, info};

use crate::{NotesError, Result};

/// Holds the bearer token of the signed-in user.
pub trait SessionStore: Send + Sync {
    /// Loads any persisted token. Called once before first use.
    fn initialize(&self) -> Result<()>;

    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn is_signed_in(&self) -> bool {
        self.get().is_some()
    }
}

/// Keeps the token in memory only; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn get(&self) -> Option<String> {
        match self.token.lock() {
            Ok(token) => token.clone(),
            Err(e) => {
                error!("Failed to acquire lock on session token: {}", e);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self.token.lock().map_err(|_| lock_failed())?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.token.lock().map_err(|_| lock_failed())?;
        *guard = None;
        Ok(())
    }
}

/// Persists the token in a single file, readable only by the owner on Unix.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    token: Mutex<Option<String>>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            token: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                debug!("Creating session directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, token)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn initialize(&self) -> Result<()> {
        let loaded = if self.path.exists() {
            let raw = fs::read_to_string(&self.path)?;
            let raw = raw.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        } else {
            None
        };

        info!(
            "Session store initialized from {} ({})",
            self.path.display(),
            if loaded.is_some() { "token present" } else { "no token" }
        );
        let mut guard = self.token.lock().map_err(|_| lock_failed())?;
        *guard = loaded;
        Ok(())
    }

    fn get(&self) -> Option<String> {
        match self.token.lock() {
            Ok(token) => token.clone(),
            Err(e) => {
                error!("Failed to acquire lock on session token: {}", e);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        self.write_token(token)?;
        let mut guard = self.token.lock().map_err(|_| lock_failed())?;
        *guard = Some(token.to_string());
        debug!("Session token stored at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        let mut guard = self.token.lock().map_err(|_| lock_failed())?;
        *guard = None;
        debug!("Session token cleared");
        Ok(())
    }
}

fn lock_failed() -> NotesError {
    NotesError::LockAcquisitionFailed {
        message: "Failed to acquire lock on session token".to_string(),
    }
}
