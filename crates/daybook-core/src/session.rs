//! Session context
//!
//! Holds the bearer credential for the current user. The context is loaded
//! explicitly at start-up, handed to the store, and cleared on logout.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{JournalError, Result};

/// Bearer token and the username it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub username: String,
}

/// Explicit session state passed into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    credential: Option<Credential>,
}

impl SessionContext {
    /// Session without a credential; the store runs local-only.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }

    /// Load the persisted session. A missing file is an anonymous session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No persisted session");
            return Ok(Self::anonymous());
        }

        let content = std::fs::read_to_string(path).map_err(|e| JournalError::io(path, e))?;
        let credential: Credential = serde_json::from_str(&content)?;
        if credential.token.is_empty() || credential.username.is_empty() {
            return Ok(Self::anonymous());
        }

        Ok(Self::authenticated(credential))
    }

    /// Write the credential to `path`. Anonymous sessions remove the file.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let Some(credential) = &self.credential else {
            return Self::clear(path);
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| JournalError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(credential)?;
        std::fs::write(path, content).map_err(|e| JournalError::io(path, e))?;
        info!(username = %credential.username, "Session saved");
        Ok(())
    }

    /// Tear down the persisted session. Idempotent.
    pub fn clear(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JournalError::io(path, e)),
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.username.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }
}
