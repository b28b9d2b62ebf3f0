use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{Fingerprint, GFunctionData};

/// File-backed store for the g-functions of one borefield.
///
/// The cache is advisory: a missing, unreadable, malformed, or mismatched
/// file makes [`ResponseCache::load`] return `None`, and a failed write is
/// logged and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCache {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    fingerprint: Fingerprint,
    g_functions: GFunctionData,
}

#[derive(Debug, Error)]
enum CacheError {
    #[error("failed to access cache file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed cache document: {0}")]
    Format(#[from] serde_json::Error),
}

impl ResponseCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached g-functions if they were stored under `fingerprint`.
    #[must_use]
    pub fn load(&self, fingerprint: &Fingerprint) -> Option<GFunctionData> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no g-function cache file");
            return None;
        }

        let document = match self.read() {
            Ok(document) => document,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "ignoring unreadable g-function cache");
                return None;
            }
        };

        if document.fingerprint != *fingerprint {
            warn!(
                path = %self.path.display(),
                cached = %document.fingerprint,
                current = %fingerprint,
                "g-function cache is stale, recomputing",
            );
            return None;
        }

        if let Err(error) = document.g_functions.table.validate() {
            warn!(path = %self.path.display(), %error, "ignoring invalid cached g-function table");
            return None;
        }

        debug!(path = %self.path.display(), "g-function cache hit");
        Some(document.g_functions)
    }

    /// Writes `data` under `fingerprint`, replacing any previous contents.
    pub fn store(&self, fingerprint: &Fingerprint, data: &GFunctionData) {
        let document = CacheDocument {
            fingerprint: fingerprint.clone(),
            g_functions: data.clone(),
        };
        match self.write(&document) {
            Ok(()) => debug!(path = %self.path.display(), "wrote g-function cache"),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to write g-function cache");
            }
        }
    }

    fn read(&self) -> Result<CacheDocument, CacheError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, document: &CacheDocument) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
