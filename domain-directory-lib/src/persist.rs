//! The persistence collaborator: JSON store file load/save.
//!
//! The format is a pretty-printed JSON array of records. A missing file
//! loads as an empty directory (first run); unreadable or unparseable
//! files are fatal, because the tool cannot safely proceed without a
//! trustworthy store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DirectoryError;
use crate::types::DomainRecord;

/// Default store file name, resolved relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = "domains.json";

/// Handle to the JSON store file.
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    /// Create a handle for the given path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Handle for the default store location.
    pub fn default_location() -> Self {
        Self::new(DEFAULT_STORE_FILE)
    }

    /// The path this handle reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full record sequence.
    ///
    /// A missing file yields an empty sequence; any other failure is a
    /// hard error.
    pub fn load(&self) -> Result<Vec<DomainRecord>, DirectoryError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file missing, starting empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            DirectoryError::file_error(
                self.path.to_string_lossy(),
                format!("Failed to read store file: {}", e),
            )
        })?;

        let records: Vec<DomainRecord> = serde_json::from_str(&content).map_err(|e| {
            DirectoryError::file_error(
                self.path.to_string_lossy(),
                format!("Store file is not valid JSON: {}", e),
            )
        })?;

        debug!(path = %self.path.display(), records = records.len(), "loaded store file");
        Ok(records)
    }

    /// Save the full record sequence, replacing the file atomically.
    ///
    /// The JSON is written to a sibling temp file first and renamed into
    /// place, so a crash mid-write cannot truncate the store.
    pub fn save(&self, records: &[DomainRecord]) -> Result<(), DirectoryError> {
        let json = serde_json::to_string_pretty(records)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json.as_bytes()).map_err(|e| {
            DirectoryError::file_error(
                tmp_path.to_string_lossy(),
                format!("Failed to write store file: {}", e),
            )
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            DirectoryError::file_error(
                self.path.to_string_lossy(),
                format!("Failed to replace store file: {}", e),
            )
        })?;

        debug!(path = %self.path.display(), records = records.len(), "saved store file");
        Ok(())
    }
}
