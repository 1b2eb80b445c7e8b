//! JSON persistence for the sudo list.
//!
//! The file is a single JSON array of user ids. It is read in full at startup
//! and rewritten in full after every change; the write goes to a sibling temp
//! file first and is renamed into place, so a crash mid-write leaves the old
//! list intact.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// fs-err already puts the path into the message
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{} is not a JSON list of user ids: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode sudo list: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Location of the persisted sudo list
#[derive(Debug, Clone)]
pub struct SudoFile {
    path: PathBuf,
}

impl SudoFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole list. A missing file is an empty list.
    pub fn load(&self) -> Result<HashSet<i64>, StorageError> {
        let raw = match fs_err::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        let ids: Vec<i64> = serde_json::from_str(&raw).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(ids.into_iter().collect())
    }

    /// Rewrites the whole list. Ids are sorted so the file diffs cleanly.
    pub fn save(&self, ids: &HashSet<i64>) -> Result<(), StorageError> {
        let mut sorted: Vec<i64> = ids.iter().copied().collect();
        sorted.sort_unstable();
        let encoded = serde_json::to_string(&sorted).map_err(StorageError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        fs_err::write(&tmp_path, encoded)?;
        fs_err::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
