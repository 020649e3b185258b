use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const CHECKPOINT_FILE: &str = "last_processed_row.txt";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint io error at {path}: {source}")]
    Io { source: io::Error, path: PathBuf },
}

pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;

/// Persists the 0-based index of the last fully processed CSV row in a
/// plain text file: either empty (no progress / fully complete) or the
/// decimal index. Unparseable content counts as no progress.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(CHECKPOINT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> CheckpointResult<Option<u64>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents.trim().parse::<u64>().ok()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Records `index` as the last fully processed row. The file is
    /// replaced through a sibling temp file and rename so a crash mid-write
    /// never leaves a torn value.
    pub fn advance(&self, index: u64) -> CheckpointResult<()> {
        self.replace_contents(index.to_string().as_bytes())
    }

    /// Truncates the file to empty, signalling the input was fully
    /// consumed. Returns whether there was recorded progress to clear; a
    /// missing or already-empty file is left as is.
    pub fn clear(&self) -> CheckpointResult<bool> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.is_empty() => Ok(false),
            Ok(_) => {
                self.replace_contents(b"")?;
                Ok(true)
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn replace_contents(&self, contents: &[u8]) -> CheckpointResult<()> {
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, contents).map_err(|source| CheckpointError::Io {
            source,
            path: staging.clone(),
        })?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> CheckpointError {
        CheckpointError::Io {
            source,
            path: self.path.clone(),
        }
    }
}
