use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::Utc;
use thiserror::Error;

use crate::entry::Entry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger file {path} is not a valid entry list: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whole-ledger persistence. Implementations only read and replace the full
/// sequence; composition and locking live in [`crate::services::Ledger`].
pub trait LedgerBackend: Send + Sync {
    /// A backend with nothing stored returns an empty vector.
    fn read(&self) -> Result<Vec<Entry>, StoreError>;
    fn write(&self, entries: &[Entry]) -> Result<(), StoreError>;

    /// Move unreadable data out of the way. Returns where it went, if anywhere.
    fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        self.write(&[])?;
        Ok(None)
    }
}

/// Pretty-printed JSON array on disk.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerBackend for FileBackend {
    fn read(&self) -> Result<Vec<Entry>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, entries: &[Entry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let data = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.temp_path();
        let mut file = fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(&data)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(format!(".corrupt-{}", Utc::now().timestamp_millis()));
        let aside = self.path.with_file_name(name);
        fs::rename(&self.path, &aside).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(Some(aside))
    }
}

/// Keeps the ledger in memory. Used by tests and throwaway runs.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl LedgerBackend for MemoryBackend {
    fn read(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn write(&self, entries: &[Entry]) -> Result<(), StoreError> {
        *self.entries.lock().unwrap_or_else(|p| p.into_inner()) = entries.to_vec();
        Ok(())
    }
}
