//! Persistence backends for the history log
//!
//! A backend holds one logical key: the serialized, ordered history log.
//! Writes replace the whole document at once so a reader never sees a
//! partially written log.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{IoResultExt, MilkTrendError, Result};
use crate::reading::StoredReading;

/// Storage for the serialized history log
pub trait HistoryBackend: Send + Sync {
    /// Load the persisted log. An empty log is returned when nothing has been
    /// persisted yet; unreadable or malformed state is an error.
    fn load(&self) -> Result<Vec<StoredReading>>;

    /// Replace the persisted log
    fn save(&self, readings: &[StoredReading]) -> Result<()>;

    /// Drop the persisted log
    fn clear(&self) -> Result<()>;
}

/// JSON document on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend writing to `path`, creating parent directories
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_path(parent)?;
            }
        }

        Ok(Self { path })
    }

    /// Location of the history document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<StoredReading>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).with_path(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            MilkTrendError::storage(format!("malformed history in {:?}: {}", self.path, e))
        })
    }

    fn save(&self, readings: &[StoredReading]) -> Result<()> {
        let content = serde_json::to_string(readings)?;

        // Write beside the target, then rename over it
        let staging = self.staging_path();
        fs::write(&staging, content).with_path(&staging)?;
        fs::rename(&staging, &self.path).with_path(&self.path)?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MilkTrendError::io(&self.path, e)),
        }
    }
}

/// In-memory backend holding the serialized document
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a raw document, e.g. to simulate corruption
    pub fn with_raw(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
        }
    }

    /// Current raw document, if any
    pub fn raw(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<StoredReading>> {
        match self.raw() {
            None => Ok(Vec::new()),
            Some(document) => serde_json::from_str(&document)
                .map_err(|e| MilkTrendError::storage(format!("malformed history: {}", e))),
        }
    }

    fn save(&self, readings: &[StoredReading]) -> Result<()> {
        let content = serde_json::to_string(readings)?;
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(content);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{Parameter, Reading};
    use tempfile::TempDir;

    fn sample() -> Vec<StoredReading> {
        let first = Reading::new()
            .with(Parameter::Ph, 6.61)
            .with(Parameter::Gas, 87.5);
        let second = Reading::new().with(Parameter::Temperature, 4.2);
        vec![
            StoredReading::stamp(first, 1_700_000_000_123),
            StoredReading::stamp(second, 1_700_000_060_456),
        ]
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested/history.json")).unwrap();

        assert!(backend.load().unwrap().is_empty());

        backend.save(&sample()).unwrap();
        assert_eq!(backend.load().unwrap(), sample());
        assert!(!backend.staging_path().exists());
    }

    #[test]
    fn test_json_file_corruption_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not a list").unwrap();

        let backend = JsonFileBackend::new(&path).unwrap();
        assert!(matches!(backend.load(), Err(MilkTrendError::Storage(_))));
    }

    #[test]
    fn test_json_file_clear() {
        let dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("history.json")).unwrap();

        backend.clear().unwrap();
        backend.save(&sample()).unwrap();
        backend.clear().unwrap();
        assert!(!backend.path().exists());
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_empty());

        backend.save(&sample()).unwrap();
        assert_eq!(backend.load().unwrap(), sample());

        backend.clear().unwrap();
        assert!(backend.raw().is_none());

        let corrupt = MemoryBackend::with_raw("[{\"timestamp\": \"soon\"}]");
        assert!(corrupt.load().is_err());
    }
}
