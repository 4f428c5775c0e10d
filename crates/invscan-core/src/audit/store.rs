//! Storage backends for the audit log.
//!
//! A store holds the whole log as one document, oldest entry first. It does
//! no locking of its own across processes. An unparseable log file is moved
//! aside to `*.json.corrupt` and treated as empty.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::AuditError;

use super::entry::AuditLogEntry;

/// Whole-document storage for audit entries.
pub trait AuditStore: Send + Sync {
    /// All stored entries, oldest first. An empty store yields an empty list.
    fn load(&self) -> Result<Vec<AuditLogEntry>, AuditError>;

    /// Replace the stored entries.
    fn save(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for MemoryAuditStore {
    fn load(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        Ok(self.entries.lock().clone())
    }

    fn save(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError> {
        *self.entries.lock() = entries.to_vec();
        Ok(())
    }
}

/// JSON array in a single file, rewritten on every save.
#[derive(Debug, Clone)]
pub struct JsonFileAuditStore {
    path: PathBuf,
}

impl JsonFileAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditStore for JsonFileAuditStore {
    fn load(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Quarantine the unreadable log so later writes start a fresh array.
                let quarantine = self.path.with_extension("json.corrupt");
                fs::rename(&self.path, &quarantine)?;
                warn!(
                    "Audit log {} is unreadable ({}); moved to {}",
                    self.path.display(),
                    e,
                    quarantine.display()
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so readers never see a partial array.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(entries)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} audit entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{Actor, AuditAction, AuditTargetType};
    use pretty_assertions::assert_eq;

    fn entry(id: &str) -> AuditLogEntry {
        AuditLogEntry::new(
            AuditAction::Create,
            AuditTargetType::Invoice,
            id,
            &Actor::new("u1", "Yamada"),
            None,
            None,
        )
    }

    #[test]
    fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAuditStore::new(dir.path().join("logs").join("audit.json"));

        assert!(store.load().unwrap().is_empty());

        let entries = vec![entry("a"), entry("b")];
        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[0]["targetId"], "a");
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileAuditStore::new(&path);
        assert!(store.load().unwrap().is_empty());

        let quarantined = dir.path().join("audit.json.corrupt");
        assert_eq!(fs::read_to_string(&quarantined).unwrap(), "{not json");
        assert!(!path.exists());

        store.save(&[entry("a")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryAuditStore::new();
        store.save(&[entry("a")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
