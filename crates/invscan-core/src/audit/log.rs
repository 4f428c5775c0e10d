//! Bounded append-only audit log.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AuditError;

use super::entry::{Actor, AuditAction, AuditLogEntry, AuditTargetType};
use super::store::AuditStore;

/// Number of most recent entries kept; older ones are dropped on append.
pub const AUDIT_LOG_CAPACITY: usize = 1000;

/// Filter for [`AuditLog::query`]. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
    pub target_type: Option<AuditTargetType>,
    pub target_id: Option<String>,
    pub action: Option<AuditAction>,
    pub user_id: Option<String>,
    /// Inclusive lower bound on the entry timestamp.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the entry timestamp.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_type(mut self, target_type: AuditTargetType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.target_type.is_none_or(|t| entry.target_type() == t)
            && self.target_id.as_deref().is_none_or(|id| entry.target_id() == id)
            && self.action.is_none_or(|a| entry.action() == a)
            && self.user_id.as_deref().is_none_or(|u| entry.user_id() == u)
            && self.since.is_none_or(|t| entry.timestamp() >= t)
            && self.until.is_none_or(|t| entry.timestamp() <= t)
    }
}

/// Append-only history of mutations, capped at a fixed number of entries.
///
/// Appends within one process are serialized; separate processes sharing a
/// store can still lose each other's writes.
pub struct AuditLog<S: AuditStore> {
    store: S,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl<S: AuditStore> AuditLog<S> {
    pub fn new(store: S) -> Self {
        Self::with_capacity(store, AUDIT_LOG_CAPACITY)
    }

    pub fn with_capacity(store: S, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a mutation. Storage failures are logged and never propagated.
    pub fn record(
        &self,
        action: AuditAction,
        target_type: AuditTargetType,
        target_id: impl Into<String>,
        actor: &Actor,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> AuditLogEntry {
        let entry = AuditLogEntry::new(action, target_type, target_id, actor, old_value, new_value);
        self.record_entry(entry)
    }

    /// Record a prebuilt entry. Storage failures are logged and never propagated.
    pub fn record_entry(&self, entry: AuditLogEntry) -> AuditLogEntry {
        if let Err(e) = self.append(entry.clone()) {
            warn!(
                "Failed to write audit entry for {} {} ({}): {}",
                entry.target_type(),
                entry.target_id(),
                entry.action(),
                e
            );
        }
        entry
    }

    /// Append and trim to capacity in a single write.
    pub fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let _guard = self.write_lock.lock();

        let mut entries = self.store.load()?;
        entries.push(entry);
        if entries.len() > self.capacity {
            let evicted = entries.len() - self.capacity;
            entries.drain(..evicted);
            debug!("Evicted {} oldest audit entries", evicted);
        }
        self.store.save(&entries)
    }

    /// Entries matching `query`, newest first.
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self.store.load()?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| query.matches(e))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.store.load()
    }
}
