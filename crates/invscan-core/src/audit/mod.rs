//! Audit trail of mutations against tracked entities.

mod diff;
mod entry;
mod log;
mod store;

pub use diff::changed_fields;
pub use entry::{Actor, AuditAction, AuditLogEntry, AuditTargetType};
pub use log::{AuditLog, AuditQuery, AUDIT_LOG_CAPACITY};
pub use store::{AuditStore, JsonFileAuditStore, MemoryAuditStore};
