//! Audit log entries.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::diff::changed_fields;

/// Kind of entity an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditTargetType {
    Invoice,
    Client,
    Payment,
    Settings,
}

impl AuditTargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Client => "client",
            Self::Payment => "payment",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for AuditTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AuditTargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "invoice" => Ok(Self::Invoice),
            "client" => Ok(Self::Client),
            "payment" => Ok(Self::Payment),
            "settings" => Ok(Self::Settings),
            other => Err(format!(
                "unknown target type '{}' (expected invoice, client, payment or settings)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!(
                "unknown action '{}' (expected create, update or delete)",
                other
            )),
        }
    }
}

/// The user performing a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One recorded mutation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    id: Uuid,
    target_id: String,
    target_type: AuditTargetType,
    action: AuditAction,
    user_id: String,
    user_name: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changed_fields: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remarks: Option<String>,
}

impl AuditLogEntry {
    /// Build an entry stamped now. Updates get their changed field names computed.
    pub fn new(
        action: AuditAction,
        target_type: AuditTargetType,
        target_id: impl Into<String>,
        actor: &Actor,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        let changed_fields = (action == AuditAction::Update)
            .then(|| changed_fields(old_value.as_ref(), new_value.as_ref()));

        Self {
            id: Uuid::new_v4(),
            target_id: target_id.into(),
            target_type,
            action,
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            timestamp: Utc::now(),
            old_value,
            new_value,
            changed_fields,
            remarks: None,
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn target_type(&self) -> AuditTargetType {
        self.target_type
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn old_value(&self) -> Option<&Value> {
        self.old_value.as_ref()
    }

    pub fn new_value(&self) -> Option<&Value> {
        self.new_value.as_ref()
    }

    pub fn changed_fields(&self) -> Option<&BTreeSet<String>> {
        self.changed_fields.as_ref()
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }
}
