//! Audit log entry model.
//!
//! # Invariants
//! - Entries are append-only; nothing in core updates an entry in place.
//! - Snapshots are the JSON form of `Item` at the time of the mutation.

use crate::model::item::{Item, ItemId};
use serde::{Deserialize, Serialize};

pub type AuditEntryId = i64;

/// Why an audit entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditReason {
    Create,
    Update,
    Delete,
    Assign,
    Move,
    Archive,
    /// Free-standing annotation with no field change.
    Audit,
}

impl AuditReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Assign => "assign",
            Self::Move => "move",
            Self::Archive => "archive",
            Self::Audit => "audit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "assign" => Some(Self::Assign),
            "move" => Some(Self::Move),
            "archive" => Some(Self::Archive),
            "audit" => Some(Self::Audit),
            _ => None,
        }
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub item_id: ItemId,
    /// Asset tag of the item when the entry was written.
    pub asset_tag: Option<String>,
    pub reason: AuditReason,
    pub note: Option<String>,
    /// Empty for note-only entries.
    pub changed_fields: Vec<String>,
    pub snapshot_before_json: Option<String>,
    pub snapshot_after_json: Option<String>,
    pub created_at_utc: String,
}

impl AuditEntry {
    /// Decodes the before-snapshot, if any.
    pub fn before(&self) -> Result<Option<Item>, serde_json::Error> {
        decode_snapshot(self.snapshot_before_json.as_deref())
    }

    /// Decodes the after-snapshot, if any.
    pub fn after(&self) -> Result<Option<Item>, serde_json::Error> {
        decode_snapshot(self.snapshot_after_json.as_deref())
    }

    pub fn lists_field(&self, field: &str) -> bool {
        self.changed_fields.iter().any(|changed| changed == field)
    }
}

fn decode_snapshot(json: Option<&str>) -> Result<Option<Item>, serde_json::Error> {
    json.map(serde_json::from_str::<Item>).transpose()
}

#[cfg(test)]
mod tests {
    use super::AuditReason;

    #[test]
    fn reason_codes_parse_back() {
        for reason in [
            AuditReason::Create,
            AuditReason::Update,
            AuditReason::Delete,
            AuditReason::Assign,
            AuditReason::Move,
            AuditReason::Archive,
            AuditReason::Audit,
        ] {
            assert_eq!(AuditReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(AuditReason::parse("attribute_add"), None);
    }
}
