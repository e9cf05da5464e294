//! Archived (deleted) item model.
//!
//! # Invariants
//! - One row per asset tag; re-archiving a reused tag merges into it.
//! - `history` accumulates every audit trail archived under the tag.

use crate::model::audit::AuditEntry;
use crate::model::item::{CatalogId, Item, ItemId, TypeId};
use serde::{Deserialize, Serialize};

/// Last known state of a deleted item, keyed by asset tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedItem {
    pub asset_tag: String,
    /// Id of the most recent live row archived under this tag.
    pub item_id: ItemId,
    pub type_serial: i64,
    pub name: String,
    pub model: Option<String>,
    pub type_id: Option<TypeId>,
    pub type_code: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub location_id: Option<CatalogId>,
    pub user_id: Option<CatalogId>,
    pub group_id: Option<CatalogId>,
    pub sub_type_id: Option<CatalogId>,
    pub notes: Option<String>,
    pub extension: Option<String>,
    pub created_at_utc: String,
    pub updated_at_utc: String,
    pub archived: bool,
    pub archived_at_utc: String,
    /// Full `Item` snapshot taken at deletion.
    pub snapshot: Item,
    /// Audit entries archived under this tag, oldest first.
    pub history: Vec<AuditEntry>,
}
