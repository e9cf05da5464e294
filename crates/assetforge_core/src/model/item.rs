//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical hardware asset record returned to callers.
//! - Define explicit create and partial-update payloads.
//! - Normalize MAC addresses and optional free text.
//!
//! # Invariants
//! - `asset_tag` has the shape `<PREFIX>-<TYPE_CODE>-<serial:04>`.
//! - `mac_address` is stored uppercase without separators.
//! - In `ItemPatch`, `None` means "leave untouched"; for nullable fields
//!   `Some(None)` means "clear".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static MAC_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s:\-.]+").expect("valid mac separator regex"));

/// Store-assigned item identifier.
pub type ItemId = i64;
/// Hardware type identifier.
pub type TypeId = i64;
/// Identifier of a location, user, group or sub-type row.
pub type CatalogId = i64;

/// Business fields listed as changed by a `create` audit entry.
pub const CREATE_AUDIT_FIELDS: &[&str] = &[
    "name",
    "model",
    "type_id",
    "mac_address",
    "ip_address",
    "location_id",
    "user_id",
    "group_id",
    "sub_type_id",
    "notes",
    "extension",
];

/// Hardware asset record with catalog display names joined in.
///
/// Serialized field names are the stable contract shared with presentation
/// and export callers, and the shape of audit snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Position of this item in its type's allocation sequence, from 1.
    pub type_serial: i64,
    pub name: String,
    pub model: Option<String>,
    pub type_id: TypeId,
    pub type_name: Option<String>,
    pub type_code: Option<String>,
    pub mac_address: Option<String>,
    /// Released back to the known-IP pool on archive.
    pub ip_address: Option<String>,
    pub location_id: Option<CatalogId>,
    pub location_name: Option<String>,
    pub user_id: Option<CatalogId>,
    pub user_name: Option<String>,
    pub group_id: Option<CatalogId>,
    pub group_name: Option<String>,
    pub sub_type_id: Option<CatalogId>,
    pub sub_type_name: Option<String>,
    pub notes: Option<String>,
    /// Meaningful only for the landline phone type.
    pub extension: Option<String>,
    pub asset_tag: String,
    pub created_at_utc: String,
    pub updated_at_utc: String,
    pub archived: bool,
}

impl Item {
    /// Returns the stored fields whose values differ between `self` and
    /// `after`, in a fixed order.
    ///
    /// Joined display names and timestamps are not tracked.
    pub fn changed_fields(&self, after: &Item) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.name != after.name {
            changed.push("name");
        }
        if self.model != after.model {
            changed.push("model");
        }
        if self.type_id != after.type_id {
            changed.push("type_id");
        }
        if self.type_serial != after.type_serial {
            changed.push("type_serial");
        }
        if self.asset_tag != after.asset_tag {
            changed.push("asset_tag");
        }
        if self.mac_address != after.mac_address {
            changed.push("mac_address");
        }
        if self.ip_address != after.ip_address {
            changed.push("ip_address");
        }
        if self.location_id != after.location_id {
            changed.push("location_id");
        }
        if self.user_id != after.user_id {
            changed.push("user_id");
        }
        if self.group_id != after.group_id {
            changed.push("group_id");
        }
        if self.sub_type_id != after.sub_type_id {
            changed.push("sub_type_id");
        }
        if self.notes != after.notes {
            changed.push("notes");
        }
        if self.extension != after.extension {
            changed.push("extension");
        }
        if self.archived != after.archived {
            changed.push("archived");
        }
        changed
    }

    /// Returns whether the item is live (not archived).
    pub fn is_active(&self) -> bool {
        !self.archived
    }
}

/// Payload for creating one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    /// Required; `None` is rejected with `ItemValidationError::MissingType`.
    pub type_id: Option<TypeId>,
    pub model: Option<String>,
    /// Any common notation; normalized before storage.
    pub mac_address: Option<String>,
    /// Must already be registered in the known-IP catalog.
    pub ip_address: Option<String>,
    pub location_id: Option<CatalogId>,
    pub user_id: Option<CatalogId>,
    pub group_id: Option<CatalogId>,
    pub sub_type_id: Option<CatalogId>,
    pub notes: Option<String>,
    /// Dropped unless `type_id` is the landline phone type.
    pub extension: Option<String>,
    /// Recorded on the `create` audit entry; not stored on the item.
    pub audit_note: Option<String>,
}

impl NewItem {
    /// Creates a payload with the two required fields set.
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id: Some(type_id),
            ..Self::default()
        }
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::MissingName);
        }
        if self.type_id.is_none() {
            return Err(ItemValidationError::MissingType);
        }
        Ok(())
    }
}

/// Partial update for one item.
///
/// Required fields use `Option<T>`; nullable fields use `Option<Option<T>>`
/// so that omission and explicit clearing stay distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub type_id: Option<TypeId>,
    pub model: Option<Option<String>>,
    pub mac_address: Option<Option<String>>,
    pub ip_address: Option<Option<String>>,
    pub location_id: Option<Option<CatalogId>>,
    pub user_id: Option<Option<CatalogId>>,
    pub group_id: Option<Option<CatalogId>>,
    pub sub_type_id: Option<Option<CatalogId>>,
    pub notes: Option<Option<String>>,
    pub extension: Option<Option<String>>,
}

impl ItemPatch {
    /// Returns whether no slot is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Checks that set required fields are not blank.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ItemValidationError::MissingName);
            }
        }
        Ok(())
    }
}

/// Validation failures for item payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// `name` is empty or whitespace.
    MissingName,
    /// `type_id` was not supplied.
    MissingType,
    /// An audit note was empty or whitespace.
    MissingNote,
    /// A catalog name, code or address was empty or whitespace.
    MissingCatalogField(&'static str),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "item name is required"),
            Self::MissingType => write!(f, "item type is required"),
            Self::MissingNote => write!(f, "audit note text is required"),
            Self::MissingCatalogField(field) => write!(f, "{field} is required"),
        }
    }
}

impl Error for ItemValidationError {}

/// Normalizes a MAC address: separators and whitespace removed, uppercase.
///
/// Returns `None` when nothing remains.
pub fn normalize_mac(value: &str) -> Option<String> {
    let stripped = MAC_SEPARATOR_RE.replace_all(value, "");
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_ascii_uppercase())
    }
}

/// Trims optional free text; blank input becomes `None`.
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

/// Formats an asset tag from prefix, type code and serial.
pub fn format_asset_tag(prefix: &str, type_code: &str, serial: i64) -> String {
    format!("{prefix}-{type_code}-{serial:04}")
}

#[cfg(test)]
mod tests {
    use super::{format_asset_tag, normalize_mac, normalize_text, ItemPatch, NewItem};
    use super::ItemValidationError;

    #[test]
    fn normalize_mac_strips_separators_and_uppercases() {
        assert_eq!(
            normalize_mac("aa:bb:cc:dd:ee:ff").as_deref(),
            Some("AABBCCDDEEFF")
        );
        assert_eq!(
            normalize_mac("aa-bb-cc-dd-ee-0f").as_deref(),
            Some("AABBCCDDEE0F")
        );
        assert_eq!(normalize_mac("aabb.ccdd.eeff").as_deref(), Some("AABBCCDDEEFF"));
        assert_eq!(normalize_mac(" : - "), None);
    }

    #[test]
    fn format_asset_tag_zero_pads_to_four_digits() {
        assert_eq!(format_asset_tag("SDMM", "PC", 1), "SDMM-PC-0001");
        assert_eq!(format_asset_tag("SDMM", "LT", 42), "SDMM-LT-0042");
        assert_eq!(format_asset_tag("SDMM", "SW", 12345), "SDMM-SW-12345");
    }

    #[test]
    fn normalize_text_drops_blank_values() {
        assert_eq!(normalize_text(Some("  rack 4 ")).as_deref(), Some("rack 4"));
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn new_item_requires_name_and_type() {
        assert_eq!(NewItem::new("Laptop", 1).validate(), Ok(()));
        assert_eq!(
            NewItem::new("  ", 1).validate(),
            Err(ItemValidationError::MissingName)
        );
        let untyped = NewItem {
            name: "Laptop".to_string(),
            ..NewItem::default()
        };
        assert_eq!(untyped.validate(), Err(ItemValidationError::MissingType));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ItemPatch::default().is_empty());
        let clear_user = ItemPatch {
            user_id: Some(None),
            ..ItemPatch::default()
        };
        assert!(!clear_user.is_empty());
    }
}
