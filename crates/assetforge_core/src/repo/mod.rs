//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Enforce item invariants (identity, uniqueness, audit) at the write path.
//!
//! # Invariants
//! - Repositories refuse connections whose schema is not fully migrated.
//! - Every multi-statement mutation runs in one immediate transaction.
//! - Repository APIs return semantic errors (`NotFound`, conflicts) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::item::{CatalogId, ItemId, ItemValidationError, TypeId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod archive_repo;
pub mod audit_repo;
pub mod catalog_repo;
pub mod item_repo;
mod schema_guard;
pub mod tag_allocator;

pub use schema_guard::ensure_store_ready;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error surfaced by every repository in this crate.
#[derive(Debug)]
pub enum RepoError {
    /// Missing or blank required field.
    Validation(ItemValidationError),
    Db(DbError),
    /// No item with this id.
    NotFound(ItemId),
    /// The IP is held by another live item.
    DuplicateIp { ip: String, holder_tag: String },
    /// The IP is not registered in the known-IP catalog.
    UnknownIp(String),
    UnknownType(TypeId),
    /// The MAC is held by another live item.
    DuplicateMac { mac: String, holder_tag: String },
    /// A location/user/group/sub-type id does not exist.
    UnknownReference {
        catalog: &'static str,
        id: CatalogId,
    },
    /// A catalog row with this name (or code) already exists.
    DuplicateName { catalog: &'static str, name: String },
    /// Archived items cannot take an IP address.
    ArchivedItem(ItemId),
    /// The connection is missing an embedded migration.
    UninitializedConnection { missing_migration: String },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
    /// Audit snapshot could not be encoded or decoded.
    Snapshot(serde_json::Error),
}

impl RepoError {
    /// Returns whether the caller can fix the input and retry.
    ///
    /// Integrity and transport failures are not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::DuplicateIp { .. }
                | Self::UnknownIp(_)
                | Self::UnknownType(_)
                | Self::DuplicateMac { .. }
                | Self::UnknownReference { .. }
                | Self::DuplicateName { .. }
                | Self::ArchivedItem(_)
        )
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Db(_) => "db",
            Self::NotFound(_) => "not_found",
            Self::DuplicateIp { .. } => "duplicate_ip",
            Self::UnknownIp(_) => "unknown_ip",
            Self::UnknownType(_) => "unknown_type",
            Self::DuplicateMac { .. } => "duplicate_mac",
            Self::UnknownReference { .. } => "unknown_reference",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::ArchivedItem(_) => "archived_item",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
            Self::InvalidData(_) => "invalid_data",
            Self::Snapshot(_) => "snapshot",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::DuplicateIp { ip, holder_tag } => {
                write!(f, "IP address {ip} is already assigned to {holder_tag}")
            }
            Self::UnknownIp(ip) => write!(f, "IP address {ip} is not in the known-IP catalog"),
            Self::UnknownType(id) => write!(f, "hardware type not found: {id}"),
            Self::DuplicateMac { mac, holder_tag } => {
                write!(f, "MAC address {mac} is already assigned to {holder_tag}")
            }
            Self::UnknownReference { catalog, id } => write!(f, "{catalog} id {id} not found"),
            Self::DuplicateName { catalog, name } => {
                write!(f, "{catalog} entry `{name}` already exists")
            }
            Self::ArchivedItem(id) => {
                write!(f, "item {id} is archived and cannot hold an IP address")
            }
            Self::UninitializedConnection { missing_migration } => write!(
                f,
                "item store requires migration `{missing_migration}` to be applied"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "item store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "item store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::Snapshot(err) => write!(f, "audit snapshot encoding failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Snapshot(value)
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
