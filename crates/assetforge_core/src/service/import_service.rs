//! Row-by-row bulk import.
//!
//! # Responsibility
//! - Resolve human-entered catalog names into ids.
//! - Create one item per row, collecting rejected rows into a report.
//!
//! # Invariants
//! - Rows are independent: a rejected row never aborts the rows after it.
//! - Only transport or integrity failures stop an import early.
//! - Sub-types and IP addresses must already exist; locations, users and
//!   groups are created on first use.

use crate::model::item::{Item, NewItem};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Note written on the `create` audit entry of every imported item.
const IMPORT_AUDIT_NOTE: &str = "imported";

/// One import row as read from a spreadsheet or CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    pub name: String,
    /// Hardware type display name or tag code, matched case-insensitively.
    pub hardware_type: String,
    pub model: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub sub_type: Option<String>,
    pub notes: Option<String>,
    pub extension: Option<String>,
}

/// Why one row was skipped.
#[derive(Debug)]
pub enum ImportRowError {
    /// The hardware type column is empty.
    MissingType,
    /// No hardware type matches the given name or code.
    UnknownType(String),
    /// No sub-type with this name exists.
    UnknownSubType(String),
    /// The item store rejected the row.
    Rejected(RepoError),
}

impl Display for ImportRowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingType => write!(f, "hardware type is required"),
            Self::UnknownType(value) => write!(f, "unknown hardware type `{value}`"),
            Self::UnknownSubType(value) => write!(f, "unknown sub-type `{value}`"),
            Self::Rejected(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportRowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

/// A skipped row with its 1-based position in the input.
#[derive(Debug)]
pub struct SkippedRow {
    pub row: usize,
    pub error: ImportRowError,
}

impl SkippedRow {
    /// Report line for this row, e.g. `row 3: unknown hardware type `XX``.
    pub fn message(&self) -> String {
        format!("row {}: {}", self.row, self.error)
    }
}

/// Outcome of one import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: Vec<Item>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn messages(&self) -> Vec<String> {
        self.skipped.iter().map(SkippedRow::message).collect()
    }
}

/// Imports rows through the catalog and item repositories.
pub struct ImportService<C: CatalogRepository, R: ItemRepository> {
    catalogs: C,
    items: R,
}

impl<C: CatalogRepository, R: ItemRepository> ImportService<C, R> {
    pub fn new(catalogs: C, items: R) -> Self {
        Self { catalogs, items }
    }

    /// Creates one item per row.
    ///
    /// # Errors
    /// - Returns `Err` only for non-recoverable store failures; rows created
    ///   before that point stay committed.
    pub fn import_rows(&self, rows: &[ImportRow]) -> RepoResult<ImportReport> {
        let mut report = ImportReport::default();
        for (index, row) in rows.iter().enumerate() {
            match self.import_row(row) {
                Ok(item) => report.created.push(item),
                Err(ImportRowError::Rejected(err)) if !err.is_recoverable() => return Err(err),
                Err(error) => {
                    warn!(
                        "event=import_row module=service status=skipped row={} error_code={}",
                        index + 1,
                        row_error_code(&error)
                    );
                    report.skipped.push(SkippedRow {
                        row: index + 1,
                        error,
                    });
                }
            }
        }
        info!(
            "event=import module=service status=ok created={} skipped={}",
            report.created.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn import_row(&self, row: &ImportRow) -> Result<Item, ImportRowError> {
        let type_label = row.hardware_type.trim();
        if type_label.is_empty() {
            return Err(ImportRowError::MissingType);
        }
        let hardware_type = match self
            .catalogs
            .find_type_by_code(type_label)
            .map_err(ImportRowError::Rejected)?
        {
            Some(found) => found,
            None => self
                .catalogs
                .find_type_by_name(type_label)
                .map_err(ImportRowError::Rejected)?
                .ok_or_else(|| ImportRowError::UnknownType(type_label.to_string()))?,
        };

        let sub_type_id = match non_blank(row.sub_type.as_deref()) {
            Some(name) => Some(
                self.catalogs
                    .find_sub_type_by_name(name)
                    .map_err(ImportRowError::Rejected)?
                    .ok_or_else(|| ImportRowError::UnknownSubType(name.to_string()))?
                    .id,
            ),
            None => None,
        };
        let location_id = match non_blank(row.location.as_deref()) {
            Some(name) => Some(
                self.catalogs
                    .ensure_location(name)
                    .map_err(ImportRowError::Rejected)?
                    .id,
            ),
            None => None,
        };
        let user_id = match non_blank(row.user.as_deref()) {
            Some(name) => Some(
                self.catalogs
                    .ensure_user(name)
                    .map_err(ImportRowError::Rejected)?
                    .id,
            ),
            None => None,
        };
        let group_id = match non_blank(row.group.as_deref()) {
            Some(name) => Some(
                self.catalogs
                    .ensure_group(name)
                    .map_err(ImportRowError::Rejected)?
                    .id,
            ),
            None => None,
        };

        let new_item = NewItem {
            name: row.name.clone(),
            type_id: Some(hardware_type.id),
            model: row.model.clone(),
            mac_address: row.mac_address.clone(),
            ip_address: row.ip_address.clone(),
            location_id,
            user_id,
            group_id,
            sub_type_id,
            notes: row.notes.clone(),
            extension: row.extension.clone(),
            audit_note: Some(IMPORT_AUDIT_NOTE.to_string()),
        };
        self.items
            .create_item(&new_item)
            .map_err(ImportRowError::Rejected)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

fn row_error_code(error: &ImportRowError) -> &'static str {
    match error {
        ImportRowError::MissingType => "missing_type",
        ImportRowError::UnknownType(_) => "unknown_type",
        ImportRowError::UnknownSubType(_) => "unknown_sub_type",
        ImportRowError::Rejected(err) => err.code(),
    }
}
