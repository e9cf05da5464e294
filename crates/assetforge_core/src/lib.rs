//! Core item store for the AssetForge hardware inventory.
//! This crate is the single source of truth for item identity, uniqueness
//! and audit invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{DeleteHistoryPolicy, StoreConfig};
pub use db::{open_db, open_db_in_memory, verify_database, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::archive::ArchivedItem;
pub use model::audit::{AuditEntry, AuditEntryId, AuditReason};
pub use model::catalog::{Group, HardwareType, KnownIp, Location, SubType, User};
pub use model::item::{
    CatalogId, Item, ItemId, ItemPatch, ItemValidationError, NewItem, TypeId,
};
pub use repo::archive_repo::{ArchiveRepository, SqliteArchiveRepository};
pub use repo::audit_repo::{AuditRecord, AuditRepository, SqliteAuditRepository};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::item_repo::{
    ItemFilters, ItemListQuery, ItemOrder, ItemRepository, SortColumn, SortDirection,
    SqliteItemRepository,
};
pub use repo::{ensure_store_ready, RepoError, RepoResult};
pub use service::import_service::{ImportReport, ImportRow, ImportRowError, ImportService};
pub use service::item_service::ItemService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
