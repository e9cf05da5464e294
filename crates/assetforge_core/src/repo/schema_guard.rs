//! Startup schema checks shared by all repositories.
//!
//! A connection that fails these checks is refused outright; the caller has
//! to run migrations first.

use super::{RepoError, RepoResult};
use crate::db::migrations::{applied_migration_names, embedded_migration_names};
use rusqlite::Connection;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("hardware_types", &["id", "name", "code"]),
    ("locations", &["id", "name", "parent_id"]),
    ("users", &["id", "name", "email"]),
    ("user_groups", &["id", "name"]),
    ("sub_types", &["id", "name", "type_id"]),
    ("ip_addresses", &["id", "address"]),
    ("type_counters", &["type_id", "next_serial"]),
    (
        "items",
        &[
            "id",
            "type_serial",
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
            "asset_tag",
            "created_at_utc",
            "updated_at_utc",
            "archived",
        ],
    ),
    (
        "item_audit",
        &[
            "id",
            "item_id",
            "asset_tag",
            "reason",
            "note",
            "changed_fields",
            "snapshot_before_json",
            "snapshot_after_json",
            "created_at_utc",
        ],
    ),
    (
        "item_archive",
        &["asset_tag", "item_id", "archived", "snapshot_json", "history_json"],
    ),
];

/// Verifies that every embedded migration ran and every table/column the
/// store touches exists.
pub fn ensure_store_ready(conn: &Connection) -> RepoResult<()> {
    let applied = applied_migration_names(conn)?;
    for name in embedded_migration_names() {
        if !applied.iter().any(|applied_name| applied_name == name) {
            return Err(RepoError::UninitializedConnection {
                missing_migration: name.to_string(),
            });
        }
    }

    for &(table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
