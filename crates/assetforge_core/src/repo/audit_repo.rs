//! Append-only audit log persistence.
//!
//! # Responsibility
//! - Append one entry per observable mutation, with JSON snapshots.
//! - Read an item's history newest first, or its full trail oldest first.
//!
//! # Invariants
//! - Entries are never updated; they are only removed by the purge delete
//!   policy.
//! - Newest-first ordering is `created_at_utc DESC, id DESC`, so entries
//!   written in the same millisecond keep a stable order.

use super::{RepoError, RepoResult};
use crate::model::audit::{AuditEntry, AuditEntryId, AuditReason};
use crate::model::item::{Item, ItemId};
use rusqlite::{params, Connection, Row};

/// Borrowed input for one audit append.
#[derive(Debug, Clone, Copy)]
pub struct AuditRecord<'a> {
    pub item_id: ItemId,
    pub asset_tag: Option<&'a str>,
    pub reason: AuditReason,
    pub note: Option<&'a str>,
    pub changed_fields: &'a [&'a str],
    pub before: Option<&'a Item>,
    pub after: Option<&'a Item>,
}

/// Repository interface for audit entries.
pub trait AuditRepository {
    /// Appends one entry for a live item and returns its id.
    fn record(&self, record: &AuditRecord<'_>) -> RepoResult<AuditEntryId>;
    /// Returns up to `limit` entries for `item_id`, newest first.
    fn list_for_item(&self, item_id: ItemId, limit: u32) -> RepoResult<Vec<AuditEntry>>;
}

/// SQLite-backed audit log.
pub struct SqliteAuditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        super::ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AuditRepository for SqliteAuditRepository<'_> {
    fn record(&self, record: &AuditRecord<'_>) -> RepoResult<AuditEntryId> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1);",
            [record.item_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::NotFound(record.item_id));
        }
        insert_entry(self.conn, record)
    }

    fn list_for_item(&self, item_id: ItemId, limit: u32) -> RepoResult<Vec<AuditEntry>> {
        list_entries(self.conn, item_id, limit)
    }
}

/// Appends an entry without checking the item; callers hold the transaction.
pub(crate) fn insert_entry(conn: &Connection, record: &AuditRecord<'_>) -> RepoResult<AuditEntryId> {
    let changed_fields = serde_json::to_string(record.changed_fields)?;
    let before = record.before.map(serde_json::to_string).transpose()?;
    let after = record.after.map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO item_audit (
            item_id,
            asset_tag,
            reason,
            note,
            changed_fields,
            snapshot_before_json,
            snapshot_after_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            record.item_id,
            record.asset_tag,
            record.reason.as_str(),
            record.note,
            changed_fields,
            before,
            after,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn list_entries(
    conn: &Connection,
    item_id: ItemId,
    limit: u32,
) -> RepoResult<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            item_id,
            asset_tag,
            reason,
            note,
            changed_fields,
            snapshot_before_json,
            snapshot_after_json,
            created_at_utc
         FROM item_audit
         WHERE item_id = ?1
         ORDER BY created_at_utc DESC, id DESC
         LIMIT ?2;",
    )?;
    let mut rows = stmt.query(params![item_id, i64::from(limit)])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }
    Ok(entries)
}

/// Every entry for `item_id`, oldest first.
pub(crate) fn load_trail(conn: &Connection, item_id: ItemId) -> RepoResult<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            item_id,
            asset_tag,
            reason,
            note,
            changed_fields,
            snapshot_before_json,
            snapshot_after_json,
            created_at_utc
         FROM item_audit
         WHERE item_id = ?1
         ORDER BY created_at_utc ASC, id ASC;",
    )?;
    let mut rows = stmt.query([item_id])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }
    Ok(entries)
}

pub(crate) fn purge_entries(conn: &Connection, item_id: ItemId) -> RepoResult<usize> {
    Ok(conn.execute("DELETE FROM item_audit WHERE item_id = ?1;", [item_id])?)
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<AuditEntry> {
    let reason_raw: String = row.get("reason")?;
    let reason = AuditReason::parse(&reason_raw)
        .ok_or_else(|| RepoError::InvalidData(format!("unknown audit reason `{reason_raw}`")))?;
    let changed_raw: Option<String> = row.get("changed_fields")?;

    Ok(AuditEntry {
        id: row.get("id")?,
        item_id: row.get("item_id")?,
        asset_tag: row.get("asset_tag")?,
        reason,
        note: row.get("note")?,
        changed_fields: parse_changed_fields(changed_raw.as_deref())?,
        snapshot_before_json: row.get("snapshot_before_json")?,
        snapshot_after_json: row.get("snapshot_after_json")?,
        created_at_utc: row.get("created_at_utc")?,
    })
}

/// Accepts the JSON array form and the older comma-separated form.
fn parse_changed_fields(raw: Option<&str>) -> RepoResult<Vec<String>> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(Vec::new());
    };
    if raw.starts_with('[') {
        return Ok(serde_json::from_str::<Vec<String>>(raw)?);
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::parse_changed_fields;

    #[test]
    fn changed_fields_accept_json_and_comma_forms() {
        assert_eq!(
            parse_changed_fields(Some(r#"["name","location_id"]"#)).unwrap(),
            vec!["name".to_string(), "location_id".to_string()]
        );
        assert_eq!(
            parse_changed_fields(Some("name, notes")).unwrap(),
            vec!["name".to_string(), "notes".to_string()]
        );
        assert!(parse_changed_fields(Some("[]")).unwrap().is_empty());
        assert!(parse_changed_fields(None).unwrap().is_empty());
    }
}
