//! Tag-keyed archive of deleted items.
//!
//! # Invariants
//! - One row per asset tag. Archiving a tag again (a reused tag) merges into
//!   the existing row and appends to its history instead of duplicating it.
//! - `history_json` is a JSON array of audit entries, oldest first.

use super::{int_to_bool, RepoError, RepoResult};
use crate::model::archive::ArchivedItem;
use crate::model::audit::AuditEntry;
use crate::model::item::Item;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Read access to archived items.
pub trait ArchiveRepository {
    fn get_archived(&self, asset_tag: &str) -> RepoResult<Option<ArchivedItem>>;
    /// All archived items, most recently archived first.
    fn list_archived(&self) -> RepoResult<Vec<ArchivedItem>>;
}

/// SQLite-backed archive reader.
pub struct SqliteArchiveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArchiveRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        super::ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

const ARCHIVE_SELECT_SQL: &str = "SELECT
    asset_tag,
    item_id,
    type_serial,
    name,
    model,
    type_id,
    type_code,
    mac_address,
    ip_address,
    location_id,
    user_id,
    group_id,
    sub_type_id,
    notes,
    extension,
    created_at_utc,
    updated_at_utc,
    archived,
    archived_at_utc,
    snapshot_json,
    history_json
FROM item_archive";

impl ArchiveRepository for SqliteArchiveRepository<'_> {
    fn get_archived(&self, asset_tag: &str) -> RepoResult<Option<ArchivedItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARCHIVE_SELECT_SQL} WHERE asset_tag = ?1;"))?;
        let mut rows = stmt.query([asset_tag.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_archive_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_archived(&self) -> RepoResult<Vec<ArchivedItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARCHIVE_SELECT_SQL} ORDER BY archived_at_utc DESC, asset_tag ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut archived = Vec::new();
        while let Some(row) = rows.next()? {
            archived.push(parse_archive_row(row)?);
        }
        Ok(archived)
    }
}

/// Inserts `item` into the archive, or merges it into the row already
/// holding its asset tag. `trail` is appended to the stored history.
pub(crate) fn upsert_archive(
    conn: &Connection,
    item: &Item,
    trail: &[AuditEntry],
) -> RepoResult<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT history_json FROM item_archive WHERE asset_tag = ?1;",
            [item.asset_tag.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    let mut history = match existing.as_deref() {
        Some(raw) => serde_json::from_str::<Vec<AuditEntry>>(raw)?,
        None => Vec::new(),
    };
    for entry in trail {
        if !history.iter().any(|kept| kept.id == entry.id && kept.item_id == entry.item_id) {
            history.push(entry.clone());
        }
    }

    let snapshot_json = serde_json::to_string(item)?;
    let history_json = serde_json::to_string(&history)?;
    conn.execute(
        "INSERT INTO item_archive (
            asset_tag,
            item_id,
            type_serial,
            name,
            model,
            type_id,
            type_code,
            mac_address,
            ip_address,
            location_id,
            user_id,
            group_id,
            sub_type_id,
            notes,
            extension,
            created_at_utc,
            updated_at_utc,
            archived,
            archived_at_utc,
            snapshot_json,
            history_json
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
            1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), ?18, ?19
        )
        ON CONFLICT(asset_tag) DO UPDATE SET
            item_id = excluded.item_id,
            type_serial = excluded.type_serial,
            name = excluded.name,
            model = excluded.model,
            type_id = excluded.type_id,
            type_code = excluded.type_code,
            mac_address = excluded.mac_address,
            ip_address = excluded.ip_address,
            location_id = excluded.location_id,
            user_id = excluded.user_id,
            group_id = excluded.group_id,
            sub_type_id = excluded.sub_type_id,
            notes = excluded.notes,
            extension = excluded.extension,
            created_at_utc = excluded.created_at_utc,
            updated_at_utc = excluded.updated_at_utc,
            archived = 1,
            archived_at_utc = excluded.archived_at_utc,
            snapshot_json = excluded.snapshot_json,
            history_json = excluded.history_json;",
        params![
            item.asset_tag,
            item.id,
            item.type_serial,
            item.name,
            item.model,
            item.type_id,
            item.type_code,
            item.mac_address,
            item.ip_address,
            item.location_id,
            item.user_id,
            item.group_id,
            item.sub_type_id,
            item.notes,
            item.extension,
            item.created_at_utc,
            item.updated_at_utc,
            snapshot_json,
            history_json,
        ],
    )?;
    Ok(())
}

fn parse_archive_row(row: &Row<'_>) -> RepoResult<ArchivedItem> {
    let archived_raw: i64 = row.get("archived")?;
    let snapshot_raw: String = row.get("snapshot_json")?;
    let history_raw: String = row.get("history_json")?;
    let snapshot = serde_json::from_str::<Item>(&snapshot_raw).map_err(|err| {
        RepoError::InvalidData(format!("archive snapshot is not a valid item: {err}"))
    })?;
    let history = serde_json::from_str::<Vec<AuditEntry>>(&history_raw)?;

    Ok(ArchivedItem {
        asset_tag: row.get("asset_tag")?,
        item_id: row.get("item_id")?,
        type_serial: row.get("type_serial")?,
        name: row.get("name")?,
        model: row.get("model")?,
        type_id: row.get("type_id")?,
        type_code: row.get("type_code")?,
        mac_address: row.get("mac_address")?,
        ip_address: row.get("ip_address")?,
        location_id: row.get("location_id")?,
        user_id: row.get("user_id")?,
        group_id: row.get("group_id")?,
        sub_type_id: row.get("sub_type_id")?,
        notes: row.get("notes")?,
        extension: row.get("extension")?,
        created_at_utc: row.get("created_at_utc")?,
        updated_at_utc: row.get("updated_at_utc")?,
        archived: int_to_bool(archived_raw, "item_archive.archived")?,
        archived_at_utc: row.get("archived_at_utc")?,
        snapshot,
        history,
    })
}
