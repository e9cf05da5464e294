//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, update, reclassify, archive and delete hardware items.
//! - Enforce identity and uniqueness rules on every write.
//! - Append exactly one audit entry per observable mutation.
//!
//! # Invariants
//! - Every mutation runs in one immediate transaction and commits or rolls
//!   back as a unit, counter state included.
//! - A live item's IP is registered in the known-IP catalog and not held by
//!   another live item; the same holds for its MAC without the catalog rule.
//! - `extension` is only kept while the item's type is the landline type.
//! - List order ties are broken by `id ASC` (insertion order).

use super::archive_repo::upsert_archive;
use super::audit_repo::{insert_entry, list_entries, load_trail, purge_entries, AuditRecord};
use super::catalog_repo::{
    ensure_ip_free, ensure_ip_registered, ensure_reference_exists, type_code, CatalogTable,
};
use super::tag_allocator::TagAllocator;
use super::{bool_to_int, int_to_bool, RepoError, RepoResult};
use crate::config::{DeleteHistoryPolicy, StoreConfig};
use crate::model::audit::{AuditEntry, AuditEntryId, AuditReason};
use crate::model::item::{
    normalize_mac, normalize_text, CatalogId, Item, ItemId, ItemPatch, ItemValidationError,
    NewItem, TypeId, CREATE_AUDIT_FIELDS,
};
use log::{error, info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::time::Instant;

const ITEM_SELECT_SQL: &str = "SELECT
    i.id,
    i.type_serial,
    i.name,
    i.model,
    i.type_id,
    t.name AS type_name,
    t.code AS type_code,
    i.mac_address,
    i.ip_address,
    i.location_id,
    l.name AS location_name,
    i.user_id,
    u.name AS user_name,
    i.group_id,
    g.name AS group_name,
    i.sub_type_id,
    s.name AS sub_type_name,
    i.notes,
    i.extension,
    i.asset_tag,
    i.created_at_utc,
    i.updated_at_utc,
    i.archived
FROM items i
LEFT JOIN hardware_types t ON t.id = i.type_id
LEFT JOIN locations l ON l.id = i.location_id
LEFT JOIN users u ON u.id = i.user_id
LEFT JOIN user_groups g ON g.id = i.group_id
LEFT JOIN sub_types s ON s.id = i.sub_type_id";

/// Columns `list` can order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Model,
    TypeName,
    TypeSerial,
    AssetTag,
    MacAddress,
    IpAddress,
    LocationName,
    UserName,
    GroupName,
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    /// Parses a stable record field name, e.g. `asset_tag` or `updated_at_utc`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "name" => Some(Self::Name),
            "model" => Some(Self::Model),
            "type_name" | "type" => Some(Self::TypeName),
            "type_serial" => Some(Self::TypeSerial),
            "asset_tag" => Some(Self::AssetTag),
            "mac_address" => Some(Self::MacAddress),
            "ip_address" => Some(Self::IpAddress),
            "location_name" | "location" => Some(Self::LocationName),
            "user_name" | "user" => Some(Self::UserName),
            "group_name" | "group" => Some(Self::GroupName),
            "created_at_utc" => Some(Self::CreatedAt),
            "updated_at_utc" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Name => "i.name COLLATE NOCASE",
            Self::Model => "i.model COLLATE NOCASE",
            Self::TypeName => "t.name COLLATE NOCASE",
            Self::TypeSerial => "i.type_serial",
            Self::AssetTag => "i.asset_tag COLLATE NOCASE",
            Self::MacAddress => "i.mac_address",
            Self::IpAddress => "i.ip_address",
            Self::LocationName => "l.name COLLATE NOCASE",
            Self::UserName => "u.name COLLATE NOCASE",
            Self::GroupName => "g.name COLLATE NOCASE",
            Self::CreatedAt => "i.created_at_utc",
            Self::UpdatedAt => "i.updated_at_utc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering for `list`; defaults to most recently updated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl ItemOrder {
    pub fn asc(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

impl Default for ItemOrder {
    fn default() -> Self {
        Self::desc(SortColumn::UpdatedAt)
    }
}

/// Independent inclusion sets; an empty set does not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilters {
    pub type_ids: Vec<TypeId>,
    pub location_ids: Vec<CatalogId>,
    pub user_ids: Vec<CatalogId>,
    pub group_ids: Vec<CatalogId>,
}

/// Query options for `list_items`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    pub filters: ItemFilters,
    /// Case-insensitive substring over name, model, MAC and asset tag.
    pub search: Option<String>,
    pub order: ItemOrder,
    /// `None` or `0` uses the configured default; capped at the configured max.
    pub limit: Option<u32>,
    pub include_archived: bool,
}

/// Repository interface for item persistence.
pub trait ItemRepository {
    fn create_item(&self, new_item: &NewItem) -> RepoResult<Item>;
    fn get_item(&self, item_id: ItemId) -> RepoResult<Option<Item>>;
    /// Applies a partial update; returns whether any tracked field changed.
    fn update_item(
        &self,
        item_id: ItemId,
        patch: &ItemPatch,
        note: Option<&str>,
        reason: AuditReason,
    ) -> RepoResult<bool>;
    /// Moves the item into the archive table; returns `false` if it is absent.
    fn delete_item(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool>;
    /// Marks the item archived and releases its IP; `false` if already archived.
    fn archive_item(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool>;
    /// `None` leaves a slot untouched; `Some(None)` clears it.
    fn assign_item(
        &self,
        item_id: ItemId,
        user_id: Option<Option<CatalogId>>,
        group_id: Option<Option<CatalogId>>,
        note: Option<&str>,
    ) -> RepoResult<bool>;
    fn move_item(
        &self,
        item_id: ItemId,
        location_id: Option<CatalogId>,
        note: Option<&str>,
    ) -> RepoResult<bool>;
    fn add_audit_note(&self, item_id: ItemId, text: &str) -> RepoResult<AuditEntryId>;
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>>;
    /// Audit entries for `item_id`, newest first.
    fn history_for_item(&self, item_id: ItemId, limit: Option<u32>)
        -> RepoResult<Vec<AuditEntry>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
    config: StoreConfig,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Constructs a repository with default configuration.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_config(conn, StoreConfig::default())
    }

    /// Constructs a repository from a migrated connection.
    pub fn with_config(conn: &'conn Connection, config: StoreConfig) -> RepoResult<Self> {
        super::ensure_store_ready(conn)?;
        Ok(Self { conn, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn is_landline(&self, conn: &Connection, type_id: TypeId) -> RepoResult<bool> {
        let code = type_code(conn, type_id)?;
        Ok(code.eq_ignore_ascii_case(&self.config.landline_type_code))
    }

    fn create_in_tx(&self, new_item: &NewItem) -> RepoResult<Item> {
        new_item.validate()?;
        let Some(type_id) = new_item.type_id else {
            return Err(ItemValidationError::MissingType.into());
        };

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let landline = self.is_landline(&tx, type_id)?;

        let mac_address = new_item.mac_address.as_deref().and_then(normalize_mac);
        let ip_address = normalize_text(new_item.ip_address.as_deref());
        let extension = if landline {
            normalize_text(new_item.extension.as_deref())
        } else {
            None
        };

        validate_references(
            &tx,
            new_item.location_id,
            new_item.user_id,
            new_item.group_id,
            new_item.sub_type_id,
        )?;
        if let Some(ip) = ip_address.as_deref() {
            ensure_ip_registered(&tx, ip)?;
            ensure_ip_free(&tx, ip, None)?;
        }
        if let Some(mac) = mac_address.as_deref() {
            ensure_mac_free(&tx, mac, None)?;
        }

        let (type_serial, asset_tag) =
            TagAllocator::new(&tx, &self.config.tag_prefix).allocate(type_id)?;
        tx.execute(
            "INSERT INTO items (
                type_serial,
                name,
                model,
                type_id,
                mac_address,
                ip_address,
                location_id,
                user_id,
                group_id,
                sub_type_id,
                notes,
                extension,
                asset_tag
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                type_serial,
                new_item.name.trim(),
                normalize_text(new_item.model.as_deref()),
                type_id,
                mac_address,
                ip_address,
                new_item.location_id,
                new_item.user_id,
                new_item.group_id,
                new_item.sub_type_id,
                normalize_text(new_item.notes.as_deref()),
                extension,
                asset_tag,
            ],
        )?;
        let item_id = tx.last_insert_rowid();
        let created = load_item(&tx, item_id)?;
        let audit_note = normalize_text(new_item.audit_note.as_deref());

        insert_entry(
            &tx,
            &AuditRecord {
                item_id,
                asset_tag: Some(created.asset_tag.as_str()),
                reason: AuditReason::Create,
                note: audit_note.as_deref(),
                changed_fields: CREATE_AUDIT_FIELDS,
                before: None,
                after: Some(&created),
            },
        )?;
        tx.commit()?;
        Ok(created)
    }

    fn update_in_tx(
        &self,
        item_id: ItemId,
        patch: &ItemPatch,
        note: Option<&str>,
        reason: AuditReason,
    ) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let before = load_item(&tx, item_id)?;
        patch.validate()?;

        let mut candidate = before.clone();
        apply_patch(&mut candidate, patch);

        if candidate.type_id != before.type_id {
            let (type_serial, asset_tag) =
                TagAllocator::new(&tx, &self.config.tag_prefix).allocate(candidate.type_id)?;
            candidate.type_serial = type_serial;
            candidate.asset_tag = asset_tag;
        }
        if !self.is_landline(&tx, candidate.type_id)? {
            candidate.extension = None;
        }

        validate_changed_references(&tx, &before, &candidate)?;
        if candidate.ip_address != before.ip_address {
            if let Some(ip) = candidate.ip_address.as_deref() {
                if before.archived {
                    return Err(RepoError::ArchivedItem(item_id));
                }
                ensure_ip_registered(&tx, ip)?;
                ensure_ip_free(&tx, ip, Some(item_id))?;
            }
        }
        if candidate.mac_address != before.mac_address && !before.archived {
            if let Some(mac) = candidate.mac_address.as_deref() {
                ensure_mac_free(&tx, mac, Some(item_id))?;
            }
        }

        let note = normalize_text(note);
        let changed = before.changed_fields(&candidate);
        if changed.is_empty() {
            if note.is_none() {
                return Ok(false);
            }
            insert_entry(
                &tx,
                &AuditRecord {
                    item_id,
                    asset_tag: Some(before.asset_tag.as_str()),
                    reason,
                    note: note.as_deref(),
                    changed_fields: &[],
                    before: Some(&before),
                    after: Some(&before),
                },
            )?;
            tx.commit()?;
            return Ok(false);
        }

        write_stored_fields(&tx, &candidate)?;
        let after = load_item(&tx, item_id)?;
        insert_entry(
            &tx,
            &AuditRecord {
                item_id,
                asset_tag: Some(after.asset_tag.as_str()),
                reason,
                note: note.as_deref(),
                changed_fields: &changed,
                before: Some(&before),
                after: Some(&after),
            },
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn delete_in_tx(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(before) = find_item(&tx, item_id)? else {
            return Ok(false);
        };

        let note = normalize_text(note);
        insert_entry(
            &tx,
            &AuditRecord {
                item_id,
                asset_tag: Some(before.asset_tag.as_str()),
                reason: AuditReason::Delete,
                note: note.as_deref(),
                changed_fields: &[],
                before: Some(&before),
                after: None,
            },
        )?;
        let trail = load_trail(&tx, item_id)?;
        upsert_archive(&tx, &before, &trail)?;
        tx.execute("DELETE FROM items WHERE id = ?1;", [item_id])?;
        if self.config.delete_history_policy == DeleteHistoryPolicy::Purge {
            purge_entries(&tx, item_id)?;
        }
        tx.commit()?;
        Ok(true)
    }

    fn note_in_place(&self, item_id: ItemId, text: &str) -> RepoResult<AuditEntryId> {
        let Some(note) = normalize_text(Some(text)) else {
            return Err(ItemValidationError::MissingNote.into());
        };
        let item = load_item(self.conn, item_id)?;
        insert_entry(
            self.conn,
            &AuditRecord {
                item_id,
                asset_tag: Some(item.asset_tag.as_str()),
                reason: AuditReason::Audit,
                note: Some(note.as_str()),
                changed_fields: &[],
                before: None,
                after: None,
            },
        )
    }

    fn archive_in_tx(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let before = load_item(&tx, item_id)?;
        if before.archived {
            return Ok(false);
        }

        tx.execute(
            "UPDATE items
             SET archived = 1,
                 ip_address = NULL,
                 updated_at_utc = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1;",
            [item_id],
        )?;
        let after = load_item(&tx, item_id)?;
        let changed = before.changed_fields(&after);
        let note = normalize_text(note);
        insert_entry(
            &tx,
            &AuditRecord {
                item_id,
                asset_tag: Some(after.asset_tag.as_str()),
                reason: AuditReason::Archive,
                note: note.as_deref(),
                changed_fields: &changed,
                before: Some(&before),
                after: Some(&after),
            },
        )?;
        tx.commit()?;
        Ok(true)
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, new_item: &NewItem) -> RepoResult<Item> {
        let started_at = Instant::now();
        let result = self.create_in_tx(new_item);
        log_mutation(
            "item_create",
            result.as_ref().ok().map(|item| item.id),
            started_at,
            &result,
        );
        result
    }

    fn get_item(&self, item_id: ItemId) -> RepoResult<Option<Item>> {
        find_item(self.conn, item_id)
    }

    fn update_item(
        &self,
        item_id: ItemId,
        patch: &ItemPatch,
        note: Option<&str>,
        reason: AuditReason,
    ) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.update_in_tx(item_id, patch, note, reason);
        log_mutation(reason_event(reason), Some(item_id), started_at, &result);
        result
    }

    fn delete_item(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.delete_in_tx(item_id, note);
        log_mutation("item_delete", Some(item_id), started_at, &result);
        result
    }

    fn archive_item(&self, item_id: ItemId, note: Option<&str>) -> RepoResult<bool> {
        let started_at = Instant::now();
        let result = self.archive_in_tx(item_id, note);
        log_mutation("item_archive", Some(item_id), started_at, &result);
        result
    }

    fn assign_item(
        &self,
        item_id: ItemId,
        user_id: Option<Option<CatalogId>>,
        group_id: Option<Option<CatalogId>>,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        let patch = ItemPatch {
            user_id,
            group_id,
            ..ItemPatch::default()
        };
        self.update_item(item_id, &patch, note, AuditReason::Assign)
    }

    fn move_item(
        &self,
        item_id: ItemId,
        location_id: Option<CatalogId>,
        note: Option<&str>,
    ) -> RepoResult<bool> {
        let patch = ItemPatch {
            location_id: Some(location_id),
            ..ItemPatch::default()
        };
        self.update_item(item_id, &patch, note, AuditReason::Move)
    }

    fn add_audit_note(&self, item_id: ItemId, text: &str) -> RepoResult<AuditEntryId> {
        let started_at = Instant::now();
        let result = self.note_in_place(item_id, text);
        log_mutation("item_audit_note", Some(item_id), started_at, &result);
        result
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();

        if !query.include_archived {
            sql.push_str(" AND i.archived = 0");
        }
        push_in_filter(&mut sql, &mut values, "i.type_id", &query.filters.type_ids);
        push_in_filter(&mut sql, &mut values, "i.location_id", &query.filters.location_ids);
        push_in_filter(&mut sql, &mut values, "i.user_id", &query.filters.user_ids);
        push_in_filter(&mut sql, &mut values, "i.group_id", &query.filters.group_ids);

        if let Some(term) = normalize_text(query.search.as_deref()) {
            let text_slot = values.len() + 1;
            // SQLite's lower() folds ASCII only; fold the term the same way.
            values.push(Value::Text(term.to_ascii_lowercase()));
            let mac_slot = values.len() + 1;
            // A separator-free MAC fragment still matches the normalized column.
            values.push(Value::Text(normalize_mac(&term).unwrap_or(term)));
            sql.push_str(&format!(
                " AND (instr(lower(i.name), ?{text_slot}) > 0
                   OR instr(lower(COALESCE(i.model, '')), ?{text_slot}) > 0
                   OR instr(lower(COALESCE(i.mac_address, '')), ?{text_slot}) > 0
                   OR instr(COALESCE(i.mac_address, ''), ?{mac_slot}) > 0
                   OR instr(lower(i.asset_tag), ?{text_slot}) > 0)"
            ));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}, i.id ASC",
            query.order.column.sql(),
            query.order.direction.sql()
        ));
        let limit_slot = values.len() + 1;
        values.push(Value::Integer(i64::from(self.config.list_limit(query.limit))));
        sql.push_str(&format!(" LIMIT ?{limit_slot};"));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn history_for_item(
        &self,
        item_id: ItemId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<AuditEntry>> {
        list_entries(self.conn, item_id, self.config.history_limit(limit))
    }
}

fn reason_event(reason: AuditReason) -> &'static str {
    match reason {
        AuditReason::Assign => "item_assign",
        AuditReason::Move => "item_move",
        _ => "item_update",
    }
}

fn log_mutation<T>(
    event: &'static str,
    item_id: Option<ItemId>,
    started_at: Instant,
    result: &RepoResult<T>,
) {
    let item_id = item_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={event} module=repo status=ok item_id={item_id} duration_ms={duration_ms}"
        ),
        Err(err) if err.is_recoverable() => warn!(
            "event={event} module=repo status=rejected item_id={item_id} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module=repo status=error item_id={item_id} duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
    }
}

fn push_in_filter(sql: &mut String, values: &mut Vec<Value>, column: &str, ids: &[i64]) {
    if ids.is_empty() {
        return;
    }
    let mut slots = Vec::with_capacity(ids.len());
    for id in ids {
        values.push(Value::Integer(*id));
        slots.push(format!("?{}", values.len()));
    }
    sql.push_str(&format!(" AND {column} IN ({})", slots.join(", ")));
}

/// Copies the set slots of `patch` onto `item`, normalizing as on create.
fn apply_patch(item: &mut Item, patch: &ItemPatch) {
    if let Some(name) = &patch.name {
        item.name = name.trim().to_string();
    }
    if let Some(type_id) = patch.type_id {
        item.type_id = type_id;
    }
    if let Some(model) = &patch.model {
        item.model = normalize_text(model.as_deref());
    }
    if let Some(mac) = &patch.mac_address {
        item.mac_address = mac.as_deref().and_then(normalize_mac);
    }
    if let Some(ip) = &patch.ip_address {
        item.ip_address = normalize_text(ip.as_deref());
    }
    if let Some(location_id) = patch.location_id {
        item.location_id = location_id;
    }
    if let Some(user_id) = patch.user_id {
        item.user_id = user_id;
    }
    if let Some(group_id) = patch.group_id {
        item.group_id = group_id;
    }
    if let Some(sub_type_id) = patch.sub_type_id {
        item.sub_type_id = sub_type_id;
    }
    if let Some(notes) = &patch.notes {
        item.notes = normalize_text(notes.as_deref());
    }
    if let Some(extension) = &patch.extension {
        item.extension = normalize_text(extension.as_deref());
    }
}

fn validate_references(
    conn: &Connection,
    location_id: Option<CatalogId>,
    user_id: Option<CatalogId>,
    group_id: Option<CatalogId>,
    sub_type_id: Option<CatalogId>,
) -> RepoResult<()> {
    let references = [
        (CatalogTable::Location, location_id),
        (CatalogTable::User, user_id),
        (CatalogTable::Group, group_id),
        (CatalogTable::SubType, sub_type_id),
    ];
    for (catalog, id) in references {
        if let Some(id) = id {
            ensure_reference_exists(conn, catalog, id)?;
        }
    }
    Ok(())
}

/// Validates only the references an update actually changes, so a row
/// pointing at a since-removed catalog entry stays editable.
fn validate_changed_references(conn: &Connection, before: &Item, after: &Item) -> RepoResult<()> {
    let changed = |old: Option<CatalogId>, new: Option<CatalogId>| {
        if old == new {
            None
        } else {
            new
        }
    };
    validate_references(
        conn,
        changed(before.location_id, after.location_id),
        changed(before.user_id, after.user_id),
        changed(before.group_id, after.group_id),
        changed(before.sub_type_id, after.sub_type_id),
    )
}

fn ensure_mac_free(conn: &Connection, mac: &str, except: Option<ItemId>) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT asset_tag
         FROM items
         WHERE mac_address = ?1 COLLATE NOCASE
           AND archived = 0
           AND (?2 IS NULL OR id <> ?2)
         LIMIT 1;",
    )?;
    let mut rows = stmt.query(params![mac, except])?;
    match rows.next()? {
        Some(row) => Err(RepoError::DuplicateMac {
            mac: mac.to_string(),
            holder_tag: row.get(0)?,
        }),
        None => Ok(()),
    }
}

fn write_stored_fields(conn: &Connection, item: &Item) -> RepoResult<()> {
    conn.execute(
        "UPDATE items
         SET name = ?2,
             model = ?3,
             type_id = ?4,
             type_serial = ?5,
             asset_tag = ?6,
             mac_address = ?7,
             ip_address = ?8,
             location_id = ?9,
             user_id = ?10,
             group_id = ?11,
             sub_type_id = ?12,
             notes = ?13,
             extension = ?14,
             archived = ?15,
             updated_at_utc = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?1;",
        params![
            item.id,
            item.name,
            item.model,
            item.type_id,
            item.type_serial,
            item.asset_tag,
            item.mac_address,
            item.ip_address,
            item.location_id,
            item.user_id,
            item.group_id,
            item.sub_type_id,
            item.notes,
            item.extension,
            bool_to_int(item.archived),
        ],
    )?;
    Ok(())
}

fn find_item(conn: &Connection, item_id: ItemId) -> RepoResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE i.id = ?1;"))?;
    let mut rows = stmt.query([item_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_item_row(row)?)),
        None => Ok(None),
    }
}

fn load_item(conn: &Connection, item_id: ItemId) -> RepoResult<Item> {
    find_item(conn, item_id)?.ok_or(RepoError::NotFound(item_id))
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let archived_raw: i64 = row.get("archived")?;
    Ok(Item {
        id: row.get("id")?,
        type_serial: row.get("type_serial")?,
        name: row.get("name")?,
        model: row.get("model")?,
        type_id: row.get("type_id")?,
        type_name: row.get("type_name")?,
        type_code: row.get("type_code")?,
        mac_address: row.get("mac_address")?,
        ip_address: row.get("ip_address")?,
        location_id: row.get("location_id")?,
        location_name: row.get("location_name")?,
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        group_id: row.get("group_id")?,
        group_name: row.get("group_name")?,
        sub_type_id: row.get("sub_type_id")?,
        sub_type_name: row.get("sub_type_name")?,
        notes: row.get("notes")?,
        extension: row.get("extension")?,
        asset_tag: row.get("asset_tag")?,
        created_at_utc: row.get("created_at_utc")?,
        updated_at_utc: row.get("updated_at_utc")?,
        archived: int_to_bool(archived_raw, "items.archived")?,
    })
}
