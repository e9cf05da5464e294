//! Per-type serial allocation and asset tag generation.
//!
//! # Invariants
//! - Serials are allocated from the durable `type_counters` row, so a
//!   serial is never handed out twice for the same type, even after deletes.
//! - Allocation must run inside the caller's immediate transaction; a
//!   rolled-back transaction leaves the counter untouched.

use super::catalog_repo::type_code;
use super::RepoResult;
use crate::model::item::{format_asset_tag, TypeId};
use rusqlite::{params, Connection};

/// Allocates serials and formats tags against one connection.
pub struct TagAllocator<'a> {
    conn: &'a Connection,
    prefix: &'a str,
}

impl<'a> TagAllocator<'a> {
    pub fn new(conn: &'a Connection, prefix: &'a str) -> Self {
        Self { conn, prefix }
    }

    /// Reserves the next serial for `type_id` and returns `(serial, tag)`.
    ///
    /// Fails with `UnknownType` when the type does not exist.
    pub fn allocate(&self, type_id: TypeId) -> RepoResult<(i64, String)> {
        let code = type_code(self.conn, type_id)?;
        let serial = self.next_serial(type_id)?;
        Ok((serial, format_asset_tag(self.prefix, &code, serial)))
    }

    /// Returns the serial the next allocation would hand out, without
    /// reserving it.
    pub fn peek_next_serial(&self, type_id: TypeId) -> RepoResult<i64> {
        type_code(self.conn, type_id)?;
        let serial: i64 = self.conn.query_row(
            "SELECT COALESCE(
                (SELECT next_serial FROM type_counters WHERE type_id = ?1),
                (SELECT COALESCE(MAX(type_serial), 0) + 1 FROM items WHERE type_id = ?1)
            );",
            [type_id],
            |row| row.get(0),
        )?;
        Ok(serial)
    }

    /// Formats the tag for an already allocated serial.
    pub fn tag_for(&self, type_id: TypeId, serial: i64) -> RepoResult<String> {
        let code = type_code(self.conn, type_id)?;
        Ok(format_asset_tag(self.prefix, &code, serial))
    }

    fn next_serial(&self, type_id: TypeId) -> RepoResult<i64> {
        // Counter rows are created lazily and seeded past any existing serial.
        self.conn.execute(
            "INSERT OR IGNORE INTO type_counters (type_id, next_serial)
             SELECT ?1, COALESCE(MAX(type_serial), 0) + 1
             FROM items
             WHERE type_id = ?1;",
            [type_id],
        )?;
        let serial: i64 = self.conn.query_row(
            "SELECT next_serial FROM type_counters WHERE type_id = ?1;",
            [type_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "UPDATE type_counters SET next_serial = ?2 WHERE type_id = ?1;",
            params![type_id, serial + 1],
        )?;
        Ok(serial)
    }
}

#[cfg(test)]
mod tests {
    use super::TagAllocator;
    use crate::db::open_db_in_memory;
    use crate::repo::RepoError;

    fn type_id_for(conn: &rusqlite::Connection, code: &str) -> i64 {
        conn.query_row(
            "SELECT id FROM hardware_types WHERE code = ?1;",
            [code],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn allocate_counts_up_per_type() {
        let conn = open_db_in_memory().unwrap();
        let pc = type_id_for(&conn, "PC");
        let lt = type_id_for(&conn, "LT");
        let allocator = TagAllocator::new(&conn, "SDMM");

        assert_eq!(allocator.peek_next_serial(pc).unwrap(), 1);
        assert_eq!(allocator.allocate(pc).unwrap(), (1, "SDMM-PC-0001".to_string()));
        assert_eq!(allocator.allocate(pc).unwrap(), (2, "SDMM-PC-0002".to_string()));
        assert_eq!(allocator.allocate(lt).unwrap(), (1, "SDMM-LT-0001".to_string()));
        assert_eq!(allocator.peek_next_serial(pc).unwrap(), 3);
    }

    #[test]
    fn allocate_rejects_unknown_type() {
        let conn = open_db_in_memory().unwrap();
        let allocator = TagAllocator::new(&conn, "SDMM");
        let err = allocator.allocate(9_999).unwrap_err();
        assert!(matches!(err, RepoError::UnknownType(9_999)));
    }
}
