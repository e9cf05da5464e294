//! Reference catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Manage hardware types, locations, users, groups, sub-types and the
//!   known-IP allow-list.
//! - Provide find-or-create (`ensure_*`) entry points for import paths.
//! - Expose lookup validators the item repository calls inside its
//!   transactions.
//!
//! # Invariants
//! - Catalog names are unique case-insensitively; type codes likewise.
//! - Known IPs are stored trimmed and unique.

use super::{RepoError, RepoResult};
use crate::model::catalog::{Group, HardwareType, KnownIp, Location, SubType, User};
use crate::model::item::{CatalogId, ItemId, ItemValidationError, TypeId};
use log::info;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

/// Lookup tables that items reference by optional foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Location,
    User,
    Group,
    SubType,
}

impl CatalogTable {
    fn table(self) -> &'static str {
        match self {
            Self::Location => "locations",
            Self::User => "users",
            Self::Group => "user_groups",
            Self::SubType => "sub_types",
        }
    }

    /// Human-facing catalog label used in errors.
    pub fn label(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::User => "user",
            Self::Group => "group",
            Self::SubType => "sub-type",
        }
    }
}

/// Repository interface for reference catalogs.
pub trait CatalogRepository {
    fn create_type(&self, name: &str, code: &str) -> RepoResult<HardwareType>;
    fn get_type(&self, id: TypeId) -> RepoResult<Option<HardwareType>>;
    fn find_type_by_code(&self, code: &str) -> RepoResult<Option<HardwareType>>;
    fn find_type_by_name(&self, name: &str) -> RepoResult<Option<HardwareType>>;
    fn list_types(&self) -> RepoResult<Vec<HardwareType>>;

    fn create_location(&self, name: &str, parent_id: Option<CatalogId>) -> RepoResult<Location>;
    fn find_location_by_name(&self, name: &str) -> RepoResult<Option<Location>>;
    /// Returns the location named `name`, creating it at root level if absent.
    fn ensure_location(&self, name: &str) -> RepoResult<Location>;
    fn list_locations(&self) -> RepoResult<Vec<Location>>;

    fn create_user(&self, name: &str, email: Option<&str>) -> RepoResult<User>;
    fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>>;
    fn ensure_user(&self, name: &str) -> RepoResult<User>;
    fn list_users(&self) -> RepoResult<Vec<User>>;

    fn create_group(&self, name: &str) -> RepoResult<Group>;
    fn find_group_by_name(&self, name: &str) -> RepoResult<Option<Group>>;
    fn ensure_group(&self, name: &str) -> RepoResult<Group>;
    fn list_groups(&self) -> RepoResult<Vec<Group>>;

    fn create_sub_type(&self, name: &str, type_id: Option<TypeId>) -> RepoResult<SubType>;
    fn find_sub_type_by_name(&self, name: &str) -> RepoResult<Option<SubType>>;
    fn list_sub_types(&self) -> RepoResult<Vec<SubType>>;

    /// Adds an address to the known-IP catalog; registering twice is a no-op.
    fn register_ip(&self, address: &str) -> RepoResult<KnownIp>;
    fn find_ip(&self, address: &str) -> RepoResult<Option<KnownIp>>;
    fn list_ips(&self) -> RepoResult<Vec<KnownIp>>;
    /// Known IPs not held by any live item.
    fn list_available_ips(&self) -> RepoResult<Vec<KnownIp>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        super::ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_type(&self, name: &str, code: &str) -> RepoResult<HardwareType> {
        let name = required_name(name, "hardware type name")?;
        let code = required_name(code, "hardware type code")?.to_ascii_uppercase();
        if self.find_type_by_code(&code)?.is_some() {
            return Err(RepoError::DuplicateName {
                catalog: "hardware type code",
                name: code,
            });
        }
        self.conn
            .execute(
                "INSERT INTO hardware_types (name, code) VALUES (?1, ?2);",
                params![name, code],
            )
            .map_err(|err| map_unique(err, "hardware type", name))?;
        let id = self.conn.last_insert_rowid();
        info!("event=catalog_create module=repo status=ok catalog=hardware_type id={id}");
        Ok(HardwareType {
            id,
            name: name.to_string(),
            code,
        })
    }

    fn get_type(&self, id: TypeId) -> RepoResult<Option<HardwareType>> {
        get_type(self.conn, id)
    }

    fn find_type_by_code(&self, code: &str) -> RepoResult<Option<HardwareType>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, code FROM hardware_types WHERE code = ?1 COLLATE NOCASE;",
                [code.trim()],
                parse_type_row,
            )
            .optional()?;
        Ok(row)
    }

    fn find_type_by_name(&self, name: &str) -> RepoResult<Option<HardwareType>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, code FROM hardware_types WHERE name = ?1 COLLATE NOCASE;",
                [name.trim()],
                parse_type_row,
            )
            .optional()?;
        Ok(row)
    }

    fn list_types(&self) -> RepoResult<Vec<HardwareType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, code FROM hardware_types ORDER BY name COLLATE NOCASE;")?;
        let rows = stmt.query_map([], parse_type_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_location(&self, name: &str, parent_id: Option<CatalogId>) -> RepoResult<Location> {
        let name = required_name(name, "location name")?;
        if let Some(parent_id) = parent_id {
            ensure_reference_exists(self.conn, CatalogTable::Location, parent_id)?;
        }
        self.conn
            .execute(
                "INSERT INTO locations (name, parent_id) VALUES (?1, ?2);",
                params![name, parent_id],
            )
            .map_err(|err| map_unique(err, "location", name))?;
        let id = self.conn.last_insert_rowid();
        info!("event=catalog_create module=repo status=ok catalog=location id={id}");
        Ok(Location {
            id,
            name: name.to_string(),
            parent_id,
        })
    }

    fn find_location_by_name(&self, name: &str) -> RepoResult<Option<Location>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, parent_id FROM locations WHERE name = ?1 COLLATE NOCASE;",
                [name.trim()],
                |row| {
                    Ok(Location {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        parent_id: row.get("parent_id")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn ensure_location(&self, name: &str) -> RepoResult<Location> {
        match self.find_location_by_name(name)? {
            Some(existing) => Ok(existing),
            None => self.create_location(name, None),
        }
    }

    fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id FROM locations ORDER BY name COLLATE NOCASE;")?;
        let rows = stmt.query_map([], |row| {
            Ok(Location {
                id: row.get("id")?,
                name: row.get("name")?,
                parent_id: row.get("parent_id")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_user(&self, name: &str, email: Option<&str>) -> RepoResult<User> {
        let name = required_name(name, "user name")?;
        let email = email.map(str::trim).filter(|value| !value.is_empty());
        self.conn
            .execute(
                "INSERT INTO users (name, email) VALUES (?1, ?2);",
                params![name, email],
            )
            .map_err(|err| map_unique(err, "user", name))?;
        let id = self.conn.last_insert_rowid();
        info!("event=catalog_create module=repo status=ok catalog=user id={id}");
        Ok(User {
            id,
            name: name.to_string(),
            email: email.map(str::to_string),
        })
    }

    fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE name = ?1 COLLATE NOCASE;",
                [name.trim()],
                |row| {
                    Ok(User {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        email: row.get("email")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn ensure_user(&self, name: &str) -> RepoResult<User> {
        match self.find_user_by_name(name)? {
            Some(existing) => Ok(existing),
            None => self.create_user(name, None),
        }
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users ORDER BY name COLLATE NOCASE;")?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                id: row.get("id")?,
                name: row.get("name")?,
                email: row.get("email")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_group(&self, name: &str) -> RepoResult<Group> {
        let name = required_name(name, "group name")?;
        self.conn
            .execute("INSERT INTO user_groups (name) VALUES (?1);", [name])
            .map_err(|err| map_unique(err, "group", name))?;
        let id = self.conn.last_insert_rowid();
        info!("event=catalog_create module=repo status=ok catalog=group id={id}");
        Ok(Group {
            id,
            name: name.to_string(),
        })
    }

    fn find_group_by_name(&self, name: &str) -> RepoResult<Option<Group>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM user_groups WHERE name = ?1 COLLATE NOCASE;",
                [name.trim()],
                |row| {
                    Ok(Group {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn ensure_group(&self, name: &str) -> RepoResult<Group> {
        match self.find_group_by_name(name)? {
            Some(existing) => Ok(existing),
            None => self.create_group(name),
        }
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM user_groups ORDER BY name COLLATE NOCASE;")?;
        let rows = stmt.query_map([], |row| {
            Ok(Group {
                id: row.get("id")?,
                name: row.get("name")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn create_sub_type(&self, name: &str, type_id: Option<TypeId>) -> RepoResult<SubType> {
        let name = required_name(name, "sub-type name")?;
        if let Some(type_id) = type_id {
            if get_type(self.conn, type_id)?.is_none() {
                return Err(RepoError::UnknownType(type_id));
            }
        }
        self.conn
            .execute(
                "INSERT INTO sub_types (name, type_id) VALUES (?1, ?2);",
                params![name, type_id],
            )
            .map_err(|err| map_unique(err, "sub-type", name))?;
        let id = self.conn.last_insert_rowid();
        info!("event=catalog_create module=repo status=ok catalog=sub_type id={id}");
        Ok(SubType {
            id,
            name: name.to_string(),
            type_id,
        })
    }

    fn find_sub_type_by_name(&self, name: &str) -> RepoResult<Option<SubType>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, type_id FROM sub_types WHERE name = ?1 COLLATE NOCASE;",
                [name.trim()],
                |row| {
                    Ok(SubType {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        type_id: row.get("type_id")?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn list_sub_types(&self) -> RepoResult<Vec<SubType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, type_id FROM sub_types ORDER BY name COLLATE NOCASE;")?;
        let rows = stmt.query_map([], |row| {
            Ok(SubType {
                id: row.get("id")?,
                name: row.get("name")?,
                type_id: row.get("type_id")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn register_ip(&self, address: &str) -> RepoResult<KnownIp> {
        let address = required_name(address, "IP address")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO ip_addresses (address) VALUES (?1);",
            [address],
        )?;
        self.find_ip(address)?.ok_or_else(|| {
            RepoError::InvalidData(format!("registered IP `{address}` missing in read-back"))
        })
    }

    fn find_ip(&self, address: &str) -> RepoResult<Option<KnownIp>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, address FROM ip_addresses WHERE address = ?1;",
                [address.trim()],
                parse_ip_row,
            )
            .optional()?;
        Ok(row)
    }

    fn list_ips(&self) -> RepoResult<Vec<KnownIp>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, address FROM ip_addresses ORDER BY address;")?;
        let rows = stmt.query_map([], parse_ip_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_available_ips(&self) -> RepoResult<Vec<KnownIp>> {
        let mut stmt = self.conn.prepare(
            "SELECT ip.id, ip.address
             FROM ip_addresses ip
             WHERE NOT EXISTS (
                SELECT 1
                FROM items i
                WHERE i.ip_address = ip.address
                  AND i.archived = 0
             )
             ORDER BY ip.address;",
        )?;
        let rows = stmt.query_map([], parse_ip_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Loads one hardware type by id.
pub(crate) fn get_type(conn: &Connection, id: TypeId) -> RepoResult<Option<HardwareType>> {
    let row = conn
        .query_row(
            "SELECT id, name, code FROM hardware_types WHERE id = ?1;",
            [id],
            parse_type_row,
        )
        .optional()?;
    Ok(row)
}

/// Resolves the tag code of a hardware type or fails with `UnknownType`.
pub(crate) fn type_code(conn: &Connection, type_id: TypeId) -> RepoResult<String> {
    get_type(conn, type_id)?
        .map(|hardware_type| hardware_type.code)
        .ok_or(RepoError::UnknownType(type_id))
}

/// Fails with `UnknownReference` unless the catalog row exists.
pub(crate) fn ensure_reference_exists(
    conn: &Connection,
    catalog: CatalogTable,
    id: CatalogId,
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            catalog.table()
        ),
        [id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::UnknownReference {
            catalog: catalog.label(),
            id,
        })
    }
}

/// Fails with `UnknownIp` unless the address is in the known-IP catalog.
pub(crate) fn ensure_ip_registered(conn: &Connection, address: &str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM ip_addresses WHERE address = ?1);",
        [address],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::UnknownIp(address.to_string()))
    }
}

/// Fails with `DuplicateIp` when a live item other than `except` holds the
/// address.
pub(crate) fn ensure_ip_free(
    conn: &Connection,
    address: &str,
    except: Option<ItemId>,
) -> RepoResult<()> {
    let holder: Option<String> = conn
        .query_row(
            "SELECT asset_tag
             FROM items
             WHERE ip_address = ?1
               AND archived = 0
               AND (?2 IS NULL OR id <> ?2)
             LIMIT 1;",
            params![address, except],
            |row| row.get(0),
        )
        .optional()?;
    match holder {
        Some(holder_tag) => Err(RepoError::DuplicateIp {
            ip: address.to_string(),
            holder_tag,
        }),
        None => Ok(()),
    }
}

fn required_name<'a>(value: &'a str, field: &'static str) -> RepoResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepoError::Validation(
            ItemValidationError::MissingCatalogField(field),
        ));
    }
    Ok(trimmed)
}

fn map_unique(err: rusqlite::Error, catalog: &'static str, name: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::DuplicateName {
                catalog,
                name: name.to_string(),
            }
        }
        _ => err.into(),
    }
}

fn parse_type_row(row: &Row<'_>) -> rusqlite::Result<HardwareType> {
    Ok(HardwareType {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
    })
}

fn parse_ip_row(row: &Row<'_>) -> rusqlite::Result<KnownIp> {
    Ok(KnownIp {
        id: row.get("id")?,
        address: row.get("address")?,
    })
}
