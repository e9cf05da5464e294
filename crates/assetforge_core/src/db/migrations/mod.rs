//! Schema upgrade registry and ledger-driven executor.
//!
//! # Responsibility
//! - Register the schema scripts shipped with this build.
//! - Apply pending scripts (embedded or from a directory) exactly once.
//!
//! # Invariants
//! - Scripts run in ascending numeric-prefix order, ties broken by name.
//! - One script and its ledger row commit together or not at all.
//! - Foreign keys are off while a script runs and restored afterwards.
//! - A script fails only on foreign-key violations it introduced.
//! - Scripts must not open or commit transactions themselves.

use crate::db::{DbError, DbResult};
use log::{error, info, warn};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Instant;

/// Ledger table recording every applied script by name.
pub const LEDGER_TABLE: &str = "schema_migrations";

#[derive(Debug, Clone, Copy)]
struct EmbeddedMigration {
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[EmbeddedMigration] = &[
    EmbeddedMigration {
        name: "0001_reference_catalogs.sql",
        sql: include_str!("0001_reference_catalogs.sql"),
    },
    EmbeddedMigration {
        name: "0002_items.sql",
        sql: include_str!("0002_items.sql"),
    },
    EmbeddedMigration {
        name: "0003_audit_and_archive.sql",
        sql: include_str!("0003_audit_and_archive.sql"),
    },
];

/// Where an applied script came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationSource {
    /// Compiled into this binary.
    Embedded,
    /// Read from an operator-supplied scripts directory.
    Directory,
}

impl MigrationSource {
    fn as_db(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Directory => "directory",
        }
    }

    fn from_db(value: &str) -> Self {
        match value {
            "directory" => Self::Directory,
            _ => Self::Embedded,
        }
    }
}

/// One named upgrade script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub name: String,
    pub sql: String,
}

/// Returns the name of the newest script shipped with this build.
pub fn latest_migration() -> &'static str {
    MIGRATIONS.last().map_or("", |migration| migration.name)
}

/// Returns the names of all scripts shipped with this build, in apply order.
pub fn embedded_migration_names() -> Vec<&'static str> {
    MIGRATIONS.iter().map(|migration| migration.name).collect()
}

/// Applies every embedded script not yet recorded in the ledger.
///
/// Returns the names applied by this call, empty when up to date.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<String>> {
    ensure_ledger(conn)?;

    let applied = load_ledger(conn)?;
    for (name, source) in &applied {
        if *source == MigrationSource::Embedded
            && !MIGRATIONS.iter().any(|migration| migration.name == name)
        {
            return Err(DbError::UnknownAppliedMigration(name.clone()));
        }
    }

    let scripts = MIGRATIONS
        .iter()
        .map(|migration| MigrationScript {
            name: migration.name.to_string(),
            sql: migration.sql.to_string(),
        })
        .collect();
    apply_scripts(conn, scripts, MigrationSource::Embedded)
}

/// Applies every `*.sql` script in `scripts_dir` not yet recorded in the
/// ledger.
///
/// A missing directory means nothing is outstanding. A failed script is
/// rolled back and left out of the ledger, so the next call retries it.
pub fn apply_pending(conn: &mut Connection, scripts_dir: impl AsRef<Path>) -> DbResult<Vec<String>> {
    let scripts = load_scripts_from_dir(scripts_dir.as_ref())?;
    ensure_ledger(conn)?;
    apply_scripts(conn, scripts, MigrationSource::Directory)
}

/// Returns applied script names in apply order.
pub fn applied_migration_names(conn: &Connection) -> DbResult<Vec<String>> {
    if !ledger_exists(conn)? {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = load_ledger(conn)?.into_keys().collect();
    names.sort_by(|a, b| script_order_key(a).cmp(&script_order_key(b)));
    Ok(names)
}

fn apply_scripts(
    conn: &mut Connection,
    mut scripts: Vec<MigrationScript>,
    source: MigrationSource,
) -> DbResult<Vec<String>> {
    scripts.sort_by(|a, b| script_order_key(&a.name).cmp(&script_order_key(&b.name)));

    let applied = load_ledger(conn)?;
    let mut applied_now = Vec::new();
    for script in scripts {
        if applied.contains_key(&script.name) {
            continue;
        }
        apply_one(conn, &script, source)?;
        applied_now.push(script.name);
    }

    Ok(applied_now)
}

fn apply_one(conn: &mut Connection, script: &MigrationScript, source: MigrationSource) -> DbResult<()> {
    let started_at = Instant::now();
    info!(
        "event=migration_apply module=db status=start script={} source={}",
        script.name,
        source.as_db()
    );

    // PRAGMA foreign_keys is a no-op inside a transaction, so toggle it around.
    let foreign_keys_were_on = foreign_keys_enabled(conn)?;
    if foreign_keys_were_on {
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    }

    let outcome = run_script(conn, script, source);

    let restored = if foreign_keys_were_on {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    } else {
        Ok(())
    };

    match outcome {
        Ok(()) => {
            restored?;
            info!(
                "event=migration_apply module=db status=ok script={} duration_ms={}",
                script.name,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            if let Err(restore_err) = restored {
                warn!(
                    "event=migration_apply module=db status=error script={} error_code=fk_restore_failed error={}",
                    script.name, restore_err
                );
            }
            error!(
                "event=migration_apply module=db status=error script={} duration_ms={} error_code=migration_failed error={}",
                script.name,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn run_script(conn: &mut Connection, script: &MigrationScript, source: MigrationSource) -> DbResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let existing = foreign_key_violations(&tx)?;
    if !existing.is_empty() {
        warn!(
            "event=migration_apply module=db status=ok script={} preexisting_fk_violations={}",
            script.name,
            existing.len()
        );
    }
    tx.execute_batch(&script.sql)?;

    let violations = foreign_key_violations(&tx)?
        .difference(&existing)
        .count();
    if violations > 0 {
        return Err(DbError::ForeignKeyViolation {
            script: script.name.clone(),
            violations,
        });
    }

    tx.execute(
        "INSERT INTO schema_migrations (filename, source, applied_at_utc)
         VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));",
        params![script.name.as_str(), source.as_db()],
    )?;
    tx.commit()?;
    Ok(())
}

fn ensure_ledger(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            filename TEXT PRIMARY KEY NOT NULL,
            source TEXT NOT NULL DEFAULT 'embedded',
            applied_at_utc TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn ledger_exists(conn: &Connection) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [LEDGER_TABLE],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_ledger(conn: &Connection) -> DbResult<BTreeMap<String, MigrationSource>> {
    let mut stmt = conn.prepare("SELECT filename, source FROM schema_migrations;")?;
    let mut rows = stmt.query([])?;
    let mut applied = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let source: String = row.get(1)?;
        applied.insert(name, MigrationSource::from_db(&source));
    }
    Ok(applied)
}

fn foreign_keys_enabled(conn: &Connection) -> DbResult<bool> {
    let value: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    Ok(value == 1)
}

/// One `PRAGMA foreign_key_check` row: child table, child rowid, parent
/// table and constraint index.
type FkViolationRow = (String, Option<i64>, String, i64);

fn foreign_key_violations(tx: &Transaction<'_>) -> DbResult<HashSet<FkViolationRow>> {
    let mut stmt = tx.prepare("PRAGMA foreign_key_check;")?;
    let rows = stmt.query_map([], |row| -> rusqlite::Result<FkViolationRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?;
    let mut violations = HashSet::new();
    for row in rows {
        violations.insert(row?);
    }
    Ok(violations)
}

fn load_scripts_from_dir(dir: &Path) -> DbResult<Vec<MigrationScript>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "event=migration_scan module=db status=ok scripts=0 reason=dir_missing dir={}",
                dir.display()
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(DbError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut scripts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DbError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_sql = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("sql"));
        if !is_sql || !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let sql = std::fs::read_to_string(&path).map_err(|source| DbError::Io {
            path: path.clone(),
            source,
        })?;
        scripts.push(MigrationScript {
            name: name.to_string(),
            sql,
        });
    }

    Ok(scripts)
}

/// Total order over script names: numeric prefix first, then the full name.
/// Names without a numeric prefix sort after all numbered ones.
fn script_order_key(name: &str) -> (u64, &str) {
    let digits: String = name.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    let prefix = digits.parse::<u64>().unwrap_or(u64::MAX);
    (prefix, name)
}

#[cfg(test)]
mod tests {
    use super::{latest_migration, script_order_key};

    #[test]
    fn numeric_prefix_orders_before_lexicographic_name() {
        let mut names = vec!["10_late.sql", "2_early.sql", "notes.sql", "0003_mid.sql"];
        names.sort_by(|a, b| script_order_key(a).cmp(&script_order_key(b)));
        assert_eq!(
            names,
            vec!["2_early.sql", "0003_mid.sql", "10_late.sql", "notes.sql"]
        );
    }

    #[test]
    fn latest_migration_is_the_last_registered_script() {
        assert_eq!(latest_migration(), "0003_audit_and_archive.sql");
    }
}
