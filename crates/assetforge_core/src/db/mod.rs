//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the asset store.
//! - Apply schema upgrade scripts in deterministic order.
//!
//! # Invariants
//! - Applied scripts are tracked by name in the `schema_migrations` ledger.
//! - Core code must not read/write inventory data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, verify_database};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A scripts directory or script file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A script left rows violating foreign keys behind; it was rolled back.
    ForeignKeyViolation { script: String, violations: usize },
    /// The ledger names a script this binary does not ship.
    UnknownAppliedMigration(String),
    /// `PRAGMA quick_check` reported damage.
    IntegrityCheckFailed(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::ForeignKeyViolation { script, violations } => write!(
                f,
                "migration `{script}` left {violations} foreign key violation(s)"
            ),
            Self::UnknownAppliedMigration(name) => write!(
                f,
                "database was migrated with `{name}`, which this build does not know"
            ),
            Self::IntegrityCheckFailed(details) => {
                write!(f, "database integrity check failed: {details}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::ForeignKeyViolation { .. } => None,
            Self::UnknownAppliedMigration(_) => None,
            Self::IntegrityCheckFailed(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
