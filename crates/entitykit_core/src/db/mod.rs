//! Store bootstrap: opening the entity database and migrating its schema.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Entity tables are only touched by repositories after `open_*` succeeds.

use crate::config::DatabaseLocation;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_config};

pub type DbResult<T> = Result<T, DbError>;

/// Failure raised by the storage engine or while preparing the store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite could not open the configured database at all.
    Open {
        location: DatabaseLocation,
        source: rusqlite::Error,
    },
    /// Statement failure on an opened connection, including repository SQL.
    Sqlite(rusqlite::Error),
    /// The store was written by a newer build with more migrations.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Location that failed to open, when the failure happened at open time.
    pub fn location(&self) -> Option<&DatabaseLocation> {
        match self {
            Self::Open { location, .. } => Some(location),
            Self::Sqlite(_) | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open {
                location: DatabaseLocation::Memory,
                source,
            } => write!(f, "cannot open in-memory entity store: {source}"),
            Self::Open {
                location: DatabaseLocation::File(path),
                source,
            } => write!(f, "cannot open entity store {}: {source}", path.display()),
            Self::Sqlite(err) => write!(f, "storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "entity store schema v{db_version} requires a newer build (this one knows v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
