//! Repository contracts shared by services and storage implementations.
//!
//! # Responsibility
//! - Define the storage-facing `Repository<T>` collaborator contract.
//! - Define the single error type returned across repository and service
//!   boundaries.
//!
//! # Invariants
//! - Storage implementations own primary-key assignment.
//! - `NotFound`/`NotPersisted` are reported distinctly from transport
//!   failures (`Db`).

use crate::db::DbError;
use crate::lifecycle::LifecycleError;
use crate::model::entity::{EntityId, PersistedEntity, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for repository and service operations.
#[derive(Debug)]
pub enum RepoError {
    /// Business validation failed; nothing was written.
    Validation(ValidationError),
    /// Lifecycle stamping contract was violated. Indicates a wiring bug.
    Lifecycle(LifecycleError),
    /// Storage engine failure.
    Db(DbError),
    /// No stored row matches the id.
    NotFound { entity: &'static str, id: EntityId },
    /// Entity has never been saved, so it has no id to address.
    NotPersisted(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Stored row violates the persisted layout.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error means "absent" rather than "failed".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NotPersisted(_))
    }

    pub(crate) fn not_found<T: PersistedEntity>(id: EntityId) -> Self {
        Self::NotFound {
            entity: T::ENTITY_NAME,
            id,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Lifecycle(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::NotPersisted(entity) => write!(f, "{entity} has not been persisted"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Lifecycle(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<LifecycleError> for RepoError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator for one entity type.
///
/// `save` inserts when the entity has no id and updates otherwise; the
/// returned value reflects what was written, including a freshly assigned id.
pub trait Repository<T: PersistedEntity> {
    fn save(&self, entity: T) -> RepoResult<T>;
    fn find_all(&self) -> RepoResult<Vec<T>>;
    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<T>>;
    fn delete(&self, entity: &T) -> RepoResult<()>;
}

/// Storage collaborator for link entities, adding the group-side lookup.
pub trait LinkRepository<L: PersistedEntity>: Repository<L> {
    fn find_by_group(&self, group_id: EntityId) -> RepoResult<Vec<L>>;
}

impl<T: PersistedEntity, R: Repository<T> + ?Sized> Repository<T> for &R {
    fn save(&self, entity: T) -> RepoResult<T> {
        (**self).save(entity)
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        (**self).find_all()
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<T>> {
        (**self).find_by_id(id)
    }

    fn delete(&self, entity: &T) -> RepoResult<()> {
        (**self).delete(entity)
    }
}

impl<L: PersistedEntity, R: LinkRepository<L> + ?Sized> LinkRepository<L> for &R {
    fn find_by_group(&self, group_id: EntityId) -> RepoResult<Vec<L>> {
        (**self).find_by_group(group_id)
    }
}
