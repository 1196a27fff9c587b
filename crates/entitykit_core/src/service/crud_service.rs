//! Generic CRUD use-case service.
//!
//! # Responsibility
//! - Expose create/read/update/delete for any persisted entity type.
//! - Route every write through the lifecycle stamping decorator.
//!
//! # Invariants
//! - Repository results and errors are returned unchanged; no retries.
//! - `read_by_id` reports absence as `RepoError::NotFound`.
//! - `update` only accepts entities that already carry a storage id.

use crate::lifecycle::Stamped;
use crate::model::entity::{EntityId, PersistedEntity};
use crate::repo::{RepoError, RepoResult, Repository};
use std::marker::PhantomData;

/// Service contract shared by all entity services.
pub trait EntityService<T: PersistedEntity> {
    /// Persists a new entity and returns it with identity fields populated.
    fn create(&self, entity: T) -> RepoResult<T>;
    /// Returns every stored entity in storage order.
    fn read_all(&self) -> RepoResult<Vec<T>>;
    fn read_by_id(&self, id: EntityId) -> RepoResult<T>;
    /// Persists changes to an existing entity. Last write wins.
    fn update(&self, entity: T) -> RepoResult<T>;
    fn delete(&self, entity: &T) -> RepoResult<()>;
}

/// Generic [`EntityService`] over a raw storage repository.
///
/// The repository is wrapped in [`Stamped`] on construction, so callers cannot
/// reach storage `save` without lifecycle stamping.
pub struct CrudService<T, R> {
    repo: Stamped<R>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R> CrudService<T, R>
where
    T: PersistedEntity,
    R: Repository<T>,
{
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo: Stamped::new(repo),
            _entity: PhantomData,
        }
    }
}

impl<T, R> EntityService<T> for CrudService<T, R>
where
    T: PersistedEntity,
    R: Repository<T>,
{
    fn create(&self, entity: T) -> RepoResult<T> {
        self.repo.save(entity)
    }

    fn read_all(&self) -> RepoResult<Vec<T>> {
        self.repo.find_all()
    }

    fn read_by_id(&self, id: EntityId) -> RepoResult<T> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| RepoError::not_found::<T>(id))
    }

    fn update(&self, entity: T) -> RepoResult<T> {
        if !entity.meta().is_persisted() {
            return Err(RepoError::NotPersisted(T::ENTITY_NAME));
        }
        self.repo.save(entity)
    }

    fn delete(&self, entity: &T) -> RepoResult<()> {
        self.repo.delete(entity)
    }
}
