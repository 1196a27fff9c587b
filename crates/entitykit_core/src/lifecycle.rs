//! Lifecycle stamping applied in front of every storage save.
//!
//! # Responsibility
//! - Assign the external id and refresh timestamps right before a write.
//! - Wrap raw repositories so no save path can skip stamping.
//!
//! # Invariants
//! - Stamping order is `generate_external_id_if_absent` then `touch_modified`.
//! - Validation runs before stamping; rejected entities are left untouched.
//! - Stamping performs no I/O and mutates only the entity's metadata.
//! - Contract violations surface as `LifecycleError` and are never skipped.

use crate::model::entity::{EntityId, EpochMs, PersistedEntity};
use crate::repo::{LinkRepository, RepoResult, Repository};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Violation of the stamping contract. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Entity still has no external id after stamping.
    MissingExternalId { entity: &'static str },
    /// Entity still has no creation timestamp after stamping.
    MissingCreatedAt { entity: &'static str },
    /// Entity reports a modification before its creation.
    ModifiedBeforeCreated {
        entity: &'static str,
        created_at: EpochMs,
        modified_at: EpochMs,
    },
    /// Entity reached a physical write without passing through stamping.
    Unstamped { entity: &'static str },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingExternalId { entity } => {
                write!(f, "{entity} has no external id after stamping")
            }
            Self::MissingCreatedAt { entity } => {
                write!(f, "{entity} has no created timestamp after stamping")
            }
            Self::ModifiedBeforeCreated {
                entity,
                created_at,
                modified_at,
            } => write!(
                f,
                "{entity} modified_at ({modified_at}) is earlier than created_at ({created_at})"
            ),
            Self::Unstamped { entity } => {
                write!(f, "{entity} reached storage without lifecycle stamps")
            }
        }
    }
}

impl Error for LifecycleError {}

/// Stamps `entity` for a save and verifies the resulting metadata.
pub fn stamp<T: PersistedEntity>(entity: &mut T) -> Result<(), LifecycleError> {
    let generated = entity.generate_external_id_if_absent();
    entity.touch_modified();

    if let Err(err) = ensure_stamped(entity) {
        error!(
            "event=entity_stamp module=lifecycle status=error entity={} error={}",
            T::ENTITY_NAME,
            err
        );
        return Err(err);
    }

    debug!(
        "event=entity_stamp module=lifecycle status=ok entity={} generated_external_id={}",
        T::ENTITY_NAME,
        generated
    );
    Ok(())
}

/// Metadata values verified by [`checked_stamps`], borrowed from the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamps<'a> {
    pub external_id: &'a str,
    pub created_at: EpochMs,
    pub modified_at: EpochMs,
}

/// Checks the post-stamp invariants without mutating the entity.
///
/// Storage implementations call this at the physical write boundary.
pub fn ensure_stamped<T: PersistedEntity>(entity: &T) -> Result<(), LifecycleError> {
    checked_stamps(entity).map(|_| ())
}

/// Like [`ensure_stamped`], but hands back the verified values for binding.
pub fn checked_stamps<T: PersistedEntity>(entity: &T) -> Result<Stamps<'_>, LifecycleError> {
    let external_id = entity
        .external_id()
        .ok_or(LifecycleError::MissingExternalId {
            entity: T::ENTITY_NAME,
        })?;

    let created_at = entity.created_at().ok_or(LifecycleError::MissingCreatedAt {
        entity: T::ENTITY_NAME,
    })?;

    match entity.modified_at() {
        Some(modified_at) if modified_at < created_at => {
            Err(LifecycleError::ModifiedBeforeCreated {
                entity: T::ENTITY_NAME,
                created_at,
                modified_at,
            })
        }
        Some(modified_at) => Ok(Stamps {
            external_id,
            created_at,
            modified_at,
        }),
        None => Err(LifecycleError::Unstamped {
            entity: T::ENTITY_NAME,
        }),
    }
}

/// Repository decorator that stamps every entity before delegating `save`.
///
/// Reads and deletes are forwarded unchanged.
#[derive(Debug, Clone)]
pub struct Stamped<R> {
    inner: R,
}

impl<R> Stamped<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<T, R> Repository<T> for Stamped<R>
where
    T: PersistedEntity,
    R: Repository<T>,
{
    fn save(&self, mut entity: T) -> RepoResult<T> {
        entity.validate()?;
        stamp(&mut entity)?;
        self.inner.save(entity)
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        self.inner.find_all()
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<T>> {
        self.inner.find_by_id(id)
    }

    fn delete(&self, entity: &T) -> RepoResult<()> {
        self.inner.delete(entity)
    }
}

impl<L, R> LinkRepository<L> for Stamped<R>
where
    L: PersistedEntity,
    R: LinkRepository<L>,
{
    fn find_by_group(&self, group_id: EntityId) -> RepoResult<Vec<L>> {
        self.inner.find_by_group(group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{checked_stamps, ensure_stamped, stamp, LifecycleError, Stamped};
    use crate::model::entity::{EntityId, EntityMeta, PersistedEntity, ValidationError};
    use crate::repo::{RepoError, RepoResult, Repository};
    use std::cell::RefCell;

    #[derive(Debug, Clone, Default)]
    struct Widget {
        meta: EntityMeta,
        label: String,
    }

    impl PersistedEntity for Widget {
        const ENTITY_NAME: &'static str = "widget";

        fn meta(&self) -> &EntityMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut EntityMeta {
            &mut self.meta
        }

        fn validate(&self) -> Result<(), ValidationError> {
            if self.label.is_empty() {
                return Err(ValidationError::BlankField {
                    entity: Self::ENTITY_NAME,
                    field: "label",
                });
            }
            Ok(())
        }
    }

    /// Records what reaches the write boundary.
    #[derive(Default)]
    struct Recorder {
        saved: RefCell<Vec<Widget>>,
    }

    impl Repository<Widget> for Recorder {
        fn save(&self, entity: Widget) -> RepoResult<Widget> {
            self.saved.borrow_mut().push(entity.clone());
            Ok(entity)
        }

        fn find_all(&self) -> RepoResult<Vec<Widget>> {
            Ok(self.saved.borrow().clone())
        }

        fn find_by_id(&self, _id: EntityId) -> RepoResult<Option<Widget>> {
            Ok(None)
        }

        fn delete(&self, _entity: &Widget) -> RepoResult<()> {
            Ok(())
        }
    }

    #[test]
    fn stamped_save_writes_stamped_entity() {
        let recorder = Recorder::default();
        let repo = Stamped::new(&recorder);

        let widget = Widget {
            label: "gear".to_string(),
            ..Widget::default()
        };
        repo.save(widget).unwrap();

        let saved = recorder.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert!(ensure_stamped(&saved[0]).is_ok());
    }

    #[test]
    fn validation_failure_never_reaches_storage() {
        let recorder = Recorder::default();
        let repo = Stamped::new(&recorder);

        let err = repo.save(Widget::default()).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(recorder.saved.borrow().is_empty());
    }

    #[test]
    fn ensure_stamped_rejects_fresh_entity() {
        let widget = Widget::default();
        assert_eq!(
            ensure_stamped(&widget),
            Err(LifecycleError::MissingExternalId { entity: "widget" })
        );
    }

    #[test]
    fn ensure_stamped_rejects_reversed_timestamps() {
        let mut widget = Widget::default();
        stamp(&mut widget).unwrap();
        widget.set_created_at(2_000);
        widget.set_modified_at(1_000);

        assert!(matches!(
            ensure_stamped(&widget),
            Err(LifecycleError::ModifiedBeforeCreated { .. })
        ));
    }

    #[test]
    fn stamp_preserves_existing_external_id() {
        let mut widget = Widget::default();
        widget.set_external_id("fixed-id".to_string());
        stamp(&mut widget).unwrap();
        assert_eq!(widget.external_id(), Some("fixed-id"));
    }

    #[test]
    fn checked_stamps_returns_the_verified_values() {
        let mut widget = Widget::default();
        widget.set_external_id("fixed-id".to_string());
        widget.touch_modified_at(1_000);
        widget.set_modified_at(1_500);

        let stamps = checked_stamps(&widget).unwrap();
        assert_eq!(stamps.external_id, "fixed-id");
        assert_eq!(stamps.created_at, 1_000);
        assert_eq!(stamps.modified_at, 1_500);
    }
}
