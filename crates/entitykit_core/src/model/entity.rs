//! Persisted entity contract.
//!
//! # Responsibility
//! - Define the identity/temporal metadata every storable entity carries.
//! - Provide the two lifecycle steps (`generate_external_id_if_absent`,
//!   `touch_modified`) as default trait methods so concrete entities only
//!   expose their `EntityMeta`.
//!
//! # Invariants
//! - `id` is assigned by the storage engine only.
//! - `external_id` is generated at most once; an assigned value is never
//!   replaced by lifecycle helpers.
//! - `created_at` is set on the first touch only; `modified_at` on every touch.
//!
//! # See also
//! - crate::lifecycle

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Storage-generated primary key.
pub type EntityId = i64;

/// Unix epoch milliseconds.
pub type EpochMs = i64;

/// Identity and temporal metadata shared by every persisted entity.
///
/// All fields are empty for an entity that has never been saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Primary key assigned by storage on first write.
    pub id: Option<EntityId>,
    /// Opaque UUID-formatted identifier, independent from `id`.
    pub external_id: Option<String>,
    /// First-save timestamp.
    pub created_at: Option<EpochMs>,
    /// Last-save timestamp.
    pub modified_at: Option<EpochMs>,
}

impl EntityMeta {
    /// Returns whether storage has assigned a primary key.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Business-field validation failure, raised before any storage attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace only.
    BlankField {
        entity: &'static str,
        field: &'static str,
    },
    /// Reference field does not hold a usable primary key.
    InvalidReference {
        entity: &'static str,
        field: &'static str,
        value: EntityId,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { entity, field } => {
                write!(f, "{entity}.{field} must not be blank")
            }
            Self::InvalidReference {
                entity,
                field,
                value,
            } => write!(f, "{entity}.{field} references invalid id {value}"),
        }
    }
}

impl Error for ValidationError {}

/// Capability set every storable entity implements.
///
/// Implementors provide access to their [`EntityMeta`]; every accessor and
/// lifecycle step is derived from it.
pub trait PersistedEntity {
    /// Stable entity name used in errors and log events.
    const ENTITY_NAME: &'static str;

    fn meta(&self) -> &EntityMeta;
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Validates business fields. Defaults to accepting everything.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn id(&self) -> Option<EntityId> {
        self.meta().id
    }

    /// Reserved for storage implementations.
    fn set_id(&mut self, id: EntityId) {
        self.meta_mut().id = Some(id);
    }

    /// Returns the external id, treating an empty string as absent.
    fn external_id(&self) -> Option<&str> {
        self.meta()
            .external_id
            .as_deref()
            .filter(|value| !value.is_empty())
    }

    fn set_external_id(&mut self, external_id: String) {
        self.meta_mut().external_id = Some(external_id);
    }

    /// Assigns a fresh v4 UUID when no external id is present.
    ///
    /// Returns `true` when a value was generated, `false` for the no-op case.
    fn generate_external_id_if_absent(&mut self) -> bool {
        if self.external_id().is_some() {
            return false;
        }
        self.set_external_id(Uuid::new_v4().to_string());
        true
    }

    fn created_at(&self) -> Option<EpochMs> {
        self.meta().created_at
    }

    fn set_created_at(&mut self, created_at: EpochMs) {
        self.meta_mut().created_at = Some(created_at);
    }

    fn modified_at(&self) -> Option<EpochMs> {
        self.meta().modified_at
    }

    fn set_modified_at(&mut self, modified_at: EpochMs) {
        self.meta_mut().modified_at = Some(modified_at);
    }

    /// Refreshes `modified_at`, setting `created_at` on first use.
    fn touch_modified(&mut self) {
        self.touch_modified_at(now_epoch_ms());
    }

    /// Clock-injected form of [`PersistedEntity::touch_modified`].
    fn touch_modified_at(&mut self, now: EpochMs) {
        let meta = self.meta_mut();
        if meta.created_at.is_none() {
            meta.created_at = Some(now);
        }
        meta.modified_at = Some(now);
    }
}

/// Current wall-clock time in epoch milliseconds.
///
/// Clamps to `0` for clocks set before the Unix epoch.
pub fn now_epoch_ms() -> EpochMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{now_epoch_ms, EntityMeta, PersistedEntity};

    #[derive(Default)]
    struct Sample {
        meta: EntityMeta,
    }

    impl PersistedEntity for Sample {
        const ENTITY_NAME: &'static str = "sample";

        fn meta(&self) -> &EntityMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut EntityMeta {
            &mut self.meta
        }
    }

    #[test]
    fn empty_external_id_counts_as_absent() {
        let mut sample = Sample::default();
        sample.set_external_id(String::new());
        assert_eq!(sample.external_id(), None);

        assert!(sample.generate_external_id_if_absent());
        assert!(sample.external_id().is_some());
    }

    #[test]
    fn touch_keeps_first_created_at() {
        let mut sample = Sample::default();
        sample.touch_modified_at(100);
        sample.touch_modified_at(250);

        assert_eq!(sample.created_at(), Some(100));
        assert_eq!(sample.modified_at(), Some(250));
    }

    #[test]
    fn clock_is_after_epoch() {
        assert!(now_epoch_ms() > 0);
    }
}
