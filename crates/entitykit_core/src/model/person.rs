//! Person entity.

use crate::model::entity::{EntityMeta, PersistedEntity, ValidationError};
use serde::{Deserialize, Serialize};

/// A named person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
}

impl Person {
    /// Creates an unsaved person.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::default(),
            name: name.into(),
        }
    }
}

impl PersistedEntity for Person {
    const ENTITY_NAME: &'static str = "person";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField {
                entity: Self::ENTITY_NAME,
                field: "name",
            });
        }
        Ok(())
    }
}
