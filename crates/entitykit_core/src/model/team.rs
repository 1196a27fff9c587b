//! Team entity and its membership link.
//!
//! # Invariants
//! - `TeamMember` references both sides by positive primary keys.
//! - Removing a `TeamMember` never touches the referenced team or person.

use crate::model::entity::{EntityId, EntityMeta, PersistedEntity, ValidationError};
use crate::model::link::LinkEntity;
use serde::{Deserialize, Serialize};

/// A named group of people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
}

impl Team {
    /// Creates an unsaved team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::default(),
            name: name.into(),
        }
    }
}

impl PersistedEntity for Team {
    const ENTITY_NAME: &'static str = "team";

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

/// Membership of one person in one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub team_id: EntityId,
    pub person_id: EntityId,
}

impl PersistedEntity for TeamMember {
    const ENTITY_NAME: &'static str = "team_member";

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("team_id", self.team_id), ("person_id", self.person_id)] {
            if value <= 0 {
                return Err(ValidationError::InvalidReference {
                    entity: Self::ENTITY_NAME,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl LinkEntity for TeamMember {
    fn link(group_id: EntityId, member_id: EntityId) -> Self {
        Self {
            meta: EntityMeta::default(),
            team_id: group_id,
            person_id: member_id,
        }
    }

    fn group_id(&self) -> EntityId {
        self.team_id
    }

    fn member_id(&self) -> EntityId {
        self.person_id
    }
}
