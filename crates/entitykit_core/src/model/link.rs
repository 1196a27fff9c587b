//! Link entity contract for many-to-many associations.

use crate::model::entity::{EntityId, PersistedEntity};

/// Entity associating one group entity with one member entity.
///
/// Links reference both sides by primary key and carry no lifecycle rules
/// beyond the ones every `PersistedEntity` follows.
pub trait LinkEntity: PersistedEntity {
    /// Builds an unsaved link between two persisted ids.
    fn link(group_id: EntityId, member_id: EntityId) -> Self;
    fn group_id(&self) -> EntityId;
    fn member_id(&self) -> EntityId;
}
