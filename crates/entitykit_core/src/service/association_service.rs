//! Association (link entity) use-case service.
//!
//! # Responsibility
//! - Create, list and remove links between a group entity and a member
//!   entity, e.g. team membership.
//!
//! # Invariants
//! - Both sides must be persisted before a link can reference them.
//! - Links are stamped like any other entity.
//! - Removing a link never deletes the group or the member.
//! - Duplicate (group, member) pairs are allowed unless storage forbids them.
//! - Listed links always point at the requested group.

use crate::lifecycle::Stamped;
use crate::model::entity::PersistedEntity;
use crate::model::link::LinkEntity;
use crate::repo::{LinkRepository, RepoError, RepoResult, Repository};
use log::debug;
use std::marker::PhantomData;

/// Contract for managing group/member link entities.
pub trait AssociationService<G, M, L>
where
    G: PersistedEntity,
    M: PersistedEntity,
    L: PersistedEntity,
{
    /// Links `member` into `group` and returns the stored link.
    fn create_association(&self, group: &G, member: &M) -> RepoResult<L>;
    /// Lists every link referencing `group`.
    fn list_association(&self, group: &G) -> RepoResult<Vec<L>>;
    /// Deletes `link` only.
    fn remove_association(&self, link: &L) -> RepoResult<()>;
}

/// Generic [`AssociationService`] over a link repository.
pub struct LinkService<G, M, L, R> {
    links: Stamped<R>,
    _sides: PhantomData<fn() -> (G, M, L)>,
}

impl<G, M, L, R> LinkService<G, M, L, R>
where
    G: PersistedEntity,
    M: PersistedEntity,
    L: LinkEntity,
    R: LinkRepository<L>,
{
    pub fn new(links: R) -> Self {
        Self {
            links: Stamped::new(links),
            _sides: PhantomData,
        }
    }
}

impl<G, M, L, R> AssociationService<G, M, L> for LinkService<G, M, L, R>
where
    G: PersistedEntity,
    M: PersistedEntity,
    L: LinkEntity,
    R: LinkRepository<L>,
{
    fn create_association(&self, group: &G, member: &M) -> RepoResult<L> {
        let group_id = group.id().ok_or(RepoError::NotPersisted(G::ENTITY_NAME))?;
        let member_id = member.id().ok_or(RepoError::NotPersisted(M::ENTITY_NAME))?;

        let link = self.links.save(L::link(group_id, member_id))?;
        debug!(
            "event=association_create module=service status=ok link={} group_id={} member_id={}",
            L::ENTITY_NAME,
            group_id,
            member_id
        );
        Ok(link)
    }

    fn list_association(&self, group: &G) -> RepoResult<Vec<L>> {
        match group.id() {
            Some(group_id) => {
                let links = self.links.find_by_group(group_id)?;
                if let Some(stray) = links.iter().find(|link| link.group_id() != group_id) {
                    return Err(RepoError::InvalidData(format!(
                        "{} lookup for group {group_id} returned a link to group {}",
                        L::ENTITY_NAME,
                        stray.group_id()
                    )));
                }
                Ok(links)
            }
            // Unsaved groups cannot be referenced by any stored link.
            None => Ok(Vec::new()),
        }
    }

    fn remove_association(&self, link: &L) -> RepoResult<()> {
        self.links.delete(link)
    }
}
