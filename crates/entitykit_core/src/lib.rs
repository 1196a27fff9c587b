//! Generic entity persistence core.
//!
//! Entities implement [`PersistedEntity`]; services built over a
//! [`Repository`] stamp identity and timestamps through the [`Stamped`]
//! decorator before every write.

pub mod config;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DatabaseLocation, StoreConfig};
pub use lifecycle::{checked_stamps, ensure_stamped, stamp, LifecycleError, Stamped, Stamps};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::entity::{
    now_epoch_ms, EntityId, EntityMeta, EpochMs, PersistedEntity, ValidationError,
};
pub use model::link::LinkEntity;
pub use model::person::Person;
pub use model::team::{Team, TeamMember};
pub use repo::sqlite_repo::{SqliteEntity, SqliteLinkEntity, SqliteRepository};
pub use repo::{LinkRepository, RepoError, RepoResult, Repository};
pub use service::association_service::{AssociationService, LinkService};
pub use service::crud_service::{CrudService, EntityService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
