//! Entity contract and reference entities.
//!
//! # Responsibility
//! - Define the `PersistedEntity` capability set and its metadata record.
//! - Provide concrete entities backing the reference schema.
//!
//! # Invariants
//! - Every entity exposes exactly one `EntityMeta`.
//! - Identity fields are never populated by constructors.

pub mod entity;
pub mod link;
pub mod person;
pub mod team;
