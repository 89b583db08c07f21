//! Catalog object records consumed by the dump pipeline.
//!
//! Records are produced once per run by the catalog-query collaborator and are
//! read-only thereafter.

pub mod details;
pub mod record;
pub mod snapshot;

pub use details::{
    BaseTypeDefinition, CompositeTypeDefinition, DomainDefinition, FunctionDefinition,
    ObjectDetails, ResourceGroupDefinition, ResourceQueueDefinition, RoleDefinition,
    RoleMembership, SessionSettings, TimeConstraint, TypeOrigin,
};
pub use record::{CatalogObjectRecord, ObjectKind, Oid};
pub use snapshot::CatalogSnapshot;
