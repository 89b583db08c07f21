//! Static emission ranking for object kinds.
//!
//! Global objects follow fixed cross-kind ordering rules of the target engine
//! (resource queues before the roles assigned to them, roles before grants)
//! rather than edges in the dependency graph. The sequencer consults this
//! ranking first whenever several objects are ready at once.

use crate::catalog::ObjectKind;

/// Rank of an object kind in emission order; lower ranks go first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityClass {
    /// Session settings.
    SessionSettings,
    /// The database.
    Database,
    /// Database-level settings.
    DatabaseSettings,
    /// Resource queues.
    ResourceQueues,
    /// Resource groups.
    ResourceGroups,
    /// Roles.
    Roles,
    /// Role memberships.
    RoleGrants,
    /// Tablespaces.
    Tablespaces,
    /// Schema objects ordered purely by dependencies: types and functions.
    Definitions,
    /// Objects that need the definitions in place: indexes.
    PostDefinitions,
}

impl PriorityClass {
    /// The class of an object kind.
    pub fn of(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::SessionGucs => PriorityClass::SessionSettings,
            ObjectKind::Database => PriorityClass::Database,
            ObjectKind::DatabaseGuc => PriorityClass::DatabaseSettings,
            ObjectKind::ResourceQueue => PriorityClass::ResourceQueues,
            ObjectKind::ResourceGroup => PriorityClass::ResourceGroups,
            ObjectKind::Role => PriorityClass::Roles,
            ObjectKind::RoleGrant => PriorityClass::RoleGrants,
            ObjectKind::Tablespace => PriorityClass::Tablespaces,
            ObjectKind::ShellType
            | ObjectKind::BaseType
            | ObjectKind::CompositeType
            | ObjectKind::DomainType
            | ObjectKind::EnumType
            | ObjectKind::Function => PriorityClass::Definitions,
            ObjectKind::Index => PriorityClass::PostDefinitions,
        }
    }
}
