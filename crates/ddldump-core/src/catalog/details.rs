//! Kind-specific definitions carried by catalog records.

use serde::{Deserialize, Serialize};

use super::record::ObjectKind;

/// How a type came to exist in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeOrigin {
    /// Created by a user statement.
    #[default]
    Explicit,
    /// Array counterpart generated alongside the named element type.
    ArrayOf {
        /// Qualified name of the element type.
        element: String,
    },
    /// Row type (or its array) generated alongside the named table.
    TableRow {
        /// Qualified name of the table.
        table: String,
    },
}

impl TypeOrigin {
    /// Whether the type was generated implicitly by the catalog.
    pub fn is_implicit(&self) -> bool {
        !matches!(self, TypeOrigin::Explicit)
    }
}

/// Session settings that make the section replayable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Client encoding of the source database.
    pub client_encoding: String,
    /// Value of `default_with_oids` on the source.
    pub default_with_oids: bool,
}

/// Settings of a resource queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceQueueDefinition {
    /// Maximum active statements; -1 means unlimited.
    pub active_statements: i64,
    /// Maximum cost as reported by the catalog; -1 means unlimited.
    pub max_cost: String,
    /// Whether cost may be overcommitted.
    pub cost_overcommit: bool,
    /// Minimum cost as reported by the catalog.
    pub min_cost: String,
    /// Scheduling priority.
    pub priority: String,
    /// Memory limit; "-1" means unlimited.
    pub memory_limit: String,
}

impl Default for ResourceQueueDefinition {
    fn default() -> Self {
        Self {
            active_statements: -1,
            max_cost: "-1".to_string(),
            cost_overcommit: false,
            min_cost: "0".to_string(),
            priority: "medium".to_string(),
            memory_limit: "-1".to_string(),
        }
    }
}

/// Settings of a resource group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceGroupDefinition {
    pub cpu_rate_limit: i64,
    pub memory_limit: i64,
    pub memory_shared_quota: i64,
    pub memory_spill_ratio: i64,
    pub concurrency: i64,
}

/// A window during which a role may not log in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConstraint {
    pub start_day: i32,
    pub start_time: String,
    pub end_day: i32,
    pub end_time: String,
}

/// Attributes of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleDefinition {
    pub superuser: bool,
    pub inherit: bool,
    pub create_role: bool,
    pub create_db: bool,
    pub can_login: bool,
    /// Connection limit; -1 means unlimited.
    pub connection_limit: i64,
    /// Encrypted password, empty when unset.
    pub password: String,
    /// Expiry timestamp, empty when unset.
    pub valid_until: String,
    pub resource_queue: String,
    pub resource_group: String,
    pub create_readable_http: bool,
    pub create_readable_gpfdist: bool,
    pub create_writable_gpfdist: bool,
    pub create_readable_hdfs: bool,
    pub create_writable_hdfs: bool,
    pub time_constraints: Vec<TimeConstraint>,
}

impl Default for RoleDefinition {
    fn default() -> Self {
        Self {
            superuser: false,
            inherit: true,
            create_role: false,
            create_db: false,
            can_login: false,
            connection_limit: -1,
            password: String::new(),
            valid_until: String::new(),
            resource_queue: "pg_default".to_string(),
            resource_group: String::new(),
            create_readable_http: false,
            create_readable_gpfdist: false,
            create_writable_gpfdist: false,
            create_readable_hdfs: false,
            create_writable_hdfs: false,
            time_constraints: Vec::new(),
        }
    }
}

/// One granted role membership; the member is the record name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMembership {
    /// The granted role.
    pub role: String,
    /// Role that performed the grant.
    pub grantor: String,
    /// Whether the member may grant the role onward.
    pub admin_option: bool,
}

/// Definition of a base type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseTypeDefinition {
    pub input: String,
    pub output: String,
    pub receive: String,
    pub send: String,
    pub modifier_input: String,
    pub modifier_output: String,
    /// Internal length in bytes; -1 means variable.
    pub internal_length: i32,
    pub passed_by_value: bool,
    pub alignment: String,
    pub storage: String,
    pub default_value: String,
    /// Element type for fixed-length array-like base types.
    pub element: String,
    pub delimiter: String,
    pub origin: TypeOrigin,
}

impl Default for BaseTypeDefinition {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            receive: String::new(),
            send: String::new(),
            modifier_input: String::new(),
            modifier_output: String::new(),
            internal_length: -1,
            passed_by_value: false,
            alignment: String::new(),
            storage: String::new(),
            default_value: String::new(),
            element: String::new(),
            delimiter: ",".to_string(),
            origin: TypeOrigin::Explicit,
        }
    }
}

/// Definition of a composite type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeTypeDefinition {
    /// Attribute lines, each `name type`.
    pub attributes: Vec<String>,
    pub origin: TypeOrigin,
}

/// Definition of a domain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainDefinition {
    pub base_type: String,
    pub default_value: String,
    pub not_null: bool,
    /// Check constraints, each a full `CONSTRAINT ... CHECK (...)` clause.
    pub constraints: Vec<String>,
}

/// Definition of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionDefinition {
    /// Argument list as printed by the catalog.
    pub arguments: String,
    pub result_type: String,
    pub language: String,
    pub body: String,
}

/// Kind-specific part of a catalog record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ObjectDetails {
    SessionGucs(SessionSettings),
    Database {
        #[serde(default = "default_tablespace")]
        tablespace: String,
    },
    /// Per-database settings; one table-of-contents entry covers every
    /// `ALTER DATABASE` line.
    DatabaseGuc {
        /// Each entry is a `SET name TO value` clause.
        #[serde(default)]
        settings: Vec<String>,
    },
    ResourceQueue(ResourceQueueDefinition),
    /// A built-in group renders one `ALTER` per setting, all under one entry.
    ResourceGroup(ResourceGroupDefinition),
    Role(RoleDefinition),
    RoleGrant {
        #[serde(default)]
        memberships: Vec<RoleMembership>,
    },
    Tablespace {
        filespace: String,
    },
    ShellType,
    BaseType(BaseTypeDefinition),
    CompositeType(CompositeTypeDefinition),
    DomainType(DomainDefinition),
    EnumType {
        /// Quoted labels in sort order.
        #[serde(default)]
        labels: Vec<String>,
    },
    Function(FunctionDefinition),
    Index {
        /// Full index definition statement without trailing semicolon.
        definition: String,
    },
}

fn default_tablespace() -> String {
    "pg_default".to_string()
}

static EXPLICIT: TypeOrigin = TypeOrigin::Explicit;

impl ObjectDetails {
    /// The kind this definition describes.
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectDetails::SessionGucs(_) => ObjectKind::SessionGucs,
            ObjectDetails::Database { .. } => ObjectKind::Database,
            ObjectDetails::DatabaseGuc { .. } => ObjectKind::DatabaseGuc,
            ObjectDetails::ResourceQueue(_) => ObjectKind::ResourceQueue,
            ObjectDetails::ResourceGroup(_) => ObjectKind::ResourceGroup,
            ObjectDetails::Role(_) => ObjectKind::Role,
            ObjectDetails::RoleGrant { .. } => ObjectKind::RoleGrant,
            ObjectDetails::Tablespace { .. } => ObjectKind::Tablespace,
            ObjectDetails::ShellType => ObjectKind::ShellType,
            ObjectDetails::BaseType(_) => ObjectKind::BaseType,
            ObjectDetails::CompositeType(_) => ObjectKind::CompositeType,
            ObjectDetails::DomainType(_) => ObjectKind::DomainType,
            ObjectDetails::EnumType { .. } => ObjectKind::EnumType,
            ObjectDetails::Function(_) => ObjectKind::Function,
            ObjectDetails::Index { .. } => ObjectKind::Index,
        }
    }

    /// The type origin; only base and composite types can be implicit.
    pub fn origin(&self) -> &TypeOrigin {
        match self {
            ObjectDetails::BaseType(def) => &def.origin,
            ObjectDetails::CompositeType(def) => &def.origin,
            _ => &EXPLICIT,
        }
    }

    /// An explicit base type with default attributes.
    pub fn base_type() -> Self {
        ObjectDetails::BaseType(BaseTypeDefinition::default())
    }

    /// An explicit composite type with the given attribute lines.
    pub fn composite_type<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ObjectDetails::CompositeType(CompositeTypeDefinition {
            attributes: attributes.into_iter().map(Into::into).collect(),
            origin: TypeOrigin::Explicit,
        })
    }

    /// A function with the given argument list.
    pub fn function(arguments: impl Into<String>) -> Self {
        ObjectDetails::Function(FunctionDefinition {
            arguments: arguments.into(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_defaults_to_explicit() {
        let details: ObjectDetails =
            serde_json::from_str(r#"{"kind": "composite-type", "attributes": ["\tx int4"]}"#)
                .unwrap();
        assert_eq!(details.kind(), ObjectKind::CompositeType);
        assert!(!details.origin().is_implicit());
    }

    #[test]
    fn test_array_origin_parses() {
        let details: ObjectDetails = serde_json::from_str(
            r#"{"kind": "base-type", "origin": {"array-of": {"element": "public.money2"}}}"#,
        )
        .unwrap();
        assert_eq!(
            details.origin(),
            &TypeOrigin::ArrayOf {
                element: "public.money2".to_string()
            }
        );
    }

    #[test]
    fn test_non_type_details_are_explicit() {
        let details = ObjectDetails::Tablespace {
            filespace: "fs".to_string(),
        };
        assert!(!details.origin().is_implicit());
        assert_eq!(details.kind(), ObjectKind::Tablespace);
    }

    #[test]
    fn test_database_default_tablespace() {
        let details: ObjectDetails = serde_json::from_str(r#"{"kind": "database"}"#).unwrap();
        assert_eq!(
            details,
            ObjectDetails::Database {
                tablespace: "pg_default".to_string()
            }
        );
    }
}
