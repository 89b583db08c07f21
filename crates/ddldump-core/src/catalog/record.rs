//! Catalog object records as produced by the catalog-query collaborator.

use serde::{Deserialize, Serialize};

use super::details::{ObjectDetails, TypeOrigin};
use crate::output::Section;

/// Opaque catalog identifier, stable and unique for one run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Oid(pub u32);

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a catalog object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    /// Session settings applied at the head of every section.
    SessionGucs,
    /// The database itself.
    Database,
    /// Per-database configuration settings.
    DatabaseGuc,
    /// A resource queue.
    ResourceQueue,
    /// A resource group.
    ResourceGroup,
    /// A role.
    Role,
    /// Role memberships granted to one member role.
    RoleGrant,
    /// A tablespace.
    Tablespace,
    /// A shell (forward-declared) type present in the catalog.
    ShellType,
    /// A base type with I/O functions.
    BaseType,
    /// A composite type.
    CompositeType,
    /// A domain over another type.
    DomainType,
    /// An enumerated type.
    EnumType,
    /// A function.
    Function,
    /// An index.
    Index,
}

impl ObjectKind {
    /// Whether this is a type kind that shell promotion can forward-declare.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            ObjectKind::ShellType
                | ObjectKind::BaseType
                | ObjectKind::CompositeType
                | ObjectKind::DomainType
                | ObjectKind::EnumType
        )
    }

    /// The section this kind is emitted into.
    ///
    /// `None` means the object belongs to every section (session settings).
    pub fn section(&self) -> Option<Section> {
        match self {
            ObjectKind::SessionGucs => None,
            ObjectKind::Database
            | ObjectKind::DatabaseGuc
            | ObjectKind::ResourceQueue
            | ObjectKind::ResourceGroup
            | ObjectKind::Role
            | ObjectKind::RoleGrant
            | ObjectKind::Tablespace => Some(Section::Global),
            ObjectKind::ShellType
            | ObjectKind::BaseType
            | ObjectKind::CompositeType
            | ObjectKind::DomainType
            | ObjectKind::EnumType
            | ObjectKind::Function => Some(Section::Predata),
            ObjectKind::Index => Some(Section::Postdata),
        }
    }

    /// Whether objects of this kind are emitted into the given section.
    pub fn belongs_to(&self, section: Section) -> bool {
        self.section().map_or(true, |own| own == section)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::SessionGucs => "session gucs",
            ObjectKind::Database => "database",
            ObjectKind::DatabaseGuc => "database guc",
            ObjectKind::ResourceQueue => "resource queue",
            ObjectKind::ResourceGroup => "resource group",
            ObjectKind::Role => "role",
            ObjectKind::RoleGrant => "role grant",
            ObjectKind::Tablespace => "tablespace",
            ObjectKind::ShellType => "shell type",
            ObjectKind::BaseType => "base type",
            ObjectKind::CompositeType => "composite type",
            ObjectKind::DomainType => "domain type",
            ObjectKind::EnumType => "enum type",
            ObjectKind::Function => "function",
            ObjectKind::Index => "index",
        };
        f.write_str(name)
    }
}

/// One catalog object, read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogObjectRecord {
    /// Catalog identifier.
    pub oid: Oid,
    /// Escaped schema name; empty for global objects.
    #[serde(default)]
    pub schema: String,
    /// Escaped object name.
    pub name: String,
    /// Kind-specific definition.
    #[serde(flatten)]
    pub details: ObjectDetails,
    /// Qualified names this object's definition requires to exist first.
    #[serde(default)]
    pub depends_upon: Vec<String>,
    /// Owning role, if ownership should be restored.
    #[serde(default)]
    pub owner: Option<String>,
    /// Object comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl CatalogObjectRecord {
    /// Create a record with no dependencies or annotations.
    pub fn new(
        oid: u32,
        schema: impl Into<String>,
        name: impl Into<String>,
        details: ObjectDetails,
    ) -> Self {
        Self {
            oid: Oid(oid),
            schema: schema.into(),
            name: name.into(),
            details,
            depends_upon: Vec::new(),
            owner: None,
            comment: None,
        }
    }

    /// Set the dependency list.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_upon = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the owning role.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The object kind.
    pub fn kind(&self) -> ObjectKind {
        self.details.kind()
    }

    /// The type origin; non-type records are always explicit.
    pub fn origin(&self) -> &TypeOrigin {
        self.details.origin()
    }

    /// The name other records use to reference this one.
    ///
    /// `name` for global objects, `schema.name` otherwise, and
    /// `schema.name(arguments)` for functions.
    pub fn qualified_name(&self) -> String {
        let base = if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        };
        match &self.details {
            ObjectDetails::Function(func) => format!("{}({})", base, func.arguments),
            _ => base,
        }
    }

    /// Human-readable label used in diagnostics.
    pub fn label(&self) -> String {
        format!("{} ({}, {})", self.qualified_name(), self.kind(), self.oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::details::FunctionDefinition;

    #[test]
    fn test_qualified_name_forms() {
        let role = CatalogObjectRecord::new(1, "", "admin", ObjectDetails::Role(Default::default()));
        assert_eq!(role.qualified_name(), "admin");

        let shell = CatalogObjectRecord::new(2, "public", "money2", ObjectDetails::ShellType);
        assert_eq!(shell.qualified_name(), "public.money2");

        let func = CatalogObjectRecord::new(
            3,
            "public",
            "money2_in",
            ObjectDetails::Function(FunctionDefinition {
                arguments: "cstring".to_string(),
                ..Default::default()
            }),
        );
        assert_eq!(func.qualified_name(), "public.money2_in(cstring)");
    }

    #[test]
    fn test_kind_sections() {
        assert_eq!(ObjectKind::Role.section(), Some(Section::Global));
        assert_eq!(ObjectKind::EnumType.section(), Some(Section::Predata));
        assert_eq!(ObjectKind::Index.section(), Some(Section::Postdata));
        assert!(ObjectKind::SessionGucs.belongs_to(Section::Global));
        assert!(ObjectKind::SessionGucs.belongs_to(Section::Postdata));
        assert!(!ObjectKind::Function.belongs_to(Section::Global));
    }

    #[test]
    fn test_type_kinds() {
        assert!(ObjectKind::DomainType.is_type());
        assert!(ObjectKind::ShellType.is_type());
        assert!(!ObjectKind::Function.is_type());
        assert!(!ObjectKind::Role.is_type());
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{
            "oid": 16384,
            "schema": "public",
            "name": "mood",
            "kind": "enum-type",
            "labels": ["'sad'", "'happy'"],
            "owner": "gpadmin"
        }"#;
        let record: CatalogObjectRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.oid, Oid(16384));
        assert_eq!(record.kind(), ObjectKind::EnumType);
        assert!(record.depends_upon.is_empty());
        assert_eq!(record.owner.as_deref(), Some("gpadmin"));
    }
}
