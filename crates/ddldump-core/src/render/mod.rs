//! Default statement renderer.
//!
//! Turns catalog records into DDL text in the shapes the source cluster's own
//! dump tooling produces. Every statement begins with a blank-line separator
//! so entries concatenate into a readable script; the session settings block
//! opens each section and carries none.

mod globals;
mod predata;

use crate::catalog::{CatalogObjectRecord, ObjectDetails};
use crate::error::{Error, Result};
use crate::graph::DefinitionForm;
use crate::output::{EntryKind, RenderedStatement, StatementRenderer};

/// Renders every supported kind as DDL for a given source version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DdlRenderer {
    major_version: Option<u32>,
}

impl DdlRenderer {
    /// Create a renderer for a source version tag such as `"5.28.0"`.
    ///
    /// A tag whose leading component is not a number is treated as the
    /// newest supported version.
    pub fn new(source_version: &str) -> Self {
        let major_version = source_version
            .trim()
            .split('.')
            .next()
            .and_then(|major| major.parse().ok());
        Self { major_version }
    }

    /// Parsed major version, if the tag had one.
    pub fn major_version(&self) -> Option<u32> {
        self.major_version
    }

    /// Whether the source predates the given major version.
    pub fn before(&self, major: u32) -> bool {
        self.major_version.is_some_and(|v| v < major)
    }

    fn statement(&self, record: &CatalogObjectRecord) -> Result<String> {
        let name = &record.name;
        let text = match &record.details {
            ObjectDetails::SessionGucs(settings) => globals::session_gucs(settings),
            ObjectDetails::Database { tablespace } => globals::create_database(name, tablespace),
            ObjectDetails::DatabaseGuc { settings } => globals::database_gucs(name, settings),
            ObjectDetails::ResourceQueue(queue) => globals::resource_queue(record, queue)?,
            ObjectDetails::ResourceGroup(group) => globals::resource_group(name, group),
            ObjectDetails::Role(role) => globals::create_role(name, role, !self.before(5)),
            ObjectDetails::RoleGrant { memberships } => globals::role_grants(name, memberships),
            ObjectDetails::Tablespace { filespace } => globals::create_tablespace(name, filespace),
            ObjectDetails::ShellType => predata::shell_type(record),
            ObjectDetails::BaseType(def) => predata::base_type(record, def),
            ObjectDetails::CompositeType(def) => predata::composite_type(record, def),
            ObjectDetails::DomainType(def) => predata::domain(record, def),
            ObjectDetails::EnumType { labels } => predata::enum_type(record, labels),
            ObjectDetails::Function(def) => predata::function(record, def),
            ObjectDetails::Index { definition } => format!("\n\n{definition};"),
        };
        Ok(text)
    }
}

impl StatementRenderer for DdlRenderer {
    fn render(&self, record: &CatalogObjectRecord, form: DefinitionForm) -> Result<RenderedStatement> {
        match form {
            DefinitionForm::Shell if record.kind().is_type() => {
                Ok(RenderedStatement::new(predata::shell_type(record)))
            }
            DefinitionForm::Shell => Err(Error::Render {
                schema: record.schema.clone(),
                name: record.name.clone(),
                reason: format!("{} has no shell form", record.kind()),
            }),
            DefinitionForm::Full => {
                let mut statement = RenderedStatement::new(self.statement(record)?);
                if let Some(text) = annotation(record) {
                    statement = statement.with_annotation(text);
                }
                if matches!(record.details, ObjectDetails::SessionGucs(_)) && self.before(5) {
                    statement = statement
                        .with_addendum(EntryKind::LegacySessionGucs, globals::LEGACY_SESSION_GUCS);
                }
                Ok(statement)
            }
        }
    }
}

/// Keyword naming the object in `COMMENT ON` and `ALTER ... OWNER TO`, and
/// whether it has an owner at all.
fn object_keyword(details: &ObjectDetails) -> Option<(&'static str, bool)> {
    match details {
        ObjectDetails::Database { .. } => Some(("DATABASE", true)),
        ObjectDetails::ResourceQueue(_) => Some(("RESOURCE QUEUE", false)),
        ObjectDetails::ResourceGroup(_) => Some(("RESOURCE GROUP", false)),
        ObjectDetails::Role(_) => Some(("ROLE", false)),
        ObjectDetails::Tablespace { .. } => Some(("TABLESPACE", true)),
        ObjectDetails::BaseType(_)
        | ObjectDetails::CompositeType(_)
        | ObjectDetails::EnumType { .. } => Some(("TYPE", true)),
        ObjectDetails::DomainType(_) => Some(("DOMAIN", true)),
        ObjectDetails::Function(_) => Some(("FUNCTION", true)),
        ObjectDetails::Index { .. } => Some(("INDEX", false)),
        ObjectDetails::SessionGucs(_)
        | ObjectDetails::DatabaseGuc { .. }
        | ObjectDetails::RoleGrant { .. }
        | ObjectDetails::ShellType => None,
    }
}

/// Comment and ownership statements that follow a full definition.
fn annotation(record: &CatalogObjectRecord) -> Option<String> {
    let (keyword, has_owner) = object_keyword(&record.details)?;
    let target = record.qualified_name();
    let mut text = String::new();
    if let Some(comment) = record.comment.as_deref().filter(|c| !c.is_empty()) {
        text.push_str(&format!(
            "\n\nCOMMENT ON {keyword} {target} IS {};",
            quote_literal(comment)
        ));
    }
    if has_owner {
        if let Some(owner) = record.owner.as_deref().filter(|o| !o.is_empty()) {
            text.push_str(&format!("\n\nALTER {keyword} {target} OWNER TO {owner};"));
        }
    }
    (!text.is_empty()).then_some(text)
}

/// Quote a string as an SQL literal.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
