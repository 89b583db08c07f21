//! Output sections and table-of-contents entry tags.

use serde::{Deserialize, Serialize};

use crate::catalog::ObjectKind;
use crate::graph::DefinitionForm;

/// An independent output stream of a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Cluster-wide objects restored before anything else.
    Global,
    /// Schema objects restored before table data.
    Predata,
    /// Objects restored after table data.
    Postdata,
}

impl Section {
    /// Every section in restore order.
    pub const ALL: [Section; 3] = [Section::Global, Section::Predata, Section::Postdata];

    /// Lowercase tag used in file names and the persisted index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Global => "global",
            Section::Predata => "predata",
            Section::Postdata => "postdata",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Section::Global),
            "predata" => Ok(Section::Predata),
            "postdata" => Ok(Section::Postdata),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// Tag recorded with every table-of-contents entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    SessionGucs,
    LegacySessionGucs,
    Database,
    DatabaseGuc,
    ResourceQueue,
    ResourceGroup,
    Role,
    RoleGrant,
    Tablespace,
    PredataShellType,
    PredataType,
    PredataFunction,
    PostdataIndex,
}

impl EntryKind {
    /// The tag for one emission step.
    pub fn for_step(kind: ObjectKind, form: DefinitionForm) -> Self {
        match kind {
            ObjectKind::SessionGucs => EntryKind::SessionGucs,
            ObjectKind::Database => EntryKind::Database,
            ObjectKind::DatabaseGuc => EntryKind::DatabaseGuc,
            ObjectKind::ResourceQueue => EntryKind::ResourceQueue,
            ObjectKind::ResourceGroup => EntryKind::ResourceGroup,
            ObjectKind::Role => EntryKind::Role,
            ObjectKind::RoleGrant => EntryKind::RoleGrant,
            ObjectKind::Tablespace => EntryKind::Tablespace,
            ObjectKind::ShellType => EntryKind::PredataShellType,
            ObjectKind::BaseType
            | ObjectKind::CompositeType
            | ObjectKind::DomainType
            | ObjectKind::EnumType => match form {
                DefinitionForm::Shell => EntryKind::PredataShellType,
                DefinitionForm::Full => EntryKind::PredataType,
            },
            ObjectKind::Function => EntryKind::PredataFunction,
            ObjectKind::Index => EntryKind::PostdataIndex,
        }
    }

    /// Kebab-case tag as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::SessionGucs => "session-gucs",
            EntryKind::LegacySessionGucs => "legacy-session-gucs",
            EntryKind::Database => "database",
            EntryKind::DatabaseGuc => "database-guc",
            EntryKind::ResourceQueue => "resource-queue",
            EntryKind::ResourceGroup => "resource-group",
            EntryKind::Role => "role",
            EntryKind::RoleGrant => "role-grant",
            EntryKind::Tablespace => "tablespace",
            EntryKind::PredataShellType => "predata-shell-type",
            EntryKind::PredataType => "predata-type",
            EntryKind::PredataFunction => "predata-function",
            EntryKind::PostdataIndex => "postdata-index",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown entry kind: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_round_trips_through_str() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>().unwrap(), section);
        }
        assert!("data".parse::<Section>().is_err());
    }

    #[test]
    fn test_entry_kind_tags() {
        assert_eq!(
            EntryKind::for_step(ObjectKind::BaseType, DefinitionForm::Shell),
            EntryKind::PredataShellType
        );
        assert_eq!(
            EntryKind::for_step(ObjectKind::EnumType, DefinitionForm::Full),
            EntryKind::PredataType
        );
        assert_eq!(
            serde_json::to_string(&EntryKind::DatabaseGuc).unwrap(),
            "\"database-guc\""
        );
        assert_eq!(
            "predata-shell-type".parse::<EntryKind>().unwrap(),
            EntryKind::PredataShellType
        );
    }
}
