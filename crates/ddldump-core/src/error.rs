//! Core error types.

use crate::catalog::{ObjectKind, Oid};
use crate::output::Section;
use thiserror::Error;

/// Errors raised while resolving, sequencing or emitting a metadata dump.
#[derive(Debug, Error)]
pub enum Error {
    /// A dependency name matched more than one object in the backup set.
    #[error("ambiguous dependency {name:?}: matches objects {oids:?}")]
    AmbiguousDependency {
        /// The qualified name as it appeared in the dependency list.
        name: String,
        /// Oids of every colliding object, ascending.
        oids: Vec<Oid>,
    },

    /// Two records share the same graph node key.
    #[error("duplicate {kind} {schema}.{name}: oids {oids:?}")]
    DuplicateObject {
        /// Schema of the colliding records.
        schema: String,
        /// Name of the colliding records.
        name: String,
        /// Kind of the colliding records.
        kind: ObjectKind,
        /// Oids of the colliding records.
        oids: Vec<Oid>,
    },

    /// A dependency cycle that shell promotion cannot break.
    #[error("unbreakable dependency cycle among: {}", members.join(", "))]
    UnbreakableCycle {
        /// Every member of the cycle, as `schema.name (kind, oid)`.
        members: Vec<String>,
    },

    /// I/O failure while writing a section stream.
    #[error("write to {section} section failed: {source}")]
    WriteFault {
        /// The section whose stream failed.
        section: Section,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The renderer could not produce statement text for a record.
    #[error("cannot render {schema}.{name}: {reason}")]
    Render {
        /// Schema of the record.
        schema: String,
        /// Name of the record.
        name: String,
        /// Why rendering failed.
        reason: String,
    },

    /// A section with entries was never sealed.
    #[error("section {section} has entries but was not sealed")]
    IncompleteSection {
        /// The unsealed section.
        section: Section,
    },

    /// Malformed or inconsistent table of contents.
    #[error("table of contents error: {0}")]
    Toc(String),

    /// Invalid dump configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error outside a section stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_dependency_display() {
        let err = Error::AmbiguousDependency {
            name: "public.money".to_string(),
            oids: vec![Oid(10), Oid(12)],
        };
        let msg = err.to_string();
        assert!(msg.contains("public.money"));
        assert!(msg.contains("10"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_unbreakable_cycle_lists_members() {
        let err = Error::UnbreakableCycle {
            members: vec!["a (role, 1)".to_string(), "b (role, 2)".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unbreakable dependency cycle among: a (role, 1), b (role, 2)"
        );
    }

    #[test]
    fn test_write_fault_display() {
        let err = Error::WriteFault {
            section: Section::Predata,
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(err.to_string(), "write to predata section failed: disk full");
    }
}
