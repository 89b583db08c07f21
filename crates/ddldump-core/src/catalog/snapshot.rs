//! The input envelope handed over by the catalog-query collaborator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::record::CatalogObjectRecord;
use crate::error::Result;

/// Every catalog record for one run plus the source version tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Version of the source cluster, e.g. `"5.28.0"`. Only rendering looks at it.
    #[serde(default)]
    pub source_version: String,
    /// The records, in no particular order.
    #[serde(default)]
    pub records: Vec<CatalogObjectRecord>,
}

impl CatalogSnapshot {
    /// Create a snapshot from a record set.
    pub fn new(source_version: impl Into<String>, records: Vec<CatalogObjectRecord>) -> Self {
        Self {
            source_version: source_version.into(),
            records,
        }
    }

    /// Load a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let snapshot = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(snapshot)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ObjectKind;
    use std::io::Write;

    #[test]
    fn test_load_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "source_version": "5.28.0",
                "records": [
                    {{"oid": 1, "name": "gpadmin", "kind": "role", "superuser": true}},
                    {{"oid": 2, "schema": "public", "name": "t", "kind": "shell-type"}}
                ]
            }}"#
        )
        .unwrap();

        let snapshot = CatalogSnapshot::from_json_file(file.path()).unwrap();
        assert_eq!(snapshot.source_version, "5.28.0");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records[0].kind(), ObjectKind::Role);
        assert_eq!(snapshot.records[1].kind(), ObjectKind::ShellType);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CatalogSnapshot::from_json_file("/nonexistent/snapshot.json").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
