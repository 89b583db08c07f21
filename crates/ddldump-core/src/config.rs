//! Dump configuration.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::output::Section;

/// Default table-of-contents file name.
pub const DEFAULT_TOC_FILE: &str = "toc.json";

/// Default file name of a section stream.
pub fn default_section_file(section: Section) -> String {
    format!("{}.sql", section.as_str())
}

/// Where one run writes its section streams and table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Output file for each section.
    pub destinations: BTreeMap<Section, PathBuf>,

    /// Path of the persisted table of contents.
    pub toc_path: PathBuf,

    /// Emit sections on concurrent workers.
    #[serde(default = "default_parallel_sections")]
    pub parallel_sections: bool,
}

fn default_parallel_sections() -> bool {
    true
}

impl DumpConfig {
    /// Create a configuration writing every artifact under `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let destinations = Section::ALL
            .into_iter()
            .map(|section| (section, dir.join(default_section_file(section))))
            .collect();
        Self {
            destinations,
            toc_path: dir.join(DEFAULT_TOC_FILE),
            parallel_sections: default_parallel_sections(),
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the destination of one section.
    pub fn with_destination(mut self, section: Section, path: impl Into<PathBuf>) -> Self {
        self.destinations.insert(section, path.into());
        self
    }

    /// Set the table-of-contents path.
    pub fn with_toc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.toc_path = path.into();
        self
    }

    /// Emit sections one after another on the calling thread.
    pub fn serial(mut self) -> Self {
        self.parallel_sections = false;
        self
    }

    /// Destination of a section.
    pub fn destination(&self, section: Section) -> Result<&Path> {
        self.destinations
            .get(&section)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::Config(format!("no destination for section {section}")))
    }

    /// Check that every section has its own destination, distinct from the
    /// table of contents.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        seen.insert(self.toc_path.as_path());
        for section in Section::ALL {
            let path = self.destination(section)?;
            if !seen.insert(path) {
                return Err(Error::Config(format!(
                    "section {section} shares its destination {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}
