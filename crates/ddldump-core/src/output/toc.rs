//! Table of contents: the byte index of every emitted object.
//!
//! Each entry records where one object's statement text lives inside its
//! section stream, so restore tooling can seek straight to any object without
//! scanning those before it.
//!
//! ## Persisted format
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "sections": {
//!     "global":  { "seal": { "length": .., "digest": ".." }, "entries": [ .. ] },
//!     "predata": { .. }
//!   }
//! }
//! ```
//!
//! Sections appear in restore order and entries in emission order, so the
//! same run always serializes to the same bytes.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use super::section::{EntryKind, Section};
use super::writer::{stream_digest, SectionSummary};
use crate::error::{Error, Result};

/// Current persisted format version.
pub const TOC_FORMAT_VERSION: u32 = 1;

/// Location of one object's text within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Section stream holding the text.
    pub section: Section,
    /// Escaped schema name; empty for global objects.
    pub schema: String,
    /// Escaped object name.
    pub name: String,
    /// Entry tag.
    pub kind: EntryKind,
    /// First byte, relative to the section start.
    pub start: u64,
    /// One past the last byte.
    pub end: u64,
}

impl TocEntry {
    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the object was considered but produced no text.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Default)]
struct SectionIndex {
    entries: Vec<TocEntry>,
    by_name: HashMap<(String, String), Vec<usize>>,
    seal: Option<SectionSummary>,
}

impl SectionIndex {
    fn push(&mut self, entry: TocEntry) {
        let position = self.entries.len();
        self.by_name
            .entry((entry.schema.clone(), entry.name.clone()))
            .or_default()
            .push(position);
        self.entries.push(entry);
    }

    fn lookup(&self, schema: &str, name: &str) -> Vec<TocEntry> {
        // Tuple keys of owned strings cannot borrow as (&str, &str).
        self.by_name
            .get(&(schema.to_string(), name.to_string()))
            .map(|positions| positions.iter().map(|&p| self.entries[p].clone()).collect())
            .unwrap_or_default()
    }

    fn last_end(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.end)
    }
}

/// Shared, thread-safe index of emitted objects for one run.
///
/// Concurrent [`add_entry`] calls from different section workers are
/// serialized; each section keeps its own entries in call order.
///
/// [`add_entry`]: TableOfContents::add_entry
#[derive(Debug, Default)]
pub struct TableOfContents {
    sections: Mutex<BTreeMap<Section, SectionIndex>>,
}

impl TableOfContents {
    /// Create an empty table of contents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one emitted object.
    ///
    /// Ranges within a section must not run backwards or overlap, and a sealed
    /// section accepts no further entries.
    pub fn add_entry(
        &self,
        section: Section,
        schema: &str,
        name: &str,
        kind: EntryKind,
        start: u64,
        end: u64,
    ) -> Result<()> {
        if start > end {
            return Err(Error::Toc(format!(
                "{section} entry {schema}.{name} ends before it starts ({start} > {end})"
            )));
        }

        let mut sections = self.sections.lock();
        let index = sections.entry(section).or_default();
        if index.seal.is_some() {
            return Err(Error::Toc(format!(
                "section {section} is sealed; cannot add {schema}.{name}"
            )));
        }
        if start < index.last_end() {
            return Err(Error::Toc(format!(
                "{section} entry {schema}.{name} starts at {start}, before previous end {}",
                index.last_end()
            )));
        }

        index.push(TocEntry {
            section,
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            start,
            end,
        });
        Ok(())
    }

    /// Mark a section as complete with its final length and digest.
    pub fn seal_section(&self, summary: SectionSummary) -> Result<()> {
        let mut sections = self.sections.lock();
        let index = sections.entry(summary.section).or_default();
        if index.seal.is_some() {
            return Err(Error::Toc(format!(
                "section {} sealed twice",
                summary.section
            )));
        }
        if index.last_end() > summary.length {
            return Err(Error::Toc(format!(
                "section {} entries extend to {} but the stream has {} bytes",
                summary.section,
                index.last_end(),
                summary.length
            )));
        }
        index.seal = Some(summary);
        Ok(())
    }

    /// All entries for (section, schema, name), in emission order.
    pub fn lookup(&self, section: Section, schema: &str, name: &str) -> Vec<TocEntry> {
        self.sections
            .lock()
            .get(&section)
            .map(|index| index.lookup(schema, name))
            .unwrap_or_default()
    }

    /// The entry for (section, schema, name) with the given tag.
    pub fn lookup_kind(
        &self,
        section: Section,
        schema: &str,
        name: &str,
        kind: EntryKind,
    ) -> Option<TocEntry> {
        self.lookup(section, schema, name)
            .into_iter()
            .find(|entry| entry.kind == kind)
    }

    /// Every entry of a section, in emission order.
    pub fn entries(&self, section: Section) -> Vec<TocEntry> {
        self.sections
            .lock()
            .get(&section)
            .map(|index| index.entries.clone())
            .unwrap_or_default()
    }

    /// The seal of a section, if it completed.
    pub fn seal(&self, section: Section) -> Option<SectionSummary> {
        self.sections
            .lock()
            .get(&section)
            .and_then(|index| index.seal.clone())
    }

    /// Total number of entries across sections.
    pub fn len(&self) -> usize {
        self.sections
            .lock()
            .values()
            .map(|index| index.entries.len())
            .sum()
    }

    /// Check if no entries were recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to a writer.
    ///
    /// Fails with [`Error::IncompleteSection`] if a section holding entries
    /// was never sealed.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let document = self.to_document()?;
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }

    /// Persist to a file.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let document = self.to_document()?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Read a persisted table of contents.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: TocDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    /// Load a persisted table of contents from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read exactly the text of one entry from its section stream.
    ///
    /// Entries of a sealed section must lie within the sealed length.
    pub fn extract<R: Read + Seek>(&self, reader: &mut R, entry: &TocEntry) -> Result<String> {
        if let Some(seal) = self.seal(entry.section) {
            if entry.end > seal.length {
                return Err(Error::Toc(format!(
                    "entry {}.{} ends at {} past the end of section {} ({} bytes)",
                    entry.schema, entry.name, entry.end, entry.section, seal.length
                )));
            }
        }

        reader.seek(SeekFrom::Start(entry.start))?;
        let mut buf = Vec::new();
        reader.by_ref().take(entry.len()).read_to_end(&mut buf)?;
        if buf.len() as u64 != entry.len() {
            return Err(Error::Toc(format!(
                "section {} ends inside entry {}.{}",
                entry.section, entry.schema, entry.name
            )));
        }
        String::from_utf8(buf).map_err(|e| {
            Error::Toc(format!(
                "entry {}.{} is not valid UTF-8: {e}",
                entry.schema, entry.name
            ))
        })
    }

    /// Check a section stream against its seal.
    pub fn verify_section<R: Read>(&self, section: Section, reader: R) -> Result<()> {
        let seal = self
            .seal(section)
            .ok_or(Error::IncompleteSection { section })?;
        let (length, digest) = stream_digest(reader)?;
        if length != seal.length || digest != seal.digest {
            return Err(Error::Toc(format!(
                "section {section} does not match its seal ({length} bytes, expected {})",
                seal.length
            )));
        }
        Ok(())
    }

    fn to_document(&self) -> Result<TocDocument> {
        let sections = self.sections.lock();
        let mut out = BTreeMap::new();
        for (&section, index) in sections.iter() {
            let seal = match (&index.seal, index.entries.is_empty()) {
                (Some(seal), _) => Some(PersistedSeal {
                    length: seal.length,
                    digest: seal.digest.clone(),
                }),
                (None, true) => None,
                (None, false) => return Err(Error::IncompleteSection { section }),
            };
            let entries = index
                .entries
                .iter()
                .map(|e| PersistedEntry {
                    schema: e.schema.clone(),
                    name: e.name.clone(),
                    kind: e.kind,
                    start: e.start,
                    end: e.end,
                })
                .collect();
            out.insert(section, PersistedSection { seal, entries });
        }
        Ok(TocDocument {
            format_version: TOC_FORMAT_VERSION,
            sections: out,
        })
    }

    fn from_document(document: TocDocument) -> Result<Self> {
        if document.format_version != TOC_FORMAT_VERSION {
            return Err(Error::Toc(format!(
                "unsupported format version {}",
                document.format_version
            )));
        }

        let toc = Self::new();
        for (section, persisted) in document.sections {
            for e in persisted.entries {
                toc.add_entry(section, &e.schema, &e.name, e.kind, e.start, e.end)?;
            }
            if let Some(seal) = persisted.seal {
                toc.seal_section(SectionSummary {
                    section,
                    length: seal.length,
                    digest: seal.digest,
                })?;
            }
        }
        Ok(toc)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TocDocument {
    format_version: u32,
    sections: BTreeMap<Section, PersistedSection>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSection {
    #[serde(default)]
    seal: Option<PersistedSeal>,
    #[serde(default)]
    entries: Vec<PersistedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSeal {
    length: u64,
    digest: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    schema: String,
    name: String,
    kind: EntryKind,
    start: u64,
    end: u64,
}
