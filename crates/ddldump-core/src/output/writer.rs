//! Byte-counting section writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::section::Section;
use crate::error::{Error, Result};

/// Length and digest of a completed section stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// The section.
    pub section: Section,
    /// Total bytes written.
    pub length: u64,
    /// Hex-encoded blake3 digest of those bytes.
    pub digest: String,
}

/// Append-only writer for one section that tracks its byte offset.
///
/// Offsets count encoded bytes, so a range returned by [`append`] covers
/// exactly the bytes of that text and consecutive ranges are adjacent. After
/// an I/O failure the writer refuses further writes.
///
/// [`append`]: ByteCountingWriter::append
pub struct ByteCountingWriter<W: Write> {
    section: Section,
    inner: W,
    offset: u64,
    hasher: blake3::Hasher,
    faulted: bool,
}

impl ByteCountingWriter<BufWriter<File>> {
    /// Create (truncating) the section file at `path`.
    pub fn create(section: Section, path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())
            .map_err(|source| Error::WriteFault { section, source })?;
        Ok(Self::new(section, BufWriter::new(file)))
    }
}

impl<W: Write> ByteCountingWriter<W> {
    /// Wrap a writer positioned at the start of the section.
    pub fn new(section: Section, inner: W) -> Self {
        Self {
            section,
            inner,
            offset: 0,
            hasher: blake3::Hasher::new(),
            faulted: false,
        }
    }

    /// The section this writer produces.
    pub fn section(&self) -> Section {
        self.section
    }

    /// Bytes written so far.
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Append text, returning the byte range it occupies.
    pub fn append(&mut self, text: &str) -> Result<Range<u64>> {
        self.ensure_healthy()?;
        let start = self.offset;
        let bytes = text.as_bytes();
        if let Err(source) = self.inner.write_all(bytes) {
            self.faulted = true;
            return Err(Error::WriteFault {
                section: self.section,
                source,
            });
        }
        self.hasher.update(bytes);
        self.offset += bytes.len() as u64;
        Ok(start..self.offset)
    }

    /// Flush and close the stream, returning its summary and the inner writer.
    pub fn finish(mut self) -> Result<(SectionSummary, W)> {
        self.ensure_healthy()?;
        if let Err(source) = self.inner.flush() {
            return Err(Error::WriteFault {
                section: self.section,
                source,
            });
        }
        let summary = SectionSummary {
            section: self.section,
            length: self.offset,
            digest: hex::encode(self.hasher.finalize().as_bytes()),
        };
        Ok((summary, self.inner))
    }

    fn ensure_healthy(&self) -> Result<()> {
        if self.faulted {
            return Err(Error::WriteFault {
                section: self.section,
                source: std::io::Error::other("section stream already faulted"),
            });
        }
        Ok(())
    }
}

/// Digest of a byte slice in the form stored in a [`SectionSummary`].
pub fn section_digest(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Length and digest of everything left in `reader`.
pub(crate) fn stream_digest<R: std::io::Read>(mut reader: R) -> std::io::Result<(u64, String)> {
    let mut hasher = blake3::Hasher::new();
    let length = std::io::copy(&mut reader, &mut hasher)?;
    Ok((length, hex::encode(hasher.finalize().as_bytes())))
}
