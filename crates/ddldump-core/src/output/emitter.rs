//! Emission of rendered statements into section streams.

use std::io::Write;

use tracing::{info, trace};

use super::section::EntryKind;
use super::toc::TableOfContents;
use super::writer::{ByteCountingWriter, SectionSummary};
use crate::catalog::CatalogObjectRecord;
use crate::error::Result;
use crate::graph::{DefinitionForm, EmissionStep};

/// Text written right after a step's primary entry under an entry of its own,
/// so restore tooling can skip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addendum {
    /// Tag of the separate entry.
    pub kind: EntryKind,
    /// Statement text.
    pub text: String,
}

/// Text produced for one emission step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedStatement {
    /// Primary statement text, possibly empty.
    pub statement: String,
    /// Trailing annotation (ownership, comment), if any.
    pub annotation: Option<String>,
    /// Statements indexed separately after the primary entry.
    pub addenda: Vec<Addendum>,
}

impl RenderedStatement {
    /// A statement with no annotation.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            ..Self::default()
        }
    }

    /// Nothing to emit.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach an annotation.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Attach text recorded under its own entry of the given kind.
    pub fn with_addendum(mut self, kind: EntryKind, text: impl Into<String>) -> Self {
        self.addenda.push(Addendum {
            kind,
            text: text.into(),
        });
        self
    }

    /// Encoded length of the primary entry.
    pub fn byte_len(&self) -> usize {
        self.statement.len() + self.annotation.as_deref().map_or(0, str::len)
    }
}

/// Turns a catalog record into statement text.
///
/// Implementations are shared by concurrent section workers.
pub trait StatementRenderer: Send + Sync {
    /// Render one step. An empty statement means the object needs no text
    /// under the current settings.
    fn render(&self, record: &CatalogObjectRecord, form: DefinitionForm)
        -> Result<RenderedStatement>;
}

/// Writes one section's steps and indexes them in the table of contents.
pub struct MetadataEmitter<'t, R: StatementRenderer + ?Sized> {
    toc: &'t TableOfContents,
    renderer: &'t R,
}

impl<'t, R: StatementRenderer + ?Sized> MetadataEmitter<'t, R> {
    /// Create an emitter recording into `toc`.
    pub fn new(toc: &'t TableOfContents, renderer: &'t R) -> Self {
        Self { toc, renderer }
    }

    /// Emit `steps` in order into `writer`.
    ///
    /// Every step gets one entry covering its statement and any non-empty
    /// annotation, followed by one entry per addendum. Returns the number of
    /// entries recorded.
    pub fn emit_section<W: Write>(
        &self,
        steps: &[EmissionStep<'_>],
        writer: &mut ByteCountingWriter<W>,
    ) -> Result<usize> {
        let section = writer.section();
        let mut recorded = 0;
        for step in steps {
            let record = step.record;
            let rendered = self.renderer.render(record, step.form)?;

            let start = writer.current_offset();
            writer.append(&rendered.statement)?;
            if let Some(annotation) = rendered.annotation.as_deref() {
                writer.append(annotation)?;
            }
            let end = writer.current_offset();

            let kind = EntryKind::for_step(record.kind(), step.form);
            self.toc
                .add_entry(section, &record.schema, &record.name, kind, start, end)?;
            trace!(
                section = %section,
                object = %record.label(),
                kind = %kind,
                start,
                end,
                "entry emitted"
            );
            recorded += 1;

            for addendum in &rendered.addenda {
                let start = writer.current_offset();
                writer.append(&addendum.text)?;
                let end = writer.current_offset();
                self.toc.add_entry(
                    section,
                    &record.schema,
                    &record.name,
                    addendum.kind,
                    start,
                    end,
                )?;
                recorded += 1;
            }
        }
        Ok(recorded)
    }

    /// Finish the section stream and seal it in the table of contents.
    pub fn seal<W: Write>(&self, writer: ByteCountingWriter<W>) -> Result<(SectionSummary, W)> {
        let section = writer.section();
        let (summary, inner) = writer.finish()?;
        self.toc.seal_section(summary.clone())?;
        info!(
            section = %section,
            entries = self.toc.entries(section).len(),
            bytes = summary.length,
            "section sealed"
        );
        Ok((summary, inner))
    }
}
