//! Section streams, their byte index and the emitter that fills both.

pub mod emitter;
pub mod section;
pub mod toc;
pub mod writer;

pub use emitter::{Addendum, MetadataEmitter, RenderedStatement, StatementRenderer};
pub use section::{EntryKind, Section};
pub use toc::{TableOfContents, TocEntry, TOC_FORMAT_VERSION};
pub use writer::{section_digest, ByteCountingWriter, SectionSummary};
