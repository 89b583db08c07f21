//! ddldump core - dependency ordering and byte-indexed emission of DDL metadata.
//!
//! This crate turns a catalog snapshot into restorable section scripts
//! (global, predata, postdata) plus a table of contents that maps every
//! object to the exact byte range of its text.

pub mod catalog;
pub mod config;
pub mod dump;
pub mod error;
pub mod graph;
pub mod output;
pub mod render;

pub use catalog::{CatalogObjectRecord, CatalogSnapshot, ObjectDetails, ObjectKind, Oid, TypeOrigin};
pub use config::DumpConfig;
pub use dump::{DumpReport, MetadataDump};
pub use error::{Error, Result};
pub use graph::{
    DefinitionForm, DependencyGraph, DependencyResolver, EmissionSequence, EmissionStep,
    PriorityClass, TopologicalSequencer,
};
pub use output::{
    Addendum, ByteCountingWriter, EntryKind, MetadataEmitter, RenderedStatement, Section,
    SectionSummary, StatementRenderer, TableOfContents, TocEntry,
};
pub use render::DdlRenderer;
