//! One metadata dump run.
//!
//! ```text
//! records ─► DependencyResolver ─► TopologicalSequencer ─┬─► global   ─┐
//!                                                         ├─► predata  ─┼─► toc.json
//!                                                         └─► postdata ─┘
//! ```
//!
//! Sections share only the read-only sequence and the table of contents, so
//! each is emitted by its own worker. A run either produces every section and
//! the table of contents, or nothing.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info, warn};

use crate::catalog::CatalogSnapshot;
use crate::config::DumpConfig;
use crate::error::{Error, Result};
use crate::graph::{DependencyResolver, EmissionSequence, TopologicalSequencer};
use crate::output::{
    ByteCountingWriter, MetadataEmitter, Section, SectionSummary, StatementRenderer,
    TableOfContents,
};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    /// Seal of every section, in restore order.
    pub sections: Vec<SectionSummary>,
    /// Total table-of-contents entries.
    pub entries: usize,
    /// Shell definitions emitted to break type cycles.
    pub shell_types: usize,
    /// Implicit types left out of the graph.
    pub excluded: usize,
    /// Dependency names treated as external.
    pub dropped_references: usize,
    /// Where the table of contents was written.
    pub toc_path: PathBuf,
}

/// Runs resolution, sequencing and emission for one snapshot.
pub struct MetadataDump {
    config: DumpConfig,
}

impl MetadataDump {
    /// Create a run with the given configuration.
    pub fn new(config: DumpConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Dump every record of `snapshot`.
    ///
    /// On failure every section file is removed and no table of contents is
    /// left behind.
    pub fn run<R>(&self, snapshot: &CatalogSnapshot, renderer: &R) -> Result<DumpReport>
    where
        R: StatementRenderer + ?Sized,
    {
        self.config.validate()?;
        info!(
            records = snapshot.len(),
            source_version = %snapshot.source_version,
            parallel = self.config.parallel_sections,
            "metadata dump started"
        );

        // A table of contents from an earlier run must not outlive its sections.
        remove_if_present(&self.config.toc_path)?;

        match self.produce(snapshot, renderer) {
            Ok(report) => {
                info!(
                    entries = report.entries,
                    shell_types = report.shell_types,
                    toc = %report.toc_path.display(),
                    "metadata dump finished"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, "metadata dump failed, discarding output");
                self.discard();
                Err(err)
            }
        }
    }

    fn produce<R>(&self, snapshot: &CatalogSnapshot, renderer: &R) -> Result<DumpReport>
    where
        R: StatementRenderer + ?Sized,
    {
        let graph = DependencyResolver::resolve(&snapshot.records)?;
        let sequence = TopologicalSequencer::sequence(&graph)?;

        let toc = TableOfContents::new();
        let emitter = MetadataEmitter::new(&toc, renderer);
        let sections = if self.config.parallel_sections {
            self.emit_parallel(&sequence, &emitter)?
        } else {
            Section::ALL
                .into_iter()
                .map(|section| self.emit_section(section, &sequence, &emitter))
                .collect::<Result<Vec<_>>>()?
        };

        toc.persist(&self.config.toc_path)?;

        Ok(DumpReport {
            sections,
            entries: toc.len(),
            shell_types: sequence.shell_count(),
            excluded: graph.excluded().len(),
            dropped_references: graph.dropped_references(),
            toc_path: self.config.toc_path.clone(),
        })
    }

    fn emit_parallel<R>(
        &self,
        sequence: &EmissionSequence<'_>,
        emitter: &MetadataEmitter<'_, R>,
    ) -> Result<Vec<SectionSummary>>
    where
        R: StatementRenderer + ?Sized,
    {
        thread::scope(|scope| {
            let workers: Vec<_> = Section::ALL
                .into_iter()
                .map(|section| {
                    let worker = scope.spawn(move || self.emit_section(section, sequence, emitter));
                    (section, worker)
                })
                .collect();

            // Join all workers before reporting, so no file is still open
            // when a failed run is discarded.
            let results: Vec<_> = workers
                .into_iter()
                .map(|(section, worker)| {
                    worker.join().unwrap_or_else(|_| {
                        Err(Error::WriteFault {
                            section,
                            source: io::Error::other("section worker panicked"),
                        })
                    })
                })
                .collect();
            results.into_iter().collect()
        })
    }

    fn emit_section<R>(
        &self,
        section: Section,
        sequence: &EmissionSequence<'_>,
        emitter: &MetadataEmitter<'_, R>,
    ) -> Result<SectionSummary>
    where
        R: StatementRenderer + ?Sized,
    {
        let path = self.config.destination(section)?;
        let steps = sequence.for_section(section);
        debug!(section = %section, steps = steps.len(), path = %path.display(), "emitting section");

        let mut writer = ByteCountingWriter::create(section, path)?;
        emitter.emit_section(&steps, &mut writer)?;
        let (summary, _) = emitter.seal(writer)?;
        Ok(summary)
    }

    fn discard(&self) {
        let paths = self
            .config
            .destinations
            .values()
            .map(PathBuf::as_path)
            .chain(std::iter::once(self.config.toc_path.as_path()));
        for path in paths {
            if let Err(err) = remove_if_present(path) {
                warn!(path = %path.display(), error = %err, "failed to remove output file");
            }
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogObjectRecord, ObjectDetails};
    use crate::render::DdlRenderer;

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            "5.28.0",
            vec![
                CatalogObjectRecord::new(1, "", "gucs", ObjectDetails::SessionGucs(Default::default())),
                CatalogObjectRecord::new(2, "", "analyst", ObjectDetails::Role(Default::default())),
                CatalogObjectRecord::new(3, "public", "money2", ObjectDetails::base_type()),
            ],
        )
    }

    #[test]
    fn test_run_writes_every_section_and_toc() {
        let dir = tempfile::tempdir().unwrap();
        let dump = MetadataDump::new(DumpConfig::new(dir.path()));
        let report = dump.run(&snapshot(), &DdlRenderer::new("5.28.0")).unwrap();

        assert_eq!(report.sections.len(), 3);
        // Session settings open each of the three sections.
        assert_eq!(report.entries, 5);
        for section in Section::ALL {
            assert!(dir.path().join(format!("{section}.sql")).exists());
        }
        assert!(report.toc_path.exists());
    }

    #[test]
    fn test_stale_toc_is_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = DumpConfig::new(dir.path());
        std::fs::write(&config.toc_path, "{}").unwrap();

        let mut snap = snapshot();
        snap.records
            .push(CatalogObjectRecord::new(9, "", "analyst", ObjectDetails::Role(Default::default())));

        let err = MetadataDump::new(config.clone())
            .run(&snap, &DdlRenderer::default())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateObject { .. }));
        assert!(!config.toc_path.exists());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = DumpConfig::new(dir.path())
            .with_destination(Section::Postdata, dir.path().join("global.sql"));
        let err = MetadataDump::new(config)
            .run(&snapshot(), &DdlRenderer::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
