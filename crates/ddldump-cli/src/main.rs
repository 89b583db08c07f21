//! ddldump command-line driver.
//!
//! Dumps a catalog snapshot into section scripts with a table of contents,
//! and extracts single objects back out of a finished dump.

use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ddldump_core::{
    CatalogSnapshot, DdlRenderer, DumpConfig, EntryKind, MetadataDump, Section, TableOfContents,
};

/// Dependency-ordered DDL metadata dump
#[derive(Parser, Debug)]
#[command(name = "ddldump")]
#[command(version, about = "Dependency-ordered DDL metadata dump")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write section scripts and a table of contents for a catalog snapshot
    Dump {
        /// Catalog snapshot (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Directory receiving global.sql, predata.sql, postdata.sql and toc.json
        #[arg(long, conflicts_with = "config")]
        output_dir: Option<PathBuf>,

        /// Dump configuration file (JSON) with explicit destinations
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit sections one after another instead of concurrently
        #[arg(long)]
        serial: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the exact text of one object from a finished dump
    Extract {
        /// Table of contents written by a dump
        #[arg(long)]
        toc: PathBuf,

        /// Section script holding the object; defaults to the dump's own file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Section to look in (global, predata, postdata)
        #[arg(long)]
        section: Section,

        /// Schema of the object; empty for global objects
        #[arg(long, default_value = "")]
        schema: String,

        /// Name of the object
        #[arg(long)]
        name: String,

        /// Only entries of this kind (e.g. predata-type)
        #[arg(long)]
        kind: Option<EntryKind>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ddldump=info,ddldump_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Args::parse().command {
        Command::Dump {
            catalog,
            output_dir,
            config,
            serial,
            json,
        } => run_dump(catalog, output_dir, config, serial, json),
        Command::Extract {
            toc,
            file,
            section,
            schema,
            name,
            kind,
        } => run_extract(toc, file, section, &schema, &name, kind),
    }
}

fn run_dump(
    catalog: PathBuf,
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    serial: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match (config, output_dir) {
        (Some(path), _) => DumpConfig::from_json_file(path)?,
        (None, Some(dir)) => {
            std::fs::create_dir_all(&dir)?;
            DumpConfig::new(dir)
        }
        (None, None) => return Err("either --output-dir or --config is required".into()),
    };
    if serial {
        config = config.serial();
    }

    let snapshot = CatalogSnapshot::from_json_file(&catalog)?;
    tracing::info!(
        catalog = %catalog.display(),
        records = snapshot.len(),
        "catalog snapshot loaded"
    );

    let renderer = DdlRenderer::new(&snapshot.source_version);
    let report = MetadataDump::new(config).run(&snapshot, &renderer)?;

    if json {
        let sections: Vec<_> = report
            .sections
            .iter()
            .map(|s| {
                serde_json::json!({
                    "section": s.section,
                    "length": s.length,
                    "digest": s.digest,
                })
            })
            .collect();
        let summary = serde_json::json!({
            "sections": sections,
            "entries": report.entries,
            "shell_types": report.shell_types,
            "excluded": report.excluded,
            "dropped_references": report.dropped_references,
            "toc": report.toc_path,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for s in &report.sections {
            println!("{:<8} {:>10} bytes  {}", s.section, s.length, s.digest);
        }
        println!(
            "{} entries, {} shell types, toc at {}",
            report.entries,
            report.shell_types,
            report.toc_path.display()
        );
    }
    Ok(())
}

fn run_extract(
    toc_path: PathBuf,
    file: Option<PathBuf>,
    section: Section,
    schema: &str,
    name: &str,
    kind: Option<EntryKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let toc = TableOfContents::load(&toc_path)?;
    let entries: Vec<_> = toc
        .lookup(section, schema, name)
        .into_iter()
        .filter(|entry| kind.map_or(true, |k| entry.kind == k))
        .collect();
    if entries.is_empty() {
        return Err(format!("no {section} entry for {schema}.{name}").into());
    }

    let path = match file {
        Some(path) => path,
        None => toc_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join(format!("{section}.sql")),
    };
    let mut reader = File::open(&path)?;
    toc.verify_section(section, File::open(&path)?)?;

    for entry in &entries {
        tracing::debug!(kind = %entry.kind, start = entry.start, end = entry.end, "extracting entry");
        print!("{}", toc.extract(&mut reader, entry)?);
    }
    println!();
    Ok(())
}
