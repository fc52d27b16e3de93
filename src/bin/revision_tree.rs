//! Revision Tree CLI
//!
//! Scans module files for a release, checks them against every release
//! scanned before, and reports namespace, prefix and checksum conflicts.
//!
//! Usage:
//!   revision-tree --library ./revinfo --release 6.2 ./yang
//!   revision-tree --library ./revinfo --release 6.2   # report only

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use module_revtree::report::{write_log, write_scan_results};
use module_revtree::{Registry, RevtreeConfig, Scanner, SnapshotStore, WriteOutcome};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for any fatal error
const EXIT_FATAL: i32 = 9;

#[derive(Parser)]
#[command(name = "revision-tree")]
#[command(about = "Scan YANG modules for duplicate prefixes, namespaces and revisions")]
struct Cli {
    /// Directory with saved module info (created if absent)
    #[arg(short, long)]
    library: Option<PathBuf>,

    /// Release to store newly scanned modules as coming from
    #[arg(short, long, alias = "release-name")]
    release: Option<String>,

    /// Print the library contents after a fresh scan
    #[arg(short, long)]
    print: bool,

    /// Verbose output
    #[arg(short, long)]
    debug: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Module files or directories to scan
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("### Error: {:#}", e);
        std::process::exit(EXIT_FATAL);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = RevtreeConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let Some(library) = cli.library.clone().or_else(|| config.library_path()) else {
        println!("No library directory specified");
        return Ok(());
    };

    println!("===== Reading library =====");
    let store = SnapshotStore::open(&library)?;
    let mut registry = Registry::with_annotation_suffix(config.scan.annotation_suffix.clone());
    registry.load(&store)?;

    debug!("Files to scan: {:?}", cli.files);
    if let Some(release) = cli.release.as_deref() {
        println!("===== Scanning =====");
        if store.exists(release) {
            println!("Release {} already scanned, skipping scan", release);
        } else {
            println!("Scanning {} locations:", cli.files.len());
            let mut scanner = Scanner::new(config.extractor.build(), config.scan.clone())
                .with_search_path(config.extractor.search_path.clone());
            let records = scanner.scan_release(release, &cli.files)?;
            registry.merge(records.iter().cloned());

            println!("Writing database file for {}:", release);
            match store.write(release, &records)? {
                WriteOutcome::Written(n) => println!(
                    "Wrote module info for {} modules to {}",
                    n,
                    store.path_for(release).display()
                ),
                WriteOutcome::Empty => println!("Empty scan result, {} not written", release),
                WriteOutcome::AlreadyExists => {
                    println!("Output file for {} already exists", release)
                }
            }

            if cli.print {
                write_scan_results(&mut io::stdout().lock(), &registry)?;
            }
        }
    }

    println!("===== Scan result =====");
    write_log(&mut io::stdout().lock(), registry.log(), cli.release.as_deref())?;
    Ok(())
}
