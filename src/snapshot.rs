//! Per-release snapshot files
//!
//! Each scanned release is persisted exactly once as
//! `<library>/REVINFO-<release>.csv`, one row per [`ModuleRecord`] with the
//! columns listed in [`FIELD_NAMES`](crate::module::FIELD_NAMES). Existing
//! files are never rewritten.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::module::ModuleRecord;

/// File name prefix of every snapshot
pub const SNAPSHOT_PREFIX: &str = "REVINFO-";
/// File name suffix of every snapshot
pub const SNAPSHOT_SUFFIX: &str = ".csv";

/// What [`SnapshotStore::write`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new snapshot with this many rows was written
    Written(usize),
    /// The release already had a snapshot; nothing was touched
    AlreadyExists,
    /// The batch was empty; no file was created
    Empty,
}

/// Directory of release snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open a snapshot directory, creating it if absent
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            info!("Creating library directory {}", dir.display());
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot for `release`
    pub fn path_for(&self, release: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", SNAPSHOT_PREFIX, release, SNAPSHOT_SUFFIX))
    }

    /// Whether `release` has already been scanned and persisted
    pub fn exists(&self, release: &str) -> bool {
        self.path_for(release).exists()
    }

    /// Every snapshot file in the directory, in enumeration order
    pub fn snapshot_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_snapshot = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(SNAPSHOT_PREFIX) && n.ends_with(SNAPSHOT_SUFFIX))
                .unwrap_or(false);
            if is_snapshot && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Read the records of one snapshot file
    pub fn load_release(&self, path: &Path) -> Result<Vec<ModuleRecord>> {
        debug!("Reading release info {}", path.display());
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: ModuleRecord = row?;
            records.push(record);
        }
        Ok(records)
    }

    /// Read the records of every snapshot file
    pub fn load_all(&self) -> Result<Vec<ModuleRecord>> {
        let mut records = Vec::new();
        for path in self.snapshot_files()? {
            records.extend(self.load_release(&path)?);
        }
        Ok(records)
    }

    /// Persist `records` as the snapshot of `release`.
    ///
    /// Rows are written to a temporary file that is renamed into place, so a
    /// snapshot is either complete or absent.
    pub fn write(&self, release: &str, records: &[ModuleRecord]) -> Result<WriteOutcome> {
        let path = self.path_for(release);
        if path.exists() {
            warn!("Output file '{}' already exists", path.display());
            return Ok(WriteOutcome::AlreadyExists);
        }
        if records.is_empty() {
            debug!(release, "Nothing to persist");
            return Ok(WriteOutcome::Empty);
        }

        write_atomic(&path.with_extension("csv.tmp"), &path, records)?;
        debug!(release, rows = records.len(), "Snapshot persisted");
        Ok(WriteOutcome::Written(records.len()))
    }
}

/// Write `records` to `tmp` and rename it to `path`. `tmp` is removed on failure.
fn write_atomic(tmp: &Path, path: &Path, records: &[ModuleRecord]) -> Result<()> {
    let result = write_rows(tmp, records).and_then(|()| Ok(fs::rename(tmp, path)?));
    if result.is_err() {
        let _ = fs::remove_file(tmp);
    }
    result
}

fn write_rows(tmp: &Path, records: &[ModuleRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(tmp)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
