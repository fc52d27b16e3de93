//! Release scanning
//!
//! Discovers module files, runs the extractor once per file and turns the
//! output into a batch of [`ModuleRecord`]s ready to merge.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::config::{DeclarationPolicy, ScanConfig};
use crate::error::{RegistryError, Result};
use crate::extractor::MetadataExtractor;
use crate::module::ModuleRecord;

/// Extracted fields a usable record needs, counting checksum and release
pub const MIN_FIELDS: usize = 5;

/// Scans files and directories into module records
pub struct Scanner<E> {
    extractor: E,
    config: ScanConfig,
    search_path: Vec<PathBuf>,
}

impl<E: MetadataExtractor> Scanner<E> {
    pub fn new(extractor: E, config: ScanConfig) -> Self {
        Self {
            extractor,
            config,
            search_path: Vec::new(),
        }
    }

    /// Search path directories passed to every extractor call, before any
    /// directories picked up while scanning
    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = dirs;
        self
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Scan `targets` as `release`.
    ///
    /// Directories are walked for module files and appended to the search
    /// path. Files whose extraction comes up short are skipped with a
    /// warning. Within one scan a later file with the same file name replaces
    /// the earlier one in place.
    pub fn scan_release(&mut self, release: &str, targets: &[PathBuf]) -> Result<Vec<ModuleRecord>> {
        debug!(release, targets = targets.len(), "Starting scan");
        let mut found: IndexMap<String, ModuleRecord> = IndexMap::new();

        for target in targets {
            let files = if target.is_dir() {
                self.search_path.push(target.clone());
                discover_files(target, &self.config.extensions, self.config.sort_discovery)
            } else {
                vec![target.clone()]
            };

            for path in files {
                match self.scan_file(&path, release) {
                    Ok(record) => {
                        let key = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        found.insert(key, record);
                    }
                    Err(RegistryError::Extraction { path, reason }) => {
                        warn!("Skipping {},\n{}", path.display(), reason);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(found.into_values().collect())
    }

    /// Extract one file into a record tagged with `release`
    pub fn scan_file(&self, path: &Path, release: &str) -> Result<ModuleRecord> {
        debug!("Scanning {}", path.display());
        let checksum = Checksum::from_file(path)?;
        let metadata = self.extractor.extract(path, &self.search_path)?;

        for diagnostic in &metadata.diagnostics {
            match self.config.declaration_policy {
                DeclarationPolicy::Fatal => return Err(diagnostic.to_error(path)),
                DeclarationPolicy::Warn => warn!(
                    "{}:{}: {}",
                    path.display(),
                    diagnostic.line,
                    diagnostic.issue
                ),
            }
        }

        let mut fields = metadata.fields;
        fields.insert("checksum".to_string(), checksum.to_string());
        fields.insert("release".to_string(), release.to_string());

        let short = || RegistryError::Extraction {
            path: path.to_path_buf(),
            reason: metadata.message.clone(),
        };
        if fields.len() < MIN_FIELDS {
            return Err(short());
        }
        ModuleRecord::from_fields(&fields).ok_or_else(short)
    }
}

/// Module files under `dir` with one of `extensions`, in walk order
pub fn discover_files(dir: &Path, extensions: &[String], sorted: bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(true);
    if sorted {
        walker = walker.sort_by_file_name();
    }
    walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|want| want == ext))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect()
}
