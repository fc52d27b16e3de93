//! Module metadata extraction
//!
//! The registry never reads module source itself. An implementation of
//! [`MetadataExtractor`] turns one file into a flat field mapping plus any
//! problems it found with the file's own declarations. [`YangerExtractor`]
//! does this by running `yanger -f sn` and reading its `#module{ ... }`
//! section.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{RegistryError, Result};

/// Keys kept from extractor output. Everything else is ignored.
const KNOWN_KEYS: [&str; 7] = [
    "modulename",
    "modulerevision",
    "namespace",
    "prefix",
    "kind",
    "filename",
    "yang_version",
];

/// Language versions a module may declare
const SUPPORTED_VERSIONS: [&str; 2] = ["1", "1.1"];

/// Problem with a file's self-declared identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationIssue {
    /// The declared module name does not match the file name
    ModuleNameMismatch { declared: String, expected: String },
    /// The declared language version is not supported
    UnsupportedVersion(String),
}

impl fmt::Display for DeclarationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationIssue::ModuleNameMismatch { declared, expected } => write!(
                f,
                "Module name '{}' does not match the expected module name '{}'",
                declared, expected
            ),
            DeclarationIssue::UnsupportedVersion(v) => write!(f, "Unexpected YANG version '{}'", v),
        }
    }
}

/// A declaration issue and the output line it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub issue: DeclarationIssue,
}

impl Diagnostic {
    /// The fatal form of this diagnostic, for the file at `path`
    pub fn to_error(&self, path: &Path) -> RegistryError {
        RegistryError::Declaration {
            path: path.to_path_buf(),
            line: self.line,
            reason: self.issue.to_string(),
        }
    }
}

/// Result of extracting one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    /// Extracted `key -> value` pairs
    pub fields: HashMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
    /// Free-form text from the extractor, shown when extraction comes up short
    pub message: String,
}

/// Turns a module file into metadata fields
pub trait MetadataExtractor {
    /// Extract metadata from `path`, resolving imports against `search_path`.
    ///
    /// Return [`RegistryError::Extraction`] for per-file failures the scan
    /// should skip; any other error aborts the scan.
    fn extract(&self, path: &Path, search_path: &[PathBuf]) -> Result<ExtractedMetadata>;
}

/// Extractor backed by the `yanger` compiler's `sn` output format
#[derive(Debug, Clone)]
pub struct YangerExtractor {
    command: String,
    args: Vec<String>,
}

impl Default for YangerExtractor {
    fn default() -> Self {
        Self::new("yanger", vec!["-f".to_string(), "sn".to_string()])
    }
}

impl YangerExtractor {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl MetadataExtractor for YangerExtractor {
    fn extract(&self, path: &Path, search_path: &[PathBuf]) -> Result<ExtractedMetadata> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        for dir in search_path {
            cmd.arg("-p").arg(dir);
        }
        cmd.arg(path);
        debug!(?cmd, "Running extractor");

        // A missing or unrunnable extractor affects every file, so it is not a per-file failure.
        let output = cmd.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut metadata = parse_sn_output(&stdout, path);
        metadata.message = String::from_utf8_lossy(&output.stderr).into_owned();
        Ok(metadata)
    }
}

/// Parse the module section of `sn` output for the file at `path`.
///
/// The section is a run of `key = value` lines ending at the first
/// unindented `}`. Values may be wrapped in `'...'`, `"..."` or `<<"...">>`.
pub fn parse_sn_output(output: &str, path: &Path) -> ExtractedMetadata {
    let mut metadata = ExtractedMetadata::default();
    let expected = expected_module_name(path);

    for (idx, line) in output.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');
        if line == "}" {
            break;
        }
        let pieces: Vec<&str> = line.split(" = ").collect();
        if pieces.len() != 2 {
            continue;
        }
        let key = pieces[0].trim();
        if !KNOWN_KEYS.contains(&key) {
            continue;
        }
        let value = unwrap_value(pieces[1].trim_end());

        let issue = match key {
            "modulename" if value != expected => Some(DeclarationIssue::ModuleNameMismatch {
                declared: value.to_string(),
                expected: expected.clone(),
            }),
            "yang_version" if !SUPPORTED_VERSIONS.contains(&value) => {
                Some(DeclarationIssue::UnsupportedVersion(value.to_string()))
            }
            _ => None,
        };
        if let Some(issue) = issue {
            metadata.diagnostics.push(Diagnostic {
                line: line_no,
                issue,
            });
        }
        metadata.fields.insert(key.to_string(), value.to_string());
    }
    metadata
}

fn unwrap_value(raw: &str) -> &str {
    if let Some(inner) = raw
        .strip_prefix("<<\"")
        .and_then(|v| v.strip_suffix("\">>"))
    {
        return inner;
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    raw
}

/// Module name implied by a file name: `name[@revision].yang` -> `name`
pub fn expected_module_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = file_name.split('@').next().unwrap_or_default();
    base.strip_suffix(".yang")
        .or_else(|| base.strip_suffix(".yin"))
        .unwrap_or(base)
        .to_string()
}
