//! Module records
//!
//! A [`ModuleRecord`] is the metadata of one scanned module file. Records are
//! built once, either from extractor output or from a snapshot row, and never
//! change afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::checksum::Checksum;

/// Placeholder the extractor reports for absent revisions and namespaces
pub const UNDEFINED: &str = "undefined";

/// Snapshot column names, in file order
pub const FIELD_NAMES: [&str; 8] = [
    "modulename",
    "modulerevision",
    "release",
    "checksum",
    "namespace",
    "prefix",
    "kind",
    "filename",
];

/// Kind of module a record describes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleKind {
    Module,
    Submodule,
    AnnotationModule,
    /// Any other value the extractor produced, kept verbatim
    Other(String),
}

impl ModuleKind {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleKind::Module => "module",
            ModuleKind::Submodule => "submodule",
            ModuleKind::AnnotationModule => "annotation-module",
            ModuleKind::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for ModuleKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "module" => ModuleKind::Module,
            "submodule" => ModuleKind::Submodule,
            "annotation-module" => ModuleKind::AnnotationModule,
            _ => ModuleKind::Other(s),
        }
    }
}

impl From<&str> for ModuleKind {
    fn from(s: &str) -> Self {
        ModuleKind::from(s.to_string())
    }
}

impl From<ModuleKind> for String {
    fn from(kind: ModuleKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata about one module revision, as scanned from a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(rename = "modulename")]
    name: String,
    #[serde(rename = "modulerevision")]
    revision: String,
    release: String,
    checksum: Checksum,
    namespace: String,
    prefix: String,
    kind: ModuleKind,
    filename: String,
}

impl ModuleRecord {
    /// Start a record for `name`, declared at `revision`.
    ///
    /// Everything else starts empty (namespace and kind at their defaults)
    /// and is filled in with the `with_*` methods.
    pub fn new(name: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: revision.into(),
            release: String::new(),
            checksum: Checksum::from(""),
            namespace: UNDEFINED.to_string(),
            prefix: String::new(),
            kind: ModuleKind::Module,
            filename: String::new(),
        }
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<Checksum>) -> Self {
        self.checksum = checksum.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<ModuleKind>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Build a record from a flat field mapping keyed by [`FIELD_NAMES`].
    ///
    /// Returns `None` when `modulename` is missing or empty. Other missing
    /// fields become empty strings, the same as a short snapshot row.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();
        let name = get("modulename");
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            revision: get("modulerevision"),
            release: get("release"),
            checksum: Checksum::from(get("checksum")),
            namespace: get("namespace"),
            prefix: get("prefix"),
            kind: ModuleKind::from(get("kind")),
            filename: get("filename"),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The revision exactly as declared, possibly [`UNDEFINED`]
    pub fn declared_revision(&self) -> &str {
        &self.revision
    }

    /// The revision used as registry key: the declared revision, or the
    /// checksum when the module declares none.
    pub fn effective_revision(&self) -> &str {
        if self.revision == UNDEFINED {
            self.checksum.as_str()
        } else {
            &self.revision
        }
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn kind(&self) -> &ModuleKind {
        &self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether this record is exempt from namespace and prefix collision
    /// checks: submodules, annotation modules, and modules whose name ends
    /// with `annotation_suffix`.
    pub fn is_collision_exempt(&self, annotation_suffix: &str) -> bool {
        match self.kind {
            ModuleKind::Submodule | ModuleKind::AnnotationModule => true,
            _ => !annotation_suffix.is_empty() && self.name.ends_with(annotation_suffix),
        }
    }
}

impl fmt::Display for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Module: {}/{} from {}>",
            self.name,
            self.effective_revision(),
            self.filename
        )
    }
}
