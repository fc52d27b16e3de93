//! Classification outcomes and the ordered conflict log

use std::fmt;

use crate::module::ModuleRecord;

/// Outcome of classifying one record during a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    NewModule,
    NewRevision,
    KnownRevision,
    /// Generic error with no more specific classification
    ErrorBase,
    CollPrefix,
    CollNamespace,
    DiffPrefix,
    DiffNamespace,
    DiffChecksum,
}

impl Classification {
    /// Numeric code shown in reports
    pub fn code(self) -> u8 {
        match self {
            Classification::NewModule => 0,
            Classification::NewRevision => 1,
            Classification::KnownRevision => 2,
            Classification::ErrorBase => 3,
            Classification::CollPrefix => 4,
            Classification::CollNamespace => 5,
            Classification::DiffPrefix => 6,
            Classification::DiffNamespace => 7,
            Classification::DiffChecksum => 8,
        }
    }

    pub fn is_error(self) -> bool {
        self.code() >= Classification::ErrorBase.code()
    }

    /// Fixed headline printed above the involved records
    pub fn headline(self) -> &'static str {
        match self {
            Classification::NewModule => "New module",
            Classification::NewRevision => "New revision",
            Classification::KnownRevision => "Known revision",
            Classification::ErrorBase => "Generic error with",
            Classification::CollPrefix => "Prefix collision between",
            Classification::CollNamespace => "Namespace collision between",
            Classification::DiffPrefix => "Modules with the same name but different prefixes",
            Classification::DiffNamespace => {
                "Modules with the same name but different namespaces"
            }
            Classification::DiffChecksum => {
                "Modules with the same name and revision but different checksums"
            }
        }
    }

    /// The record field that explains this classification, if any
    pub fn detail(self, module: &ModuleRecord) -> Option<&str> {
        match self {
            Classification::CollPrefix | Classification::DiffPrefix => Some(module.prefix()),
            Classification::CollNamespace | Classification::DiffNamespace => {
                Some(module.namespace())
            }
            Classification::DiffChecksum => Some(module.checksum().as_str()),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Classification::NewModule => "NEW_MODULE",
            Classification::NewRevision => "NEW_REVISION",
            Classification::KnownRevision => "KNOWN_REVISION",
            Classification::ErrorBase => "ERROR_BASE",
            Classification::CollPrefix => "COLL_PREFIX",
            Classification::CollNamespace => "COLL_NAMESPACE",
            Classification::DiffPrefix => "DIFF_PREFIX",
            Classification::DiffNamespace => "DIFF_NAMESPACE",
            Classification::DiffChecksum => "DIFF_CHECKSUM",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One logged outcome and the records involved, in a fixed order
/// (existing record first, incoming record last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    pub classification: Classification,
    pub modules: Vec<ModuleRecord>,
}

impl ConflictEntry {
    /// Whether any involved record was produced by `release`
    pub fn involves_release(&self, release: &str) -> bool {
        self.modules.iter().any(|m| m.release() == release)
    }
}

/// Append-only log of merge outcomes
#[derive(Debug, Default, Clone)]
pub struct ConflictLog {
    entries: Vec<ConflictEntry>,
}

impl ConflictLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, classification: Classification, modules: Vec<ModuleRecord>) {
        self.entries.push(ConflictEntry {
            classification,
            modules,
        });
    }

    /// Entries in append order, restricted to those touching `release` when given
    pub fn filter<'a>(
        &'a self,
        release: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ConflictEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| release.map_or(true, |r| e.involves_release(r)))
    }

    /// Number of error entries, optionally restricted to one release
    pub fn error_count(&self, release: Option<&str>) -> usize {
        self.filter(release)
            .filter(|e| e.classification.is_error())
            .count()
    }

    pub fn entries(&self) -> &[ConflictEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, release: &str) -> ModuleRecord {
        ModuleRecord::new(name, "2020-01-01").with_release(release)
    }

    #[test]
    fn test_codes_and_errors() {
        assert_eq!(Classification::NewModule.code(), 0);
        assert_eq!(Classification::DiffChecksum.code(), 8);
        assert!(!Classification::KnownRevision.is_error());
        assert!(Classification::CollPrefix.is_error());
        assert_eq!(Classification::CollNamespace.to_string(), "COLL_NAMESPACE");
    }

    #[test]
    fn test_filter_by_release_keeps_order() {
        let mut log = ConflictLog::new();
        log.append(Classification::NewModule, vec![module("a", "r1")]);
        log.append(
            Classification::CollNamespace,
            vec![module("a", "r1"), module("b", "r2")],
        );
        log.append(Classification::NewModule, vec![module("c", "r2")]);
        log.append(Classification::NewModule, vec![module("d", "r3")]);

        let r2: Vec<_> = log.filter(Some("r2")).map(|e| e.classification).collect();
        assert_eq!(
            r2,
            vec![Classification::CollNamespace, Classification::NewModule]
        );
        assert_eq!(log.filter(None).count(), 4);
        assert_eq!(log.filter(Some("missing")).count(), 0);
        assert_eq!(log.error_count(Some("r1")), 1);
        assert_eq!(log.error_count(Some("r3")), 0);
    }

    #[test]
    fn test_detail_field() {
        let m = ModuleRecord::new("a", "1")
            .with_namespace("urn:a")
            .with_prefix("pa")
            .with_checksum("ff");
        assert_eq!(Classification::CollPrefix.detail(&m), Some("pa"));
        assert_eq!(Classification::DiffNamespace.detail(&m), Some("urn:a"));
        assert_eq!(Classification::DiffChecksum.detail(&m), Some("ff"));
        assert_eq!(Classification::NewModule.detail(&m), None);
    }
}
