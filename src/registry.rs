//! Module Registry
//!
//! Holds every known module revision, indexed by name and effective revision,
//! together with first-seen owners for each namespace and prefix. New records
//! enter only through [`Registry::merge`], which classifies each one and
//! appends the outcome to the registry's [`ConflictLog`].

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::conflict::{Classification, ConflictLog};
use crate::error::Result;
use crate::module::{ModuleRecord, UNDEFINED};
use crate::snapshot::SnapshotStore;

/// Default name suffix marking annotation modules
pub const DEFAULT_ANNOTATION_SUFFIX: &str = "-ann";

/// Counts reported after a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Records in the merged batch
    pub merged: usize,
    /// Distinct module names now known
    pub modules: usize,
    /// Module revisions now known
    pub revisions: usize,
}

/// Who holds a namespace or prefix. Each field is set at most once.
#[derive(Debug)]
struct OwnerSlot {
    /// First record seen with the value, exempt or not
    first: ModuleRecord,
    /// First non-exempt record seen with the value
    ordinary: Option<ModuleRecord>,
}

/// Claim `key` for `module`, returning the ordinary holder it collides with
fn claim(
    slots: &mut HashMap<String, OwnerSlot>,
    key: &str,
    module: &ModuleRecord,
    exempt: bool,
) -> Option<ModuleRecord> {
    match slots.get_mut(key) {
        None => {
            let slot = OwnerSlot {
                first: module.clone(),
                ordinary: (!exempt).then(|| module.clone()),
            };
            slots.insert(key.to_string(), slot);
            None
        }
        Some(_) if exempt => None,
        Some(slot) => match &slot.ordinary {
            Some(holder) => Some(holder.clone()),
            None => {
                slot.ordinary = Some(module.clone());
                None
            }
        },
    }
}

/// The cross-release module registry
#[derive(Debug)]
pub struct Registry {
    /// name -> effective revision -> record, both in insertion order
    modules: IndexMap<String, IndexMap<String, ModuleRecord>>,
    /// Owners of each namespace
    namespaces: HashMap<String, OwnerSlot>,
    /// Owners of each prefix
    prefixes: HashMap<String, OwnerSlot>,
    log: ConflictLog,
    annotation_suffix: String,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry using the default annotation suffix
    pub fn new() -> Self {
        Self::with_annotation_suffix(DEFAULT_ANNOTATION_SUFFIX)
    }

    /// Create an empty registry that treats names ending in `suffix` as
    /// annotation modules
    pub fn with_annotation_suffix(suffix: impl Into<String>) -> Self {
        Self {
            modules: IndexMap::new(),
            namespaces: HashMap::new(),
            prefixes: HashMap::new(),
            log: ConflictLog::new(),
            annotation_suffix: suffix.into(),
        }
    }

    /// Merge every snapshot in `store`, one release file at a time
    pub fn load(&mut self, store: &SnapshotStore) -> Result<usize> {
        let files = store.snapshot_files()?;
        debug!(count = files.len(), "Found snapshot files to consult");
        let mut loaded = 0;
        for path in files {
            info!("Loading database file {}", path.display());
            let records = store.load_release(&path)?;
            loaded += records.len();
            self.merge(records);
        }
        Ok(loaded)
    }

    /// Classify and absorb a batch of records, in order.
    ///
    /// Never fails: every outcome, including conflicts, is appended to the
    /// log. A (name, effective revision) slot, once filled, is never replaced.
    pub fn merge<I>(&mut self, batch: I) -> MergeSummary
    where
        I: IntoIterator<Item = ModuleRecord>,
    {
        let mut merged = 0;
        for module in batch {
            merged += 1;
            self.merge_one(module);
        }

        let summary = MergeSummary {
            merged,
            modules: self.module_count(),
            revisions: self.revision_count(),
        };
        info!(
            "{} module revisions added. Now {} modules in {} revisions in library",
            summary.merged, summary.modules, summary.revisions
        );
        summary
    }

    fn merge_one(&mut self, module: ModuleRecord) {
        let revision = module.effective_revision().to_string();

        let Some(revisions) = self.modules.get_mut(module.name()) else {
            debug!("New module {}", module);
            let mut revisions = IndexMap::new();
            revisions.insert(revision, module.clone());
            self.modules.insert(module.name().to_string(), revisions);
            self.index_new_module(module);
            return;
        };

        if let Some(stored) = revisions.get(&revision) {
            debug!("Existing revision of module {}", module);
            if stored.checksum() != module.checksum() {
                let stored = stored.clone();
                self.log
                    .append(Classification::DiffChecksum, vec![stored, module]);
            }
            return;
        }

        debug!("New revision of module {}", module);
        let lib_mod = revisions.first().map(|(_, first)| first.clone());
        revisions.insert(revision, module.clone());
        // names are always inserted with one revision
        let Some(lib_mod) = lib_mod else {
            return;
        };

        if lib_mod.namespace() != module.namespace()
            && lib_mod.namespace() != UNDEFINED
            && module.namespace() != UNDEFINED
        {
            self.log
                .append(Classification::DiffNamespace, vec![lib_mod, module]);
            return;
        }
        if lib_mod.prefix() != module.prefix() {
            self.log
                .append(Classification::DiffPrefix, vec![lib_mod, module]);
        }
    }

    /// Register a newly seen module as namespace and prefix owner unless
    /// another module already holds them.
    ///
    /// A collision needs both sides to be ordinary modules. An exempt record
    /// seen first keeps the owner slot, and the first ordinary module after
    /// it becomes the holder later modules collide with.
    fn index_new_module(&mut self, module: ModuleRecord) {
        let exempt = module.is_collision_exempt(&self.annotation_suffix);

        if let Some(holder) = claim(&mut self.namespaces, module.namespace(), &module, exempt) {
            self.log
                .append(Classification::CollNamespace, vec![holder, module]);
            return;
        }
        if let Some(holder) = claim(&mut self.prefixes, module.prefix(), &module, exempt) {
            self.log
                .append(Classification::CollPrefix, vec![holder, module]);
            return;
        }

        self.log.append(Classification::NewModule, vec![module]);
    }

    /// Look up one revision of a module by its effective revision key
    pub fn module(&self, name: &str, revision: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)?.get(revision)
    }

    /// The first revision registered for `name`
    pub fn any_revision(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)?.first().map(|(_, m)| m)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Effective revision keys of `name`, in the order they were first seen
    pub fn revisions(&self, name: &str) -> Vec<&str> {
        self.modules
            .get(name)
            .map(|revs| revs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every record, grouped by module in insertion order
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values().flat_map(|revs| revs.values())
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn revision_count(&self) -> usize {
        self.modules.values().map(IndexMap::len).sum()
    }

    /// First record seen with `namespace`
    pub fn namespace_owner(&self, namespace: &str) -> Option<&ModuleRecord> {
        self.namespaces.get(namespace).map(|slot| &slot.first)
    }

    /// First record seen with `prefix`
    pub fn prefix_owner(&self, prefix: &str) -> Option<&ModuleRecord> {
        self.prefixes.get(prefix).map(|slot| &slot.first)
    }

    pub fn log(&self) -> &ConflictLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;

    fn module(name: &str, rev: &str, ns: &str, prefix: &str) -> ModuleRecord {
        ModuleRecord::new(name, rev)
            .with_namespace(ns)
            .with_prefix(prefix)
            .with_release("r1")
            .with_checksum(format!("sum-{}-{}", name, rev))
            .with_filename(format!("{}@{}.yang", name, rev))
    }

    fn classes(registry: &Registry) -> Vec<Classification> {
        registry
            .log()
            .entries()
            .iter()
            .map(|e| e.classification)
            .collect()
    }

    #[test]
    fn test_new_module() {
        let mut registry = Registry::new();
        let summary = registry.merge(vec![module("a", "2020-01-01", "urn:a", "a")]);

        assert_eq!(summary, MergeSummary { merged: 1, modules: 1, revisions: 1 });
        assert_eq!(classes(&registry), vec![Classification::NewModule]);
        assert_eq!(registry.namespace_owner("urn:a").unwrap().name(), "a");
        assert_eq!(registry.prefix_owner("a").unwrap().name(), "a");
    }

    #[test]
    fn test_namespace_collision_same_batch() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a", "2020-01-01", "urn:a", "a"),
            module("b", "2020-01-01", "urn:a", "b"),
        ]);

        assert_eq!(
            classes(&registry),
            vec![Classification::NewModule, Classification::CollNamespace]
        );
        let entry = &registry.log().entries()[1];
        assert_eq!(entry.modules[0].name(), "a");
        assert_eq!(entry.modules[1].name(), "b");
        assert_eq!(registry.namespace_owner("urn:a").unwrap().name(), "a");
        // b keeps its revision slot but owns neither index
        assert!(registry.module("b", "2020-01-01").is_some());
        assert!(registry.prefix_owner("b").is_none());
    }

    #[test]
    fn test_prefix_collision() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a", "2020-01-01", "urn:a", "x"),
            module("b", "2020-01-01", "urn:b", "x"),
        ]);

        assert_eq!(
            classes(&registry),
            vec![Classification::NewModule, Classification::CollPrefix]
        );
        // namespace registration happened before the prefix check
        assert_eq!(registry.namespace_owner("urn:b").unwrap().name(), "b");
        assert_eq!(registry.prefix_owner("x").unwrap().name(), "a");
    }

    #[test]
    fn test_submodule_and_annotation_exempt() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a", "2020-01-01", "urn:a", "a"),
            module("a-sub", "2020-01-01", "urn:a", "a").with_kind(ModuleKind::Submodule),
            module("a-ann", "2020-01-01", "urn:a", "a"),
        ]);

        assert_eq!(
            classes(&registry),
            vec![
                Classification::NewModule,
                Classification::NewModule,
                Classification::NewModule
            ]
        );
        assert_eq!(registry.namespace_owner("urn:a").unwrap().name(), "a");
        assert_eq!(registry.prefix_owner("a").unwrap().name(), "a");
    }

    #[test]
    fn test_exempt_owner_seen_first_does_not_collide() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a-sub", "2020-01-01", "urn:a", "a").with_kind(ModuleKind::Submodule),
            module("a-ann", "2020-01-01", "urn:a", "a"),
            module("a", "2020-01-01", "urn:a", "a"),
        ]);

        assert_eq!(
            classes(&registry),
            vec![
                Classification::NewModule,
                Classification::NewModule,
                Classification::NewModule
            ]
        );
        // the submodule keeps the slots it claimed first
        assert_eq!(registry.namespace_owner("urn:a").unwrap().name(), "a-sub");
        assert_eq!(registry.prefix_owner("a").unwrap().name(), "a-sub");

        // a second ordinary module collides with the parent, not the submodule
        registry.merge(vec![module("b", "2020-01-01", "urn:a", "b")]);
        let entry = registry.log().entries().last().unwrap();
        assert_eq!(entry.classification, Classification::CollNamespace);
        assert_eq!(entry.modules[0].name(), "a");
        assert_eq!(entry.modules[1].name(), "b");
    }

    #[test]
    fn test_custom_annotation_suffix() {
        let mut registry = Registry::with_annotation_suffix("-annot");
        registry.merge(vec![
            module("a", "1", "urn:a", "a"),
            module("a-ann", "1", "urn:a", "a"),
            module("a-annot", "1", "urn:a", "a"),
        ]);
        assert_eq!(
            classes(&registry),
            vec![
                Classification::NewModule,
                Classification::CollNamespace,
                Classification::NewModule
            ]
        );
    }

    #[test]
    fn test_diff_namespace() {
        let mut registry = Registry::new();
        registry.merge(vec![module("a", "2020-01-01", "urn:a", "a")]);
        registry.merge(vec![module("a", "2020-02-01", "urn:a2", "b")]);

        let entry = registry.log().entries().last().unwrap();
        assert_eq!(entry.classification, Classification::DiffNamespace);
        assert_eq!(entry.modules[0].effective_revision(), "2020-01-01");
        assert_eq!(entry.modules[1].effective_revision(), "2020-02-01");
        // prefix difference is not reported once the namespace differs
        assert_eq!(registry.log().len(), 2);
        assert_eq!(registry.revisions("a"), vec!["2020-01-01", "2020-02-01"]);
    }

    #[test]
    fn test_undefined_namespace_is_not_a_difference() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a", "2020-01-01", "urn:a", "a"),
            module("a", "2020-02-01", UNDEFINED, "a"),
        ]);
        assert_eq!(classes(&registry), vec![Classification::NewModule]);
    }

    #[test]
    fn test_diff_prefix() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a", "2020-01-01", "urn:a", "a"),
            module("a", "2020-02-01", "urn:a", "aa"),
            module("a", "2020-03-01", "urn:a", "a"),
        ]);
        assert_eq!(
            classes(&registry),
            vec![Classification::NewModule, Classification::DiffPrefix]
        );
        // new revisions never claim index ownership
        assert!(registry.prefix_owner("aa").is_none());
    }

    #[test]
    fn test_diff_checksum_keeps_stored_record() {
        let mut registry = Registry::new();
        let original = module("a", "2020-01-01", "urn:a", "a");
        let changed = original.clone().with_checksum("other").with_release("r2");
        registry.merge(vec![original.clone()]);
        registry.merge(vec![changed.clone()]);

        let entry = registry.log().entries().last().unwrap();
        assert_eq!(entry.classification, Classification::DiffChecksum);
        assert_eq!(entry.modules, vec![original.clone(), changed]);
        assert_eq!(registry.module("a", "2020-01-01"), Some(&original));
    }

    #[test]
    fn test_idempotent_remerge() {
        let batch = vec![
            module("a", "2020-01-01", "urn:a", "a"),
            module("b", "2020-01-01", "urn:b", "b"),
        ];
        let mut registry = Registry::new();
        registry.merge(batch.clone());
        let before = registry.log().len();
        let summary = registry.merge(batch);
        assert_eq!(registry.log().len(), before);
        assert_eq!(summary.revisions, 2);
    }

    #[test]
    fn test_unrevisioned_modules_keyed_by_checksum() {
        let mut registry = Registry::new();
        let first = module("u", UNDEFINED, "urn:u", "u").with_checksum("c1");
        let second = module("u", UNDEFINED, "urn:u", "u").with_checksum("c2");
        registry.merge(vec![first, second.clone(), second]);

        assert_eq!(registry.revisions("u"), vec!["c1", "c2"]);
        assert_eq!(classes(&registry), vec![Classification::NewModule]);
    }

    #[test]
    fn test_first_seen_owner_depends_on_order() {
        let a = module("a", "1", "urn:shared", "a");
        let b = module("b", "1", "urn:shared", "b");

        let mut forward = Registry::new();
        forward.merge(vec![a.clone(), b.clone()]);
        let mut reverse = Registry::new();
        reverse.merge(vec![b, a]);

        assert_eq!(forward.namespace_owner("urn:shared").unwrap().name(), "a");
        assert_eq!(reverse.namespace_owner("urn:shared").unwrap().name(), "b");
    }

    #[test]
    fn test_any_revision_is_first_inserted() {
        let mut registry = Registry::new();
        registry.merge(vec![
            module("a", "2021-01-01", "urn:a", "a"),
            module("a", "2019-01-01", "urn:a", "a"),
        ]);
        assert_eq!(
            registry.any_revision("a").unwrap().effective_revision(),
            "2021-01-01"
        );
        assert_eq!(registry.modules().count(), 2);
        assert_eq!(registry.module_names().collect::<Vec<_>>(), vec!["a"]);
    }
}
