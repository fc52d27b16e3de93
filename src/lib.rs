//! Module Revision Registry
//!
//! Tracks schema modules across releases and flags identifier reuse that
//! breaks global uniqueness or revision immutability.
//!
//! ## Features
//!
//! - **Per-release snapshots**: each scanned release is stored once as a CSV file
//! - **Immutable revisions**: a (name, revision) pair whose checksum changes is reported
//! - **Uniqueness checks**: namespace and prefix collisions between distinct modules
//! - **Stability checks**: namespace or prefix drift between revisions of one module
//!
//! ## Layout
//!
//! ```text
//! library/
//! ├── REVINFO-6.0.csv
//! ├── REVINFO-6.1.csv
//! └── REVINFO-6.2.csv
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use module_revtree::{Registry, SnapshotStore};
//!
//! let store = SnapshotStore::open("library")?;
//! let mut registry = Registry::new();
//! registry.load(&store)?;
//! for entry in registry.log().filter(Some("6.2")) {
//!     println!("{} {:?}", entry.classification, entry.modules);
//! }
//! # Ok::<(), module_revtree::RegistryError>(())
//! ```

pub mod checksum;
pub mod config;
pub mod conflict;
pub mod error;
pub mod extractor;
pub mod module;
pub mod registry;
pub mod report;
pub mod scan;
pub mod snapshot;

pub use checksum::Checksum;
pub use config::{DeclarationPolicy, RevtreeConfig, ScanConfig};
pub use conflict::{Classification, ConflictEntry, ConflictLog};
pub use error::{RegistryError, Result};
pub use extractor::{ExtractedMetadata, MetadataExtractor, YangerExtractor};
pub use module::{ModuleKind, ModuleRecord, UNDEFINED};
pub use registry::{MergeSummary, Registry};
pub use scan::Scanner;
pub use snapshot::{SnapshotStore, WriteOutcome};
