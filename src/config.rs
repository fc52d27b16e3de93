//! Configuration management for the revision registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (revtree.toml)
//! - Environment variables (REVTREE__*)
//!
//! ## Example config file (revtree.toml):
//! ```toml
//! [library]
//! path = "./revinfo"
//!
//! [extractor]
//! command = "yanger"
//! args = ["-f", "sn"]
//! search_path = ["/opt/yang/common"]
//!
//! [scan]
//! extensions = ["yang"]
//! annotation_suffix = "-ann"
//! declaration_policy = "warn"
//! sort_discovery = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extractor::YangerExtractor;
use crate::registry::DEFAULT_ANNOTATION_SUFFIX;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevtreeConfig {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub scan: ScanConfig,
}

/// Snapshot library settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory holding the per-release snapshot files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// External extractor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Extractor executable
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments placed before the search path and file
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Directories always searched for imports, ahead of scanned directories
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
}

/// How a file whose declarations fail validation is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationPolicy {
    /// Abort the whole run
    #[default]
    Fatal,
    /// Log a warning and keep the record
    Warn,
}

/// Scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// File extensions picked up when walking directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Module name suffix exempting annotation modules from collision checks
    #[serde(default = "default_annotation_suffix")]
    pub annotation_suffix: String,

    #[serde(default)]
    pub declaration_policy: DeclarationPolicy,

    /// Walk directories in file name order instead of enumeration order
    #[serde(default)]
    pub sort_discovery: bool,
}

fn default_command() -> String {
    "yanger".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-f".to_string(), "sn".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["yang".to_string()]
}

fn default_annotation_suffix() -> String {
    DEFAULT_ANNOTATION_SUFFIX.to_string()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            search_path: Vec::new(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            annotation_suffix: default_annotation_suffix(),
            declaration_policy: DeclarationPolicy::Fatal,
            sort_discovery: false,
        }
    }
}

impl ExtractorConfig {
    /// Build the process extractor this section describes
    pub fn build(&self) -> YangerExtractor {
        YangerExtractor::new(self.command.clone(), self.args.clone())
    }
}

impl RevtreeConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["revtree.toml", ".revtree.toml", "config/revtree.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("org", "revtree", "revtree") {
            let xdg_config = config_dir.config_dir().join("revtree.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // REVTREE__SCAN__DECLARATION_POLICY=warn etc.
        builder = builder.add_source(
            Environment::with_prefix("REVTREE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The library directory, resolved against the working directory
    pub fn library_path(&self) -> Option<PathBuf> {
        self.library.path.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
