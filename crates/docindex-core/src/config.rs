//! Configuration for docindex runs.

use crate::CoreError;
use docindex_indexer::{ClassificationPolicy, ExtractorRegistry, ReservedNames};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in the indexed root
pub const ROOT_CONFIG_FILE: &str = "docindex.yaml";

/// Run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Per-directory index document name
    #[serde(default = "default_index_file_name")]
    pub index_file_name: String,

    /// Processed-file ledger name (root only)
    #[serde(default = "default_ledger_file_name")]
    pub ledger_file_name: String,

    /// Run lock file name (root only)
    #[serde(default = "default_lock_file_name")]
    pub lock_file_name: String,

    /// Descend into symlinked directories
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Directory classification
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Extension lists per extractor
    #[serde(default)]
    pub extractors: ExtractorsConfig,

    /// Log level and log file
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Lock contention handling
    #[serde(default)]
    pub lock: LockConfig,
}

/// Directory names that are skipped or merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Directories excluded with their whole subtree
    #[serde(default = "default_skip")]
    pub skip: Vec<String>,

    /// Directories whose subtree is merged into one index
    #[serde(default = "default_unclassified")]
    pub unclassified: Vec<String>,
}

/// File extensions handled by each extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorsConfig {
    #[serde(default = "default_paginated")]
    pub paginated: Vec<String>,

    #[serde(default = "default_text")]
    pub text: Vec<String>,

    #[serde(default = "default_name_only")]
    pub name_only: Vec<String>,

    /// Encoding label tried when a text file is not UTF-8
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file written in the indexed root
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
}

/// What to do when another run holds the lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Extra attempts after the first
    #[serde(default = "default_lock_retries")]
    pub retries: u32,

    /// Delay between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_index_file_name() -> String {
    "search_index.xml".to_string()
}

fn default_ledger_file_name() -> String {
    "processed_files_log.txt".to_string()
}

fn default_lock_file_name() -> String {
    ".search_index.lock".to_string()
}

fn default_skip() -> Vec<String> {
    [".git", "txtTemp", "$RECYCLE.BIN", "System Volume Information"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_unclassified() -> Vec<String> {
    vec!["no classification".to_string()]
}

fn default_paginated() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_text() -> Vec<String> {
    vec!["txt".to_string(), "log".to_string()]
}

fn default_name_only() -> Vec<String> {
    ["mp4", "dwg", "tif", "xls", "xlsx", "doc", "docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fallback_encoding() -> String {
    "windows-1252".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_name() -> String {
    "search_builder_processing_log.txt".to_string()
}

fn default_lock_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            skip: default_skip(),
            unclassified: default_unclassified(),
        }
    }
}

impl Default for ExtractorsConfig {
    fn default() -> Self {
        Self {
            paginated: default_paginated(),
            text: default_text(),
            name_only: default_name_only(),
            fallback_encoding: default_fallback_encoding(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_name: default_log_file_name(),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retries: default_lock_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_file_name: default_index_file_name(),
            ledger_file_name: default_ledger_file_name(),
            lock_file_name: default_lock_file_name(),
            follow_symlinks: false,
            classification: ClassificationConfig::default(),
            extractors: ExtractorsConfig::default(),
            logging: LoggingConfig::default(),
            lock: LockConfig::default(),
        }
    }
}

/// Settings chosen by [`Settings::discover`], plus what discovery passed over.
///
/// Discovery runs before logging is set up, so the caller logs this once a
/// subscriber is installed.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub settings: Settings,
    /// File the settings came from, `None` for defaults
    pub source: Option<PathBuf>,
    /// Candidate files that existed but could not be used, with the reason
    pub ignored: Vec<(PathBuf, String)>,
}

impl Discovered {
    /// Emit the discovery outcome through `tracing`.
    pub fn log(&self) {
        for (path, reason) in &self.ignored {
            tracing::warn!("Ignoring config file {}: {}", path.display(), reason);
        }
        match &self.source {
            Some(path) => tracing::info!(path = ?path, "Loaded settings"),
            None => tracing::debug!("Using default settings"),
        }
    }
}

impl Settings {
    /// Resolve settings for a run over `root`.
    ///
    /// An explicit path must load. Otherwise `<root>/docindex.yaml`, then the
    /// user config file, are tried; unreadable or invalid files there are
    /// recorded in [`Discovered::ignored`] and skipped.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Discovered, CoreError> {
        if let Some(path) = explicit {
            return Ok(Discovered {
                settings: Self::load_from(path)?,
                source: Some(path.to_path_buf()),
                ignored: Vec::new(),
            });
        }

        let mut ignored = Vec::new();
        let candidates = [Some(root.join(ROOT_CONFIG_FILE)), user_config_path()];
        for path in candidates.into_iter().flatten() {
            if !path.is_file() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(settings) => {
                    return Ok(Discovered {
                        settings,
                        source: Some(path),
                        ignored,
                    })
                }
                Err(e) => ignored.push((path, e.to_string())),
            }
        }

        Ok(Discovered {
            settings: Self::default(),
            source: None,
            ignored,
        })
    }

    /// Load and validate settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let settings: Self = serde_yaml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings a run cannot work with
    pub fn validate(&self) -> Result<(), CoreError> {
        let names = [
            ("index_file_name", &self.index_file_name),
            ("ledger_file_name", &self.ledger_file_name),
            ("lock_file_name", &self.lock_file_name),
            ("logging.file_name", &self.logging.file_name),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{field} must not be empty")));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(CoreError::Config(format!(
                    "{field} must be a plain file name, got {value}"
                )));
            }
        }

        tracing_subscriber::EnvFilter::try_new(&self.logging.level).map_err(|e| {
            CoreError::Config(format!("invalid log level {}: {}", self.logging.level, e))
        })?;

        self.extractor_registry()?;
        Ok(())
    }

    /// Classification rules for the walker
    pub fn classification_policy(&self) -> ClassificationPolicy {
        ClassificationPolicy::new(
            self.classification.skip.iter(),
            self.classification.unclassified.iter(),
        )
    }

    /// Extractor registry built from the extension lists
    pub fn extractor_registry(&self) -> Result<ExtractorRegistry, CoreError> {
        let registry = ExtractorRegistry::from_extensions(
            &self.extractors.paginated,
            &self.extractors.text,
            &self.extractors.name_only,
            &self.extractors.fallback_encoding,
        )?;
        Ok(registry)
    }

    /// File names the walker must not index
    pub fn reserved_names(&self) -> ReservedNames {
        ReservedNames::new(self.index_file_name.as_str())
            .with_root_file(self.ledger_file_name.as_str())
            .with_root_file(self.lock_file_name.as_str())
            .with_root_file(self.logging.file_name.as_str())
            .with_root_file(ROOT_CONFIG_FILE)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docindex").join("config.yaml"))
}
