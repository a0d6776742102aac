//! Shared configuration loader for the mdbridge toolchain.
//!
//! `defaults/mdbridge.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files on
//! top of those defaults via [`Loader`] before deserializing into
//! [`MdbridgeConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use mdbridge_babel::flavor::Flavor;
use mdbridge_babel::sync::SyncOptions;
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/mdbridge.default.toml");

/// File name picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "mdbridge.toml";

/// Top-level configuration consumed by mdbridge applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MdbridgeConfig {
    pub markdown: MarkdownConfig,
    pub sync: SyncConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownConfig {
    pub flavor: Flavor,
}

/// Debounce and import knobs for live sync.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub debounce_ms: u64,
    pub transform_diagrams_on_import: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub pretty_json: bool,
}

impl From<&MdbridgeConfig> for SyncOptions {
    fn from(config: &MdbridgeConfig) -> Self {
        SyncOptions {
            debounce_ms: config.sync.debounce_ms,
            transform_diagrams_on_import: config.sync.transform_diagrams_on_import,
            flavor: config.markdown.flavor,
        }
    }
}

impl From<MdbridgeConfig> for SyncOptions {
    fn from(config: MdbridgeConfig) -> Self {
        SyncOptions::from(&config)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<MdbridgeConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MdbridgeConfig, ConfigError> {
    Loader::new().build()
}
