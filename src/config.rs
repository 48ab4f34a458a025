use crate::error::{Result, VpkError};
use crate::header::{Compression, Encryption};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Author recorded when the configuration does not name one
pub const DEFAULT_AUTHOR: &str = "unknown";

/// Settings that drive `create` and `open`
///
/// ```toml
/// author = "alice"
/// encryption = "gcm"
/// compression = "brotli"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    pub author: String,
    pub encryption: Encryption,
    pub compression: Compression,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            encryption: Encryption::default(),
            compression: Compression::default(),
        }
    }
}

impl PackageConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| VpkError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| VpkError::Config(e.to_string()))
    }

    /// Read a configuration file; the file must exist
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            VpkError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Read the explicit path if given, otherwise the per-user config file
    /// when it exists, otherwise defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// `<config dir>/vpk/config.toml` for the current user
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "vpk").map(|dirs| dirs.config_dir().join("config.toml"))
}
