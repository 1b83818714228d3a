//! Loading and atomically persisting the config file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ConfigError, GenerationError};

use super::Config;

/// The config file and, if it existed at load time, its contents.
///
/// A missing file is not an error at load time. It is reported when a
/// generation asks for the config, so the caller can still run `setup`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Option<Config>,
}

impl ConfigStore {
    /// Read the config file at `path`.
    ///
    /// Returns a store marked "not configured" when the file does not exist.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = match read_config(&path) {
            Ok(config) => Some(config),
            Err(ConfigError::Missing(_)) => {
                debug!("No config file at {}", path.display());
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self { path, config })
    }

    /// A store backed by an in-memory config, used by callers that build the
    /// config themselves.
    pub fn from_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config: Some(config),
        }
    }

    /// A store for `path` that does not read the file.
    ///
    /// `setup` uses this so an unreadable or corrupt file can still be
    /// replaced with `init_default(true)`.
    pub fn unloaded(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// The loaded config, or `ConfigMissing` if the file was absent.
    pub fn config(&self) -> Result<&Config, GenerationError> {
        self.config
            .as_ref()
            .ok_or_else(|| GenerationError::ConfigMissing(ConfigError::Missing(self.path.clone())))
    }

    /// Replace the whole file with `config`.
    pub fn save(&mut self, config: Config) -> Result<(), ConfigError> {
        write_config(&self.path, &config)?;
        self.config = Some(config);
        Ok(())
    }

    /// Seed the file with the local backend enabled.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn init_default(&mut self, force: bool) -> Result<(), ConfigError> {
        if !force && self.path.exists() {
            return Err(ConfigError::AlreadyExists(self.path.clone()));
        }
        self.save(Config::local_default())
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write-new-then-rename so readers never observe a partially written file.
fn write_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(config).map_err(ConfigError::SerializeFailed)?;

    let write_failed = |source: std::io::Error| ConfigError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_failed)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(yaml.as_bytes()).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    debug!("Wrote config to {}", path.display());
    Ok(())
}
