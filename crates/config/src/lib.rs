//! Layered configuration for gutensync.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, or YAML/JSON by extension),
//! 3. environment variables prefixed `GUTENSYNC_`, with `__` separating
//!    nested keys (`GUTENSYNC_DATABASE__BACKEND=memory`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use gutensync_library::{DEFAULT_EXCLUSION, ExistenceStrategy, IdentifierScheme};
use gutensync_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "GUTENSYNC_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "catalog.sqlite";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "gutenberg", "gutensync")
}

/// `config.toml` in the platform configuration directory, if there is one.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// `catalog.sqlite` in the platform data directory, falling back to the
/// working directory.
pub fn default_database_path() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE)).unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub database: StoreConfig,
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            database: StoreConfig::Sqlite {
                path: default_database_path(),
            },
            sync: SyncConfig::default(),
        }
    }
}

/// Where the catalog documents live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding one subdirectory per book.
    pub root: Option<PathBuf>,
    pub prefix: String,
    pub extension: String,
    /// Case-insensitive marker; entries containing it are ignored.
    pub exclusion: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let scheme = IdentifierScheme::default();
        Self {
            root: None,
            prefix: scheme.prefix,
            extension: scheme.extension,
            exclusion: DEFAULT_EXCLUSION.to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn scheme(&self) -> IdentifierScheme {
        IdentifierScheme::new(&self.prefix, &self.extension, &self.exclusion)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub existence: ExistenceStrategy,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            existence: ExistenceStrategy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Every configuration source, merged but not yet extracted.
    ///
    /// With no explicit `path`, the default configuration file is used if it
    /// exists.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = Self::source_file(path)? {
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// The configuration file [`figment`](Self::figment) reads, if any: the
    /// explicit `path`, or the default file when it exists.
    ///
    /// # Errors
    /// [`ErrorKind::Missing`] if an explicit `path` is not a file.
    pub fn source_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::Missing(path.to_path_buf())),
            Some(path) => Ok(Some(path.to_path_buf())),
            None => Ok(default_config_path().filter(|p| p.is_file())),
        }
    }

    /// Load and validate the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.exclusion.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("catalog.exclusion"));
        }
        if self.sync.log_level.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("sync.log_level"));
        }
        if let StoreConfig::Sqlite { path } = &self.database
            && (path.as_os_str().is_empty() || path.is_dir())
        {
            exn::bail!(ErrorKind::Invalid("database.path"));
        }
        Ok(())
    }

    /// The configured catalog root, or [`ErrorKind::Invalid`] if none is set.
    pub fn catalog_root(&self) -> Result<&Path> {
        self.catalog.root.as_deref().ok_or_raise(|| ErrorKind::Invalid("catalog.root"))
    }

    /// Create the directory that will hold the SQLite database.
    pub fn ensure_database_dir(&self) -> Result<()> {
        if let StoreConfig::Sqlite { path } = &self.database
            && let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Invalid("database.path"))?;
        }
        Ok(())
    }
}
