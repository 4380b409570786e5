//! TOML-based configuration for ontomap.
//!
//! Supports a config file (ontomap.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [[databases]]
//! name = "shop"
//! host = "db1.internal"
//! user = "reader"
//! password = "${SHOP_DB_PASSWORD}"
//!
//! [[databases]]
//! name = "crm"
//! host = "db2.internal"
//! port = 3307
//! user = "reader"
//! password = "${CRM_DB_PASSWORD}"
//!
//! [catalog]
//! dir = "./catalog"
//!
//! [output]
//! dir = "./output"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [lineage]
//! default_depth = 2
//! max_depth = 10
//!
//! [cache]
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::database::DatabaseSettings;

/// File name of the ontology snapshot inside the output directory.
pub const SNAPSHOT_FILE: &str = "ontology.json";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ONTOMAP_CONFIG";

const LOCAL_CONFIG_FILE: &str = "ontomap.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Database configured more than once: {0}")]
    DuplicateDatabase(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Databases to extract, in extraction order.
    pub databases: Vec<DatabaseSettings>,

    /// Catalog dump location.
    pub catalog: CatalogSettings,

    /// Snapshot output.
    pub output: OutputSettings,

    /// HTTP API.
    pub server: ServerSettings,

    /// Lineage depth limits.
    pub lineage: LineageSettings,

    /// Metadata cache.
    pub cache: CacheSettings,
}

/// Where catalog dumps (`<database>.json`) are read from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub dir: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("catalog"),
        }
    }
}

/// Snapshot output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

impl OutputSettings {
    /// Path of the ontology snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Lineage traversal limits.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct LineageSettings {
    /// Depth used when a request does not name one.
    pub default_depth: usize,

    /// Requests asking for more are clamped to this.
    pub max_depth: usize,
}

impl Default for LineageSettings {
    fn default() -> Self {
        Self {
            default_depth: 2,
            max_depth: 10,
        }
    }
}

impl LineageSettings {
    /// Resolve a requested depth against the configured limits.
    pub fn effective_depth(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_depth)
            .min(self.max_depth)
    }
}

/// Metadata cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Enable metadata caching.
    pub enabled: bool,

    /// Cache database file; defaults to `~/.ontomap/cache.db`.
    pub path: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Settings {
    /// Parse one TOML file without any fallback or validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        debug!(path = %path.display(), databases = settings.databases.len(), "Loaded config file");
        Ok(settings)
    }

    /// Find and load the config, then apply the environment fallback.
    ///
    /// Looks in order at:
    /// 1. the file named by `ONTOMAP_CONFIG`
    /// 2. `./ontomap.toml`
    /// 3. `~/.config/ontomap/config.toml`
    ///
    /// Credentials in the file have `${VAR}` references expanded. When no
    /// databases are configured, `DB_{N}_*` environment variables are used
    /// instead.
    pub fn load() -> Result<Self, SettingsError> {
        Self::finish(Self::load_file()?)
    }

    /// Load an explicit config file, applying the same environment
    /// fallback and validation as [`Settings::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        Self::finish(Self::from_file(path)?)
    }

    fn finish(mut settings: Settings) -> Result<Self, SettingsError> {
        for db in &mut settings.databases {
            db.user = expand_env_vars(&db.user)?;
            db.password = expand_env_vars(&db.password)?;
        }
        if settings.databases.is_empty() {
            settings.databases = DatabaseSettings::from_env();
            if !settings.databases.is_empty() {
                info!(
                    databases = settings.databases.len(),
                    "Using databases from DB_{{N}} environment variables"
                );
            }
        }
        settings.validate()?;
        Ok(settings)
    }

    fn load_file() -> Result<Self, SettingsError> {
        // An explicit path must exist; the implicit locations are optional
        if let Some(explicit) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(explicit));
        }

        let implicit = [
            Some(PathBuf::from(LOCAL_CONFIG_FILE)),
            dirs::config_dir().map(|dir| dir.join("ontomap").join("config.toml")),
        ];
        match implicit.into_iter().flatten().find(|path| path.exists()) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Check the invariants later stages rely on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut names = HashSet::new();
        for db in &self.databases {
            if db.name.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!(
                    "database on {} has an empty name",
                    db.host
                )));
            }
            if !names.insert(db.name.as_str()) {
                return Err(SettingsError::DuplicateDatabase(db.name.clone()));
            }
        }

        let lineage = &self.lineage;
        if lineage.max_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "lineage.max_depth must be at least 1".to_string(),
            ));
        }
        if lineage.default_depth == 0 || lineage.default_depth > lineage.max_depth {
            return Err(SettingsError::InvalidConfig(format!(
                "lineage.default_depth must be between 1 and {}",
                lineage.max_depth
            )));
        }
        Ok(())
    }

    /// Get a database by name.
    pub fn database(&self, name: &str) -> Option<&DatabaseSettings> {
        self.databases.iter().find(|db| db.name == name)
    }

    /// Configured cache file. `None` leaves the choice to the cache itself.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.path.clone()
    }
}

/// Substitute `${VAR}` and `$VAR` references with environment values.
///
/// A `$` not followed by a name is kept as is. Referencing an unset
/// variable is an error rather than an empty substitution.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name = std::iter::from_fn(|| chars.next_if(|ch| *ch != '}')).collect();
            chars.next();
            name
        } else {
            // bare names stop at the first character outside [A-Za-z0-9_]
            std::iter::from_fn(|| chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_')).collect()
        };

        if var_name.is_empty() {
            result.push('$');
            continue;
        }

        match env::var(&var_name) {
            Ok(value) => result.push_str(&value),
            Err(_) => return Err(SettingsError::MissingEnvVar(var_name)),
        }
    }

    Ok(result)
}
