//! Configuration module for ontomap.
//!
//! Handles the config file, database connection settings, and the
//! `DB_{N}_*` environment fallback.

mod database;
mod settings;

pub use database::{DatabaseSettings, DEFAULT_PORT};
pub use settings::{
    expand_env_vars, CacheSettings, CatalogSettings, LineageSettings, OutputSettings,
    ServerSettings, Settings, SettingsError, CONFIG_ENV_VAR, SNAPSHOT_FILE,
};
