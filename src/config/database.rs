//! Per-database connection settings.
//!
//! Databases come from `[[databases]]` entries in the config file or, when
//! none are configured, from numbered environment variables:
//! - `DB_{N}_HOST`, `DB_{N}_NAME`, `DB_{N}_USER`, `DB_{N}_PASSWORD` (required)
//! - `DB_{N}_PORT` (optional, defaults to 3306)

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

static DB_ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^DB_(\d+)_(.+)$").unwrap());

pub const DEFAULT_PORT: u16 = 3306;

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Connection settings for one database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseSettings {
    /// Position in the `DB_{N}_*` numbering, when loaded from the environment.
    #[serde(default)]
    pub id: Option<u32>,

    /// Database (schema) name; must be unique across the configuration.
    pub name: String,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Catalog credentials. Required for `DB_{N}` entries, carried for
    /// sources that open a live connection.
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl DatabaseSettings {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `name@host:port`, used in logs and error messages.
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}", self.name, self.host, self.port)
    }

    /// Read `DB_{N}_*` variables from the process environment.
    pub fn from_env() -> Vec<Self> {
        Self::from_vars(env::vars())
    }

    /// Group `DB_{N}_{FIELD}` pairs by `N` (ascending) into database settings.
    ///
    /// Groups missing a required field, or with an unparsable port, are
    /// skipped with a warning.
    pub fn from_vars<I, K, V>(vars: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut groups: BTreeMap<u32, HashMap<String, String>> = BTreeMap::new();
        for (key, value) in vars {
            let Some(captures) = DB_ENV_VAR.captures(key.as_ref()) else {
                continue;
            };
            let Ok(id) = captures[1].parse::<u32>() else {
                continue;
            };
            groups
                .entry(id)
                .or_default()
                .insert(captures[2].to_lowercase(), value.into());
        }

        groups
            .into_iter()
            .filter_map(|(id, mut fields)| {
                let missing: Vec<&str> = ["host", "name", "user", "password"]
                    .into_iter()
                    .filter(|field| !fields.contains_key(*field))
                    .collect();
                if !missing.is_empty() {
                    warn!(id, missing = ?missing, "Skipping incomplete DB_{{N}} configuration");
                    return None;
                }

                let port = match fields.remove("port") {
                    None => DEFAULT_PORT,
                    Some(raw) => match raw.trim().parse() {
                        Ok(port) => port,
                        Err(_) => {
                            warn!(id, port = %raw, "Skipping DB_{{N}} configuration with invalid port");
                            return None;
                        }
                    },
                };

                Some(Self {
                    id: Some(id),
                    name: fields.remove("name").unwrap_or_default(),
                    host: fields.remove("host").unwrap_or_default(),
                    port,
                    user: fields.remove("user").unwrap_or_default(),
                    password: fields.remove("password").unwrap_or_default(),
                })
            })
            .collect()
    }
}
