// ABOUTME: Checker configuration resolved from environment, .env and TOML file
// ABOUTME: Environment values override file values; CLI flags override both

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CheckError, Result};

pub const DEFAULT_SQLITE_PATH: &str = "./db.sqlite";
pub const DEFAULT_SEARCH_PATH: &str = "content";
pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Connection settings for the target PostgreSQL database.
///
/// The five credential fields correspond one-to-one to the recognized
/// environment variables `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_HOST`
/// and `DB_PORT`. The search path is file-configurable only and defaults
/// to the `content` schema the migrated tables live in.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub search_path: String,
}

/// Fully resolved configuration for one check run.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Path to the legacy SQLite file.
    pub sqlite_path: PathBuf,
    /// Rows fetched per page during the data comparison.
    pub batch_size: u64,
    pub target: TargetConfig,
}

/// Raw shape of the optional TOML config file; every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub sqlite_path: Option<PathBuf>,
    pub batch_size: Option<u64>,
    #[serde(default)]
    pub target: PartialTarget,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialTarget {
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub search_path: Option<String>,
}

impl FileConfig {
    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CheckError::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| {
            CheckError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }
}

impl CheckerConfig {
    /// Resolve configuration from an optional TOML file plus the process
    /// environment.
    ///
    /// # Errors
    ///
    /// A non-integer `DB_PORT` and any of the five target settings left
    /// unresolved are configuration errors; the latter lists every
    /// missing key at once.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let raw = match file {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(raw, |key| std::env::var(key).ok())
    }

    /// Resolution core with an injected environment lookup, so tests can
    /// supply key/value closures instead of mutating the process
    /// environment.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let target = file.target;

        let port = match env("DB_PORT") {
            Some(text) => Some(parse_port(&text)?),
            None => target.port,
        };
        let dbname = env("DB_NAME").or(target.dbname);
        let user = env("DB_USER").or(target.user);
        let password = env("DB_PASSWORD").or(target.password);
        let host = env("DB_HOST").or(target.host);

        match (dbname, user, password, host, port) {
            (Some(dbname), Some(user), Some(password), Some(host), Some(port)) => Ok(Self {
                sqlite_path: file
                    .sqlite_path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
                batch_size: file.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
                target: TargetConfig {
                    dbname,
                    user,
                    password,
                    host,
                    port,
                    search_path: target
                        .search_path
                        .unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_string()),
                },
            }),
            (dbname, user, password, host, port) => {
                let mut missing = Vec::new();
                if dbname.is_none() {
                    missing.push("DB_NAME");
                }
                if user.is_none() {
                    missing.push("DB_USER");
                }
                if password.is_none() {
                    missing.push("DB_PASSWORD");
                }
                if host.is_none() {
                    missing.push("DB_HOST");
                }
                if port.is_none() {
                    missing.push("DB_PORT");
                }
                Err(CheckError::Config(format!(
                    "missing target database settings: {} (set the environment variables or put them in a config file)",
                    missing.join(", ")
                )))
            }
        }
    }
}

fn parse_port(text: &str) -> Result<u16> {
    text.trim().parse::<u16>().map_err(|_| {
        CheckError::Config(format!("DB_PORT must be an integer port, got '{}'", text))
    })
}

/// Load a `.env` file before the environment is read.
///
/// An explicitly requested file must exist; the implicit `./.env` is
/// loaded only when present.
pub fn load_dotenv(explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                CheckError::Config(format!("cannot load env file {}: {}", path.display(), e))
            })?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}
