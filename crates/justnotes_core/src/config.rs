//! Core runtime configuration.
//!
//! # Responsibility
//! - Resolve storage location, subscriber grace window, sample seeding and
//!   logging settings from defaults plus `JUSTNOTES_*` environment variables.
//!
//! # Invariants
//! - Resolution never touches the file system; directories are created by
//!   `db::open_db` and `logging::init_logging`.

use crate::logging::{default_log_level, normalize_level};
use crate::store::note_store::DEFAULT_SUBSCRIBER_GRACE;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_STORAGE: &str = "JUSTNOTES_STORAGE";
pub const ENV_DB_PATH: &str = "JUSTNOTES_DB_PATH";
pub const ENV_LOG_DIR: &str = "JUSTNOTES_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "JUSTNOTES_LOG_LEVEL";
pub const ENV_SUBSCRIBER_GRACE_MS: &str = "JUSTNOTES_SUBSCRIBER_GRACE_MS";
pub const ENV_SEED_SAMPLES: &str = "JUSTNOTES_SEED_SAMPLES";

const DATA_DIR_NAME: &str = ".justnotes";
const DB_FILE_NAME: &str = "notes.db";
const LOG_DIR_NAME: &str = "logs";

/// Where notes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Process-lifetime storage; nothing survives a restart.
    InMemory,
    /// SQLite database file.
    Sqlite(PathBuf),
}

/// Resolved configuration for one application process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub storage: StorageMode,
    pub subscriber_grace: Duration,
    /// Seed an empty store with the sample notes at startup.
    pub seed_samples: bool,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// - Unknown storage mode, log level or boolean spelling.
    /// - Non-numeric grace window.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let data_dir = data_dir(&get);

        let storage = match get(ENV_STORAGE).as_deref().map(str::to_ascii_lowercase) {
            Some(mode) if mode == "memory" => StorageMode::InMemory,
            None => sqlite_storage(&get, &data_dir),
            Some(mode) if mode == "sqlite" => sqlite_storage(&get, &data_dir),
            Some(other) => {
                return Err(format!(
                    "unsupported {ENV_STORAGE} `{other}`; expected memory|sqlite"
                ))
            }
        };

        let subscriber_grace = match get(ENV_SUBSCRIBER_GRACE_MS) {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|err| format!("invalid {ENV_SUBSCRIBER_GRACE_MS} `{raw}`: {err}"))?,
            None => DEFAULT_SUBSCRIBER_GRACE,
        };

        let seed_samples = match get(ENV_SEED_SAMPLES) {
            Some(raw) => parse_flag(ENV_SEED_SAMPLES, &raw)?,
            None => storage == StorageMode::InMemory,
        };

        let log_level = match get(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw)?,
            None => default_log_level(),
        };

        let log_dir = get(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(LOG_DIR_NAME));

        Ok(Self {
            storage,
            subscriber_grace,
            seed_samples,
            log_level,
            log_dir,
        })
    }
}

fn data_dir(get: &impl Fn(&str) -> Option<String>) -> PathBuf {
    get("HOME")
        .or_else(|| get("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR_NAME)
}

fn sqlite_storage(
    get: &impl Fn(&str) -> Option<String>,
    data_dir: &std::path::Path,
) -> StorageMode {
    StorageMode::Sqlite(
        get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DB_FILE_NAME)),
    )
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("invalid {key} `{other}`; expected true|false")),
    }
}
