use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use drill_core::GeneratorConfig;
use drill_core::model::{DEFAULT_QUESTION_CHOICES, QuizSettings};
use storage::repository::Storage;
use storage::sqlite::DEFAULT_TIMEOUT;

use crate::error::{AppError, Result};

/// Which `PerformanceStore` backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Json,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store `{other}` (expected sqlite, json or memory)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub store: StoreKind,
    pub database_url: String,
    pub json_path: PathBuf,
    pub storage_timeout: Duration,
    pub min_factor: u32,
    pub max_factor: u32,
    pub excluded_factors: Vec<u32>,
    pub question_choices: Vec<u32>,
    pub no_repeat: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:3000".to_string(),
            store: StoreKind::Sqlite,
            database_url: "sqlite://performance.sqlite3".to_string(),
            json_path: PathBuf::from("performance.json"),
            storage_timeout: DEFAULT_TIMEOUT,
            min_factor: 1,
            max_factor: 12,
            excluded_factors: Vec::new(),
            question_choices: DEFAULT_QUESTION_CHOICES.to_vec(),
            no_repeat: true,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read `DRILL_*` variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a variable that does not parse.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a variable that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            server_address: get("DRILL_SERVER_ADDRESS").unwrap_or(defaults.server_address),
            store: get_parse(&get, "DRILL_STORE")?.unwrap_or(defaults.store),
            database_url: get("DRILL_DB_URL")
                .map_or(defaults.database_url, normalize_sqlite_url),
            json_path: get("DRILL_JSON_PATH").map_or(defaults.json_path, PathBuf::from),
            storage_timeout: get_parse::<u64>(&get, "DRILL_STORAGE_TIMEOUT_MS")?
                .map_or(defaults.storage_timeout, Duration::from_millis),
            min_factor: get_parse(&get, "DRILL_MIN_FACTOR")?.unwrap_or(defaults.min_factor),
            max_factor: get_parse(&get, "DRILL_MAX_FACTOR")?.unwrap_or(defaults.max_factor),
            excluded_factors: get_list(&get, "DRILL_EXCLUDED_FACTORS")?
                .unwrap_or(defaults.excluded_factors),
            question_choices: get_list(&get, "DRILL_QUESTION_CHOICES")?
                .unwrap_or(defaults.question_choices),
            no_repeat: get_bool(&get, "DRILL_NO_REPEAT")?.unwrap_or(defaults.no_repeat),
        })
    }

    /// # Errors
    ///
    /// Returns `AppError::Config` for an unusable factor range.
    pub fn generator_config(&self) -> Result<GeneratorConfig> {
        GeneratorConfig::symmetric(
            self.min_factor,
            self.max_factor,
            self.excluded_factors.iter().copied(),
        )
        .map_err(|e| AppError::Config(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `AppError::Config` if the factor range or question choices are
    /// invalid.
    pub fn quiz_settings(&self) -> Result<QuizSettings> {
        QuizSettings::new(
            self.question_choices.iter().copied(),
            self.generator_config()?,
            self.no_repeat,
        )
        .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Open the configured store, running migrations where needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StorageUnavailable` if the backend cannot be opened.
    pub async fn open_storage(&self) -> Result<Storage> {
        let storage = match self.store {
            StoreKind::Sqlite => {
                ensure_parent_dir(&self.database_url)?;
                Storage::sqlite(&self.database_url, self.storage_timeout).await?
            }
            StoreKind::Json => Storage::json_file(&self.json_path)?,
            StoreKind::Memory => Storage::in_memory(),
        };
        tracing::info!(store = ?self.store, "performance store opened");
        Ok(storage)
    }
}

fn get_parse<T>(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AppError::Config(format!("invalid value for {name}: {e}")))
        })
        .transpose()
}

fn get_list(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<Vec<u32>>> {
    get(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<u32>().map_err(|e| {
                        AppError::Config(format!("invalid value for {name}: `{part}`: {e}"))
                    })
                })
                .collect()
        })
        .transpose()
}

fn get_bool(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<bool>> {
    get(name)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::Config(format!(
                "invalid value for {name}: `{other}` is not a boolean"
            ))),
        })
        .transpose()
}

/// Turns a bare path or `sqlite:` path into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }
    if trimmed.starts_with("sqlite:file:") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn ensure_parent_dir(db_url: &str) -> Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(AppError::Config(format!("invalid database url: {db_url}")));
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::StorageUnavailable(format!("{}: {e}", parent.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_address, "127.0.0.1:3000");
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.storage_timeout, Duration::from_secs(5));
        assert_eq!(config.question_choices, vec![5, 10, 15, 20, 50, 100]);
        assert!(config.no_repeat);
        assert_eq!(config.generator_config().unwrap().domain_size(), 144);
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("DRILL_STORE", "json"),
            ("DRILL_JSON_PATH", "/tmp/p.json"),
            ("DRILL_MIN_FACTOR", "2"),
            ("DRILL_MAX_FACTOR", "12"),
            ("DRILL_EXCLUDED_FACTORS", "10, 11"),
            ("DRILL_QUESTION_CHOICES", "5,10,20,50"),
            ("DRILL_NO_REPEAT", "off"),
            ("DRILL_STORAGE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::Json);
        assert_eq!(config.json_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.excluded_factors, vec![10, 11]);
        assert!(!config.no_repeat);
        assert_eq!(config.storage_timeout, Duration::from_millis(250));
        assert_eq!(config.generator_config().unwrap().domain_size(), 81);
        assert!(config.quiz_settings().unwrap().allows(20));
    }

    #[test]
    fn bad_values_are_config_errors() {
        for (name, value) in [
            ("DRILL_STORE", "postgres"),
            ("DRILL_MAX_FACTOR", "twelve"),
            ("DRILL_NO_REPEAT", "maybe"),
            ("DRILL_QUESTION_CHOICES", "5,x"),
        ] {
            assert!(
                matches!(
                    Config::from_lookup(lookup(&[(name, value)])),
                    Err(AppError::Config(_))
                ),
                "{name}={value}"
            );
        }

        let config = Config::from_lookup(lookup(&[("DRILL_MIN_FACTOR", "0")])).unwrap();
        assert!(matches!(config.generator_config(), Err(AppError::Config(_))));
    }

    #[test]
    fn sqlite_urls_are_normalized() {
        assert_eq!(
            normalize_sqlite_url("sqlite://a/b.db".into()),
            "sqlite://a/b.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("/var/drill.db".into()),
            "sqlite:///var/drill.db"
        );
        assert!(normalize_sqlite_url("drill.db".into()).ends_with("/drill.db"));
    }

    #[tokio::test]
    async fn memory_store_opens() {
        let config = Config {
            store: StoreKind::Memory,
            ..Config::default()
        };
        let storage = config.open_storage().await.unwrap();
        assert!(storage.performance.get_all().await.unwrap().is_empty());
    }
}
