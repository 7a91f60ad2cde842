//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Which durable store holds the results sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Csv,
    LibSql,
}

impl StoreBackend {
    fn default_path(&self) -> PathBuf {
        match self {
            Self::Csv => PathBuf::from("./data/HoneyTrack_Data.csv"),
            Self::LibSql => PathBuf::from("./data/honeytrack.db"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "libsql" | "sqlite" => Ok(Self::LibSql),
            other => Err(ConfigError::InvalidValue {
                key: "HONEYPATH_STORE".into(),
                message: format!("unknown backend {other:?} (expected csv or libsql)"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot name for identification in logs.
    pub name: String,
    /// Telegram Bot API token. Telegram is disabled when unset.
    pub telegram_token: Option<SecretString>,
    /// Whether to read answers from stdin as a local user.
    pub cli_enabled: bool,
    pub store: StoreConfig,
    /// JSON quiz definition; the built-in quiz is used when unset.
    pub quiz_file: Option<PathBuf>,
    /// Per-user workers exit after this long without messages.
    pub worker_idle_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "honeypath".to_string(),
            telegram_token: None,
            cli_enabled: true,
            store: StoreConfig {
                backend: StoreBackend::Csv,
                path: StoreBackend::Csv.default_path(),
            },
            quiz_file: None,
            worker_idle_timeout: Duration::from_secs(600), // 10 minutes
        }
    }
}

impl BotConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup (environment, test fixtures).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // BOT_TOKEN is the older name still found in deployed .env files.
        let telegram_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .map(SecretString::from);

        let cli_enabled = match get("HONEYPATH_CLI") {
            Some(v) => parse_bool("HONEYPATH_CLI", &v)?,
            None => telegram_token.is_none(),
        };

        let backend: StoreBackend = match get("HONEYPATH_STORE") {
            Some(v) => v.parse()?,
            None => StoreBackend::Csv,
        };
        let path = get("HONEYPATH_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| backend.default_path());

        let worker_idle_timeout = match get("HONEYPATH_WORKER_IDLE_SECS") {
            Some(v) => {
                let secs: u64 = v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "HONEYPATH_WORKER_IDLE_SECS".into(),
                    message: format!("{v:?} is not a whole number of seconds"),
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => Self::default().worker_idle_timeout,
        };

        Ok(Self {
            telegram_token,
            cli_enabled,
            store: StoreConfig { backend, path },
            quiz_file: get("HONEYPATH_QUIZ_FILE").map(PathBuf::from),
            worker_idle_timeout,
            ..Self::default()
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value:?} is not a boolean"),
        }),
    }
}
