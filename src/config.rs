//! Configuration types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Where finalized responses are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// One JSON document per template in the responses directory.
    #[default]
    Files,
    /// A libSQL database file.
    LibSql,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "files" | "json" => Ok(Self::Files),
            "libsql" | "sqlite" => Ok(Self::LibSql),
            other => Err(ConfigError::InvalidValue {
                key: "INTERVIEW_STORE".to_string(),
                message: format!("unknown store backend '{other}' (expected files or libsql)"),
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Files => write!(f, "files"),
            Self::LibSql => write!(f, "libsql"),
        }
    }
}

/// Runtime configuration for the interview bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Directory of `*.json` template definitions.
    pub templates_dir: PathBuf,
    /// Directory the file store writes responses into.
    pub responses_dir: PathBuf,
    pub store: StoreBackend,
    /// Database file for the libSQL store.
    pub db_path: PathBuf,
    pub http_port: u16,
    /// Sessions idle longer than this are pruned. `None` keeps them forever.
    pub session_idle_timeout: Option<Duration>,
    /// Whether to read turns from stdin.
    pub cli_enabled: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("./Templates"),
            responses_dir: PathBuf::from("./Responses"),
            store: StoreBackend::Files,
            db_path: PathBuf::from("./data/interview-bot.db"),
            http_port: 3978,
            session_idle_timeout: None,
            cli_enabled: true,
        }
    }
}

impl BotConfig {
    /// Read configuration from `INTERVIEW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults; an unknown store
    /// backend is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store = match lookup("INTERVIEW_STORE") {
            Some(value) => StoreBackend::parse(&value)?,
            None => defaults.store,
        };

        let http_port: u16 = lookup("INTERVIEW_HTTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_port);

        let session_idle_timeout = lookup("INTERVIEW_SESSION_IDLE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let cli_enabled = lookup("INTERVIEW_CLI")
            .map(|v| !matches!(v.trim(), "0" | "false" | "off"))
            .unwrap_or(defaults.cli_enabled);

        Ok(Self {
            templates_dir: lookup("INTERVIEW_TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_dir),
            responses_dir: lookup("INTERVIEW_RESPONSES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.responses_dir),
            store,
            db_path: lookup("INTERVIEW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            http_port,
            session_idle_timeout,
            cli_enabled,
        })
    }
}
