//! Configuration management for the bot.
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present) with defaults for everything but the wiki endpoints and
//! credentials.

use fe_slots_core::codec::TicketMacro;
use fe_slots_core::registry::DEFAULT_RESERVED_BY;
use std::time::Duration;
use thiserror::Error;

/// Read endpoint: the page's JSON representation
pub const WIKI_JSON_URL: &str = "FES_WIKI_JSON_URL";
/// The page's edit view
pub const WIKI_EDIT_URL: &str = "FES_WIKI_EDIT_URL";
/// Basic-auth user
pub const WIKI_USER: &str = "FES_WIKI_USER";
/// Basic-auth password
pub const WIKI_PASS: &str = "FES_WIKI_PASS";
/// Ticket macro as `name:key`
pub const TICKET_MACRO: &str = "FES_TICKET_MACRO";
/// Name written into the reserved-by annotation
pub const BOT_NAME: &str = "FES_BOT_NAME";
/// Per-request HTTP timeout in seconds
pub const HTTP_TIMEOUT_SECS: &str = "FES_HTTP_TIMEOUT_SECS";
/// Serialize reserve/release inside this process
pub const SERIALIZE_WRITES: &str = "FES_SERIALIZE_WRITES";
/// How long to drain in-flight operations on exit, in seconds
pub const SHUTDOWN_TIMEOUT_SECS: &str = "FES_SHUTDOWN_TIMEOUT_SECS";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Wiki endpoint and credentials
#[derive(Clone)]
pub struct WikiConfig {
    /// JSON read endpoint
    pub json_url: String,
    /// Edit page URL
    pub edit_url: String,
    /// Basic-auth user
    pub user: String,
    /// Basic-auth password
    pub password: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for WikiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiConfig")
            .field("json_url", &self.json_url)
            .field("edit_url", &self.edit_url)
            .field("user", &self.user)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wiki access
    pub wiki: WikiConfig,
    /// Macro used for ticket references in the board
    pub ticket_macro: TicketMacro,
    /// Name used in the reserved-by annotation
    pub bot_name: String,
    /// Hold a process-wide lock across each write cycle
    pub serialize_writes: bool,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment, after reading `.env`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or any value
    /// is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let wiki = WikiConfig {
            json_url: http_url(WIKI_JSON_URL, required(WIKI_JSON_URL)?)?,
            edit_url: http_url(WIKI_EDIT_URL, required(WIKI_EDIT_URL)?)?,
            user: required(WIKI_USER)?,
            password: required(WIKI_PASS)?,
            timeout: seconds(HTTP_TIMEOUT_SECS, get(HTTP_TIMEOUT_SECS), 30)?,
        };

        let ticket_macro = match get(TICKET_MACRO) {
            Some(spec) => TicketMacro::from_spec(&spec).ok_or_else(|| ConfigError::Invalid {
                name: TICKET_MACRO,
                reason: format!("expected name:key, got {spec}"),
            })?,
            None => TicketMacro::default(),
        };

        let serialize_writes = match get(SERIALIZE_WRITES) {
            Some(flag) => flag_value(SERIALIZE_WRITES, &flag)?,
            None => false,
        };

        Ok(Self {
            wiki,
            ticket_macro,
            bot_name: get(BOT_NAME).unwrap_or_else(|| DEFAULT_RESERVED_BY.to_string()),
            serialize_writes,
            shutdown_timeout: seconds(SHUTDOWN_TIMEOUT_SECS, get(SHUTDOWN_TIMEOUT_SECS), 30)?,
        })
    }
}

fn http_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: format!("{value} is not an http(s) URL"),
        })
    }
}

fn seconds(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };

    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

fn flag_value(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}
