use std::env;
use std::time::Duration;
use thiserror::Error;

/// Caller identity Ghost places in the `User-Agent` of its webhook requests.
pub const DEFAULT_EXPECTED_CALLER: &str = "https://github.com/TryGhost/Ghost";

const DEFAULT_INDEX_TIMEOUT_SECS: u64 = 10;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the search sync service.
///
/// Loaded once at startup and handed to the components that need it; nothing below `main`
/// reads the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret compared against the `key` query parameter.
    pub webhook_key: Option<String>,
    /// Reject requests that omit the `key` query parameter entirely.
    pub require_webhook_key: bool,
    /// Substring the caller's `User-Agent` must contain.
    pub expected_caller: String,
    /// Whether index synchronization is switched on.
    pub algolia_active: bool,
    /// Algolia application identifier.
    pub algolia_app_id: Option<String>,
    /// Algolia admin API key used for settings and batch writes.
    pub algolia_api_key: Option<String>,
    /// Name of the target index.
    pub algolia_index: Option<String>,
    /// Optional base URL override for the Algolia API (tests, proxies).
    pub algolia_host: Option<String>,
    /// Upper bound, in seconds, for the settings + upsert step.
    pub index_timeout_secs: u64,
    /// Post slugs that are never written to the index.
    pub ignore_slugs: Vec<String>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            webhook_key: load_env_optional("NETLIFY_KEY"),
            require_webhook_key: load_env_optional("WEBHOOK_REQUIRE_KEY")
                .map(|value| {
                    parse_bool(&value)
                        .ok_or_else(|| ConfigError::InvalidValue("WEBHOOK_REQUIRE_KEY".into()))
                })
                .transpose()?
                .unwrap_or(false),
            expected_caller: load_env_optional("WEBHOOK_EXPECTED_CALLER")
                .unwrap_or_else(|| DEFAULT_EXPECTED_CALLER.to_string()),
            algolia_active: load_env_optional("ALGOLIA_ACTIVE")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
            algolia_app_id: load_env_optional("ALGOLIA_APP_ID"),
            algolia_api_key: load_env_optional("ALGOLIA_API_KEY"),
            algolia_index: load_env_optional("ALGOLIA_INDEX"),
            algolia_host: load_env_optional("ALGOLIA_HOST"),
            index_timeout_secs: load_env_optional("ALGOLIA_TIMEOUT_SECS")
                .map(|value| {
                    value
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| ConfigError::InvalidValue("ALGOLIA_TIMEOUT_SECS".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_INDEX_TIMEOUT_SECS),
            ignore_slugs: load_env_optional("ALGOLIA_IGNORE_SLUGS")
                .map(|value| parse_list(&value))
                .unwrap_or_default(),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Timeout applied around the index-service calls.
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_key: None,
            require_webhook_key: false,
            expected_caller: DEFAULT_EXPECTED_CALLER.to_string(),
            algolia_active: false,
            algolia_app_id: None,
            algolia_api_key: None,
            algolia_index: None,
            algolia_host: None,
            index_timeout_secs: DEFAULT_INDEX_TIMEOUT_SECS,
            ignore_slugs: Vec::new(),
            server_port: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read `.env` (when present) and load the configuration from the environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        algolia_active = config.algolia_active,
        index = ?config.algolia_index,
        has_webhook_key = config.webhook_key.is_some(),
        require_webhook_key = config.require_webhook_key,
        ignored_slugs = config.ignore_slugs.len(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}

/// Fail with [`ConfigError::MissingVariable`] when a credential required for indexing is unset.
pub fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}
