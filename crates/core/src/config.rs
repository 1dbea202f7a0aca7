use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::scoring::{
    ScoringPolicy, DEFAULT_DATE_MATCH_WEIGHT, DEFAULT_FUZZY_OVERLAP_WEIGHT, DEFAULT_KEYWORDS,
    DEFAULT_KEYWORD_WEIGHT, DEFAULT_MIN_FUZZY_WORD_LEN,
};
use crate::resolver::summary::DEFAULT_DISPLAY_LIMIT;
use crate::resolver::{OrderResolver, DEFAULT_RECENT_LIMIT};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub resolver: ResolverConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    pub display_limit: usize,
    pub recent_limit: usize,
    pub date_match_weight: u32,
    pub fuzzy_overlap_weight: u32,
    pub min_fuzzy_word_len: usize,
    pub keywords: BTreeMap<String, u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub display_limit: Option<usize>,
    pub recent_limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://ordertrack.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            resolver: ResolverConfig::default(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            display_limit: DEFAULT_DISPLAY_LIMIT,
            recent_limit: DEFAULT_RECENT_LIMIT,
            date_match_weight: DEFAULT_DATE_MATCH_WEIGHT,
            fuzzy_overlap_weight: DEFAULT_FUZZY_OVERLAP_WEIGHT,
            min_fuzzy_word_len: DEFAULT_MIN_FUZZY_WORD_LEN,
            keywords: DEFAULT_KEYWORDS
                .iter()
                .map(|keyword| ((*keyword).to_string(), DEFAULT_KEYWORD_WEIGHT))
                .collect(),
        }
    }
}

impl ResolverConfig {
    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            keywords: self
                .keywords
                .iter()
                .map(|(keyword, weight)| (keyword.trim().to_lowercase(), *weight))
                .collect(),
            date_match_weight: self.date_match_weight,
            fuzzy_overlap_weight: self.fuzzy_overlap_weight,
            min_fuzzy_word_len: self.min_fuzzy_word_len,
        }
    }

    pub fn build_resolver(&self) -> OrderResolver {
        OrderResolver::new(self.scoring_policy()).with_recent_limit(self.recent_limit)
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("ordertrack.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(resolver) = patch.resolver {
            if let Some(display_limit) = resolver.display_limit {
                self.resolver.display_limit = display_limit;
            }
            if let Some(recent_limit) = resolver.recent_limit {
                self.resolver.recent_limit = recent_limit;
            }
            if let Some(date_match_weight) = resolver.date_match_weight {
                self.resolver.date_match_weight = date_match_weight;
            }
            if let Some(fuzzy_overlap_weight) = resolver.fuzzy_overlap_weight {
                self.resolver.fuzzy_overlap_weight = fuzzy_overlap_weight;
            }
            if let Some(min_fuzzy_word_len) = resolver.min_fuzzy_word_len {
                self.resolver.min_fuzzy_word_len = min_fuzzy_word_len;
            }
            // A configured vocabulary replaces the built-in one wholesale.
            if let Some(keywords) = resolver.keywords {
                self.resolver.keywords = keywords;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ORDERTRACK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ORDERTRACK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("ORDERTRACK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ORDERTRACK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ORDERTRACK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("ORDERTRACK_LOGGING_LEVEL").or_else(|| read_env("ORDERTRACK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ORDERTRACK_LOGGING_FORMAT").or_else(|| read_env("ORDERTRACK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("ORDERTRACK_RESOLVER_DISPLAY_LIMIT") {
            self.resolver.display_limit =
                parse_usize("ORDERTRACK_RESOLVER_DISPLAY_LIMIT", &value)?;
        }
        if let Some(value) = read_env("ORDERTRACK_RESOLVER_RECENT_LIMIT") {
            self.resolver.recent_limit = parse_usize("ORDERTRACK_RESOLVER_RECENT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("ORDERTRACK_RESOLVER_DATE_MATCH_WEIGHT") {
            self.resolver.date_match_weight =
                parse_u32("ORDERTRACK_RESOLVER_DATE_MATCH_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("ORDERTRACK_RESOLVER_FUZZY_OVERLAP_WEIGHT") {
            self.resolver.fuzzy_overlap_weight =
                parse_u32("ORDERTRACK_RESOLVER_FUZZY_OVERLAP_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("ORDERTRACK_RESOLVER_MIN_FUZZY_WORD_LEN") {
            self.resolver.min_fuzzy_word_len =
                parse_usize("ORDERTRACK_RESOLVER_MIN_FUZZY_WORD_LEN", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(display_limit) = overrides.display_limit {
            self.resolver.display_limit = display_limit;
        }
        if let Some(recent_limit) = overrides.recent_limit {
            self.resolver.recent_limit = recent_limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_logging(&self.logging)?;
        validate_resolver(&self.resolver)?;
        Ok(())
    }
}

/// Config files probed when no explicit path is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["ordertrack.toml", "config/ordertrack.toml"];

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_resolver(resolver: &ResolverConfig) -> Result<(), ConfigError> {
    if resolver.display_limit == 0 {
        return Err(ConfigError::Validation(
            "resolver.display_limit must be greater than zero".to_string(),
        ));
    }

    if resolver.recent_limit == 0 {
        return Err(ConfigError::Validation(
            "resolver.recent_limit must be greater than zero".to_string(),
        ));
    }

    if let Some(keyword) = resolver.keywords.keys().find(|keyword| keyword.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "resolver.keywords contains an empty keyword (`{keyword}`)"
        )));
    }

    if let Some((keyword, _)) = resolver.keywords.iter().find(|(_, weight)| **weight == 0) {
        return Err(ConfigError::Validation(format!(
            "resolver.keywords weight for `{keyword}` must be greater than zero"
        )));
    }

    Ok(())
}

/// Reads an env override. Blank values count as unset.
pub fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
    resolver: Option<ResolverPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ResolverPatch {
    display_limit: Option<usize>,
    recent_limit: Option<usize>,
    date_match_weight: Option<u32>,
    fuzzy_overlap_weight: Option<u32>,
    min_fuzzy_word_len: Option<usize>,
    keywords: Option<BTreeMap<String, u32>>,
}
