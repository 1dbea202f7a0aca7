use std::fs;
use std::path::Path;

use ordertrack_core::config::{read_env, resolve_config_path, LoadOptions};
use toml::Value;

use super::{load_config, CommandResult};

const COMMAND: &str = "config";

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let keywords = config
        .resolver
        .keywords
        .iter()
        .map(|(keyword, weight)| format!("{keyword}:{weight}"))
        .collect::<Vec<_>>()
        .join(",");

    let fields: [(&str, String, &[&str]); 11] = [
        ("database.url", config.database.url.clone(), &["ORDERTRACK_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["ORDERTRACK_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["ORDERTRACK_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["ORDERTRACK_LOGGING_LEVEL", "ORDERTRACK_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["ORDERTRACK_LOGGING_FORMAT", "ORDERTRACK_LOG_FORMAT"],
        ),
        (
            "resolver.display_limit",
            config.resolver.display_limit.to_string(),
            &["ORDERTRACK_RESOLVER_DISPLAY_LIMIT"],
        ),
        (
            "resolver.recent_limit",
            config.resolver.recent_limit.to_string(),
            &["ORDERTRACK_RESOLVER_RECENT_LIMIT"],
        ),
        (
            "resolver.date_match_weight",
            config.resolver.date_match_weight.to_string(),
            &["ORDERTRACK_RESOLVER_DATE_MATCH_WEIGHT"],
        ),
        (
            "resolver.fuzzy_overlap_weight",
            config.resolver.fuzzy_overlap_weight.to_string(),
            &["ORDERTRACK_RESOLVER_FUZZY_OVERLAP_WEIGHT"],
        ),
        (
            "resolver.min_fuzzy_word_len",
            config.resolver.min_fuzzy_word_len.to_string(),
            &["ORDERTRACK_RESOLVER_MIN_FUZZY_WORD_LEN"],
        ),
        ("resolver.keywords", keywords, &[]),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in fields {
        lines.push(render_line(key_path, &value, source(key_path, env_keys)));
    }

    CommandResult::success(COMMAND, lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| read_env(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
