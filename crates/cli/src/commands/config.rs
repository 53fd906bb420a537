use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use polyglot_core::config::{AppConfig, LoadOptions};
use polyglot_core::Language;
use secrecy::ExposeSecret;
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let sources = SourceResolver::detect();
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(sources.line(
        "slack.app_token",
        &redact_token(config.slack.app_token.expose_secret()),
        &["POLYGLOT_SLACK_APP_TOKEN", "SLACK_APP_TOKEN"],
    ));
    lines.push(sources.line(
        "slack.bot_token",
        &redact_token(config.slack.bot_token.expose_secret()),
        &["POLYGLOT_SLACK_BOT_TOKEN", "SLACK_BOT_TOKEN"],
    ));

    lines.push(sources.line(
        "deepl.auth_key",
        &redact_auth_key(config.deepl.auth_key.expose_secret()),
        &["POLYGLOT_DEEPL_AUTH_KEY", "DEEPL_AUTH_KEY"],
    ));
    lines.push(sources.line(
        "deepl.api_url",
        &config.deepl.endpoint(),
        &["POLYGLOT_DEEPL_API_URL"],
    ));
    lines.push(sources.line(
        "deepl.timeout_secs",
        &config.deepl.timeout_secs.to_string(),
        &["POLYGLOT_DEEPL_TIMEOUT_SECS"],
    ));

    lines.push(sources.line(
        "relay.reactions_enabled",
        &config.relay.reactions_enabled.to_string(),
        &["POLYGLOT_RELAY_REACTIONS_ENABLED"],
    ));
    lines.push(sources.line(
        "relay.auto_translate_enabled",
        &config.relay.auto_translate_enabled.to_string(),
        &["POLYGLOT_RELAY_AUTO_TRANSLATE_ENABLED"],
    ));
    let pair = config.relay.auto_translate_languages;
    lines.push(sources.line(
        "relay.auto_translate_languages",
        &join_codes(&[pair.first, pair.second]),
        &["POLYGLOT_RELAY_AUTO_TRANSLATE_LANGUAGES"],
    ));

    lines.push(sources.line(
        "runner.languages",
        &join_codes(&config.runner.languages),
        &["POLYGLOT_RUNNER_LANGUAGES", "DEEPL_RUNNER_LANGUAGES"],
    ));

    lines.push(sources.line(
        "server.bind_address",
        &config.server.bind_address,
        &["POLYGLOT_SERVER_BIND_ADDRESS"],
    ));
    lines.push(sources.line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        &["POLYGLOT_SERVER_HEALTH_CHECK_PORT"],
    ));
    lines.push(sources.line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        &["POLYGLOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    ));

    lines.push(sources.line(
        "logging.level",
        &config.logging.level,
        &["POLYGLOT_LOGGING_LEVEL", "POLYGLOT_LOG_LEVEL", "SLACK_LOG_LEVEL"],
    ));
    lines.push(sources.line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["POLYGLOT_LOGGING_FORMAT", "POLYGLOT_LOG_FORMAT"],
    ));

    CommandResult::text(0, lines.join("\n"))
}

struct SourceResolver {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl SourceResolver {
    fn detect() -> Self {
        let path = detect_config_path();
        let doc = load_config_file_doc(path.as_deref());
        Self { path, doc }
    }

    fn line(&self, key: &str, value: &str, env_keys: &[&str]) -> String {
        let source = field_source(key, env_keys, self.doc.as_ref(), self.path.as_deref());
        render_line(key, value, source)
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("polyglot.toml"), PathBuf::from("config/polyglot.toml")]
        .into_iter()
        .find(|path| path.exists())
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
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

fn join_codes(languages: &[Language]) -> String {
    languages.iter().map(|language| language.code()).collect::<Vec<_>>().join(",")
}

/// Keeps the Slack token type prefix (`xapp`, `xoxb`) and hides the rest.
pub(crate) fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

/// DeepL keys only reveal their plan suffix.
pub(crate) fn redact_auth_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        "<empty>".to_string()
    } else if trimmed.ends_with(":fx") {
        "***:fx".to_string()
    } else {
        "<redacted>".to_string()
    }
}
