use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::LanguagePair;
use crate::languages::Language;

pub const DEFAULT_RUNNER_LANGUAGES: &str =
    "en,ja,zh,de,fr,it,es,nl,pl,pt,ru,bg,cs,da,el,et,fi,hu,id,lt,ro,sk,sl,sv,tr,uk";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub deepl: DeepLConfig,
    pub relay: RelayConfig,
    pub runner: RunnerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub app_token: SecretString,
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct DeepLConfig {
    pub auth_key: SecretString,
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub reactions_enabled: bool,
    pub auto_translate_enabled: bool,
    pub auto_translate_languages: LanguagePair,
}

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub languages: Vec<Language>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub log_level: Option<String>,
    pub slack_app_token: Option<String>,
    pub slack_bot_token: Option<String>,
    pub deepl_auth_key: Option<String>,
    pub deepl_api_url: Option<String>,
    pub reactions_enabled: Option<bool>,
    pub auto_translate_enabled: Option<bool>,
    pub runner_languages: Option<String>,
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
    #[error("could not read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig { app_token: String::new().into(), bot_token: String::new().into() },
            deepl: DeepLConfig { auth_key: String::new().into(), api_url: None, timeout_secs: 30 },
            relay: RelayConfig {
                reactions_enabled: true,
                auto_translate_enabled: true,
                auto_translate_languages: LanguagePair::default(),
            },
            runner: RunnerConfig { languages: parse_language_list(DEFAULT_RUNNER_LANGUAGES) },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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

impl DeepLConfig {
    /// Explicit API URL, or the free/pro host implied by the key suffix.
    pub fn endpoint(&self) -> String {
        if let Some(url) = self.api_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        if self.auth_key.expose_secret().trim().ends_with(":fx") {
            "https://api-free.deepl.com".to_string()
        } else {
            "https://api.deepl.com".to_string()
        }
    }
}

/// Loads `.env` from the working directory, or `path` when given, into the
/// process environment. Variables already set keep their values. A missing
/// file is not an error.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(error) if error.not_found() => Ok(None),
        Err(error) => Err(error.into()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Interpolation {
    Strict,
    /// Unset variables expand to an empty string.
    Lenient,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let config = Self::resolve(options, Interpolation::Strict)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the same layers as [`AppConfig::load`] but validates only the
    /// `deepl` section, for callers that never talk to Slack.
    pub fn load_deepl(options: LoadOptions) -> Result<DeepLConfig, ConfigError> {
        let config = Self::resolve(options, Interpolation::Lenient)?;
        validate_deepl(&config.deepl)?;
        Ok(config.deepl)
    }

    fn resolve(options: LoadOptions, interpolation: Interpolation) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path, interpolation)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("polyglot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(slack_app_token_value) = slack.app_token {
                self.slack.app_token = secret_value(slack_app_token_value);
            }
            if let Some(slack_bot_token_value) = slack.bot_token {
                self.slack.bot_token = secret_value(slack_bot_token_value);
            }
        }

        if let Some(deepl) = patch.deepl {
            if let Some(auth_key) = deepl.auth_key {
                self.deepl.auth_key = secret_value(auth_key);
            }
            if let Some(api_url) = deepl.api_url {
                self.deepl.api_url = Some(api_url);
            }
            if let Some(timeout_secs) = deepl.timeout_secs {
                self.deepl.timeout_secs = timeout_secs;
            }
        }

        if let Some(relay) = patch.relay {
            if let Some(reactions_enabled) = relay.reactions_enabled {
                self.relay.reactions_enabled = reactions_enabled;
            }
            if let Some(auto_translate_enabled) = relay.auto_translate_enabled {
                self.relay.auto_translate_enabled = auto_translate_enabled;
            }
            if let Some([first, second]) = relay.auto_translate_languages {
                self.relay.auto_translate_languages = LanguagePair::new(first, second);
            }
        }

        if let Some(runner) = patch.runner {
            if let Some(languages) = runner.languages {
                self.runner.languages = parse_language_list(&languages.join(","));
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_any(&["POLYGLOT_SLACK_APP_TOKEN", "SLACK_APP_TOKEN"]) {
            self.slack.app_token = secret_value(value);
        }
        if let Some(value) = read_env_any(&["POLYGLOT_SLACK_BOT_TOKEN", "SLACK_BOT_TOKEN"]) {
            self.slack.bot_token = secret_value(value);
        }

        if let Some(value) = read_env_any(&["POLYGLOT_DEEPL_AUTH_KEY", "DEEPL_AUTH_KEY"]) {
            self.deepl.auth_key = secret_value(value);
        }
        if let Some(value) = read_env("POLYGLOT_DEEPL_API_URL") {
            self.deepl.api_url = Some(value);
        }
        if let Some(value) = read_env("POLYGLOT_DEEPL_TIMEOUT_SECS") {
            self.deepl.timeout_secs = parse_u64("POLYGLOT_DEEPL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("POLYGLOT_RELAY_REACTIONS_ENABLED") {
            self.relay.reactions_enabled =
                parse_bool("POLYGLOT_RELAY_REACTIONS_ENABLED", &value)?;
        }
        if let Some(value) = read_env("POLYGLOT_RELAY_AUTO_TRANSLATE_ENABLED") {
            self.relay.auto_translate_enabled =
                parse_bool("POLYGLOT_RELAY_AUTO_TRANSLATE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("POLYGLOT_RELAY_AUTO_TRANSLATE_LANGUAGES") {
            self.relay.auto_translate_languages =
                parse_language_pair("POLYGLOT_RELAY_AUTO_TRANSLATE_LANGUAGES", &value)?;
        }

        if let Some(value) =
            read_env_any(&["POLYGLOT_RUNNER_LANGUAGES", "DEEPL_RUNNER_LANGUAGES"])
        {
            self.runner.languages = parse_language_list(&value);
        }

        if let Some(value) = read_env("POLYGLOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("POLYGLOT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("POLYGLOT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("POLYGLOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("POLYGLOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env_any(&["POLYGLOT_LOGGING_LEVEL", "POLYGLOT_LOG_LEVEL"])
            .or_else(|| read_env("SLACK_LOG_LEVEL").map(|value| value.to_ascii_lowercase()));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        if let Some(value) = read_env_any(&["POLYGLOT_LOGGING_FORMAT", "POLYGLOT_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(slack_app_token) = overrides.slack_app_token {
            self.slack.app_token = secret_value(slack_app_token);
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(slack_bot_token);
        }
        if let Some(deepl_auth_key) = overrides.deepl_auth_key {
            self.deepl.auth_key = secret_value(deepl_auth_key);
        }
        if let Some(deepl_api_url) = overrides.deepl_api_url {
            self.deepl.api_url = Some(deepl_api_url);
        }
        if let Some(reactions_enabled) = overrides.reactions_enabled {
            self.relay.reactions_enabled = reactions_enabled;
        }
        if let Some(auto_translate_enabled) = overrides.auto_translate_enabled {
            self.relay.auto_translate_enabled = auto_translate_enabled;
        }
        if let Some(runner_languages) = overrides.runner_languages {
            self.runner.languages = parse_language_list(&runner_languages);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_deepl(&self.deepl)?;
        validate_relay(&self.relay)?;
        validate_runner(&self.runner)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Parses a comma separated list of language codes, dropping unknown codes
/// and duplicates while keeping the given order.
pub fn parse_language_list(raw: &str) -> Vec<Language> {
    let mut languages = Vec::new();
    for language in raw.split(',').filter_map(Language::from_code) {
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    languages
}

fn parse_language_pair(key: &str, value: &str) -> Result<LanguagePair, ConfigError> {
    let invalid =
        || ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() };
    let mut codes = value.split(',');
    let first = codes.next().and_then(Language::from_code).ok_or_else(invalid)?;
    let second = codes.next().and_then(Language::from_code).ok_or_else(invalid)?;
    if codes.next().is_some() {
        return Err(invalid());
    }
    Ok(LanguagePair::new(first, second))
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("polyglot.toml"), PathBuf::from("config/polyglot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path, interpolation: Interpolation) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw, interpolation)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str, interpolation: Interpolation) -> Result<String, ConfigError> {
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

            match env::var(&key) {
                Ok(value) => output.push_str(&value),
                Err(_) if interpolation == Interpolation::Lenient => {}
                Err(_) => return Err(ConfigError::MissingEnvInterpolation { var: key }),
            }
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let app_token = slack.app_token.expose_secret();
    if app_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.app_token is required for Socket Mode. Get it from https://api.slack.com/apps > Your App > Basic Information > App-Level Tokens".to_string()
        ));
    }
    if !app_token.starts_with("xapp-") {
        let hint = if app_token.starts_with("xoxb-") {
            " (hint: you may have used the bot token instead of the app token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.app_token must start with `xapp-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string()
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: you may have used the app token instead of the bot token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.bot_token must start with `xoxb-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    Ok(())
}

fn validate_deepl(deepl: &DeepLConfig) -> Result<(), ConfigError> {
    if deepl.auth_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "deepl.auth_key is required. Get it from https://www.deepl.com/account/summary"
                .to_string(),
        ));
    }

    if deepl.timeout_secs == 0 || deepl.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "deepl.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if let Some(api_url) = &deepl.api_url {
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "deepl.api_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_relay(relay: &RelayConfig) -> Result<(), ConfigError> {
    let pair = relay.auto_translate_languages;
    if relay.auto_translate_enabled && !pair.is_distinguishable() {
        return Err(ConfigError::Validation(format!(
            "relay.auto_translate_languages `{},{}` must use different writing systems",
            pair.first, pair.second
        )));
    }

    Ok(())
}

fn validate_runner(runner: &RunnerConfig) -> Result<(), ConfigError> {
    if runner.languages.is_empty() {
        return Err(ConfigError::Validation(
            "runner.languages must contain at least one supported language code".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
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

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
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

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    deepl: Option<DeepLPatch>,
    relay: Option<RelayPatch>,
    runner: Option<RunnerPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    app_token: Option<String>,
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeepLPatch {
    auth_key: Option<String>,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RelayPatch {
    reactions_enabled: Option<bool>,
    auto_translate_enabled: Option<bool>,
    auto_translate_languages: Option<[Language; 2]>,
}

#[derive(Debug, Default, Deserialize)]
struct RunnerPatch {
    languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
