use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub nlu: NluConfig,
    pub registration: RegistrationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Settings for the natural-language-understanding collaborator. Passed
/// explicitly into the client constructor; nothing reads the process
/// environment at call time.
#[derive(Clone, Debug)]
pub struct NluConfig {
    pub base_url: String,
    pub model: String,
    /// Sampling temperature for intent extraction (low: structured output).
    pub temperature: f32,
    /// Sampling temperature for response synthesis (higher: prose).
    pub answer_temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// When false, responses come from the template renderers only.
    pub synthesize_responses: bool,
}

#[derive(Clone, Debug)]
pub struct RegistrationConfig {
    /// Days after enrollment creation during which withdrawal is allowed,
    /// boundary inclusive.
    pub withdrawal_window_days: i64,
    pub passing_grade: f64,
    pub default_recommendations: usize,
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub nlu_base_url: Option<String>,
    pub nlu_model: Option<String>,
    pub synthesize_responses: Option<bool>,
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
                url: "sqlite://cursus.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            nlu: NluConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                temperature: 0.1,
                answer_temperature: 0.7,
                max_tokens: 2000,
                timeout_secs: 60,
                synthesize_responses: false,
            },
            registration: RegistrationConfig {
                withdrawal_window_days: 30,
                passing_grade: 50.0,
                default_recommendations: 4,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cursus.toml"));
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

        if let Some(nlu) = patch.nlu {
            if let Some(base_url) = nlu.base_url {
                self.nlu.base_url = base_url;
            }
            if let Some(model) = nlu.model {
                self.nlu.model = model;
            }
            if let Some(temperature) = nlu.temperature {
                self.nlu.temperature = temperature;
            }
            if let Some(answer_temperature) = nlu.answer_temperature {
                self.nlu.answer_temperature = answer_temperature;
            }
            if let Some(max_tokens) = nlu.max_tokens {
                self.nlu.max_tokens = max_tokens;
            }
            if let Some(timeout_secs) = nlu.timeout_secs {
                self.nlu.timeout_secs = timeout_secs;
            }
            if let Some(synthesize_responses) = nlu.synthesize_responses {
                self.nlu.synthesize_responses = synthesize_responses;
            }
        }

        if let Some(registration) = patch.registration {
            if let Some(withdrawal_window_days) = registration.withdrawal_window_days {
                self.registration.withdrawal_window_days = withdrawal_window_days;
            }
            if let Some(passing_grade) = registration.passing_grade {
                self.registration.passing_grade = passing_grade;
            }
            if let Some(default_recommendations) = registration.default_recommendations {
                self.registration.default_recommendations = default_recommendations;
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
        if let Some(value) = read_env("CURSUS_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CURSUS_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("CURSUS_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CURSUS_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("CURSUS_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CURSUS_NLU_BASE_URL") {
            self.nlu.base_url = value;
        }
        if let Some(value) = read_env("CURSUS_NLU_MODEL") {
            self.nlu.model = value;
        }
        if let Some(value) = read_env("CURSUS_NLU_TEMPERATURE") {
            self.nlu.temperature = parse_f32("CURSUS_NLU_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("CURSUS_NLU_ANSWER_TEMPERATURE") {
            self.nlu.answer_temperature = parse_f32("CURSUS_NLU_ANSWER_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("CURSUS_NLU_MAX_TOKENS") {
            self.nlu.max_tokens = parse_u32("CURSUS_NLU_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("CURSUS_NLU_TIMEOUT_SECS") {
            self.nlu.timeout_secs = parse_u64("CURSUS_NLU_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CURSUS_NLU_SYNTHESIZE_RESPONSES") {
            self.nlu.synthesize_responses = parse_bool("CURSUS_NLU_SYNTHESIZE_RESPONSES", &value)?;
        }

        if let Some(value) = read_env("CURSUS_REGISTRATION_WITHDRAWAL_WINDOW_DAYS") {
            self.registration.withdrawal_window_days =
                parse_i64("CURSUS_REGISTRATION_WITHDRAWAL_WINDOW_DAYS", &value)?;
        }
        if let Some(value) = read_env("CURSUS_REGISTRATION_PASSING_GRADE") {
            self.registration.passing_grade =
                parse_f64("CURSUS_REGISTRATION_PASSING_GRADE", &value)?;
        }
        if let Some(value) = read_env("CURSUS_REGISTRATION_DEFAULT_RECOMMENDATIONS") {
            self.registration.default_recommendations =
                parse_usize("CURSUS_REGISTRATION_DEFAULT_RECOMMENDATIONS", &value)?;
        }

        let log_level = read_env("CURSUS_LOGGING_LEVEL").or_else(|| read_env("CURSUS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CURSUS_LOGGING_FORMAT").or_else(|| read_env("CURSUS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
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
        if let Some(nlu_base_url) = overrides.nlu_base_url {
            self.nlu.base_url = nlu_base_url;
        }
        if let Some(nlu_model) = overrides.nlu_model {
            self.nlu.model = nlu_model;
        }
        if let Some(synthesize_responses) = overrides.synthesize_responses {
            self.nlu.synthesize_responses = synthesize_responses;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_nlu(&self.nlu)?;
        validate_registration(&self.registration)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cursus.toml"), PathBuf::from("config/cursus.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_nlu(nlu: &NluConfig) -> Result<(), ConfigError> {
    let base_url = nlu.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "nlu.base_url must start with http:// or https://".to_string(),
        ));
    }

    if nlu.model.trim().is_empty() {
        return Err(ConfigError::Validation("nlu.model must not be empty".to_string()));
    }

    for (name, value) in
        [("nlu.temperature", nlu.temperature), ("nlu.answer_temperature", nlu.answer_temperature)]
    {
        if !(0.0..=2.0).contains(&value) {
            return Err(ConfigError::Validation(format!("{name} must be in range 0.0..=2.0")));
        }
    }

    if nlu.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "nlu.max_tokens must be greater than zero".to_string(),
        ));
    }

    if nlu.timeout_secs == 0 || nlu.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "nlu.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_registration(registration: &RegistrationConfig) -> Result<(), ConfigError> {
    if registration.withdrawal_window_days <= 0 {
        return Err(ConfigError::Validation(
            "registration.withdrawal_window_days must be greater than zero".to_string(),
        ));
    }

    if !(0.0..=100.0).contains(&registration.passing_grade) {
        return Err(ConfigError::Validation(
            "registration.passing_grade must be in range 0.0..=100.0".to_string(),
        ));
    }

    if registration.default_recommendations == 0 {
        return Err(ConfigError::Validation(
            "registration.default_recommendations must be greater than zero".to_string(),
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

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
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

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
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
    database: Option<DatabasePatch>,
    nlu: Option<NluPatch>,
    registration: Option<RegistrationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    answer_temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    synthesize_responses: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistrationPatch {
    withdrawal_window_days: Option<i64>,
    passing_grade: Option<f64>,
    default_recommendations: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
