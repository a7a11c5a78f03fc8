use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use pilot::agent::DEFAULT_MAX_TURNS;
use pilot::providers::configs::{OpenAiProviderConfig, DEFAULT_MODEL, OPENROUTER_HOST};
use pilot::tools::DEFAULT_TOOL_TIMEOUT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const PROVIDER_PREFIX: &str = "OPENROUTER";
pub const AGENT_PREFIX: &str = "PILOT";

/// Endpoint settings, read from `OPENROUTER_*`
#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.base_url,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Loop settings, read from `PILOT_*`
#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Zero disables the limit
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

impl AgentSettings {
    pub fn tool_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.tool_timeout_secs)
    }
}

pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[derive(Debug)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub agent: AgentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // credentials and model ids stay verbatim; numbers are parsed by serde
        let provider: ProviderSettings = load_from_env(PROVIDER_PREFIX, false)?;
        if provider.api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var(PROVIDER_PREFIX, "api_key"),
            });
        }
        let agent = load_from_env(AGENT_PREFIX, true)?;
        Ok(Self { provider, agent })
    }
}

fn load_from_env<T: DeserializeOwned>(
    prefix: &str,
    try_parsing: bool,
) -> Result<T, ConfigError> {
    let config = Config::builder()
        .add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .try_parsing(try_parsing),
        )
        .build()?;

    match config.try_deserialize::<T>() {
        Ok(settings) => Ok(settings),
        Err(err) => {
            tracing::debug!("Configuration error: {:?}", &err);

            // Extract field name from error message "missing field `api_key`"
            let error_str = err.to_string();
            if error_str.starts_with("missing field") {
                let field = error_str
                    .trim_start_matches("missing field `")
                    .trim_end_matches('`');
                Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(prefix, field),
                })
            } else if let config::ConfigError::NotFound(field) = &err {
                Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(prefix, field),
                })
            } else {
                Err(ConfigError::Other(err))
            }
        }
    }
}

fn default_base_url() -> String {
    OPENROUTER_HOST.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_tool_timeout_secs() -> u64 {
    DEFAULT_TOOL_TIMEOUT.as_secs()
}
