use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{env_var} is not set")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that feeds `field` under the given prefix
pub fn to_env_var(prefix: &str, field: &str) -> String {
    format!("{}_{}", prefix, field.to_uppercase())
}
