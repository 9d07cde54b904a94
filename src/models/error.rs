use thiserror::Error;

/// Operator-supplied configuration that cannot be used. These are always
/// recoverable: the console reports them and prompts again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("contributor id cannot be empty")]
    EmptyContributor,
    #[error("invalid category selection '{0}'")]
    InvalidCategory(String),
    #[error("invalid session mode '{0}'")]
    InvalidMode(String),
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Trim and validate a contributor identifier.
pub fn validate_contributor(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyContributor);
    }
    Ok(trimmed.to_string())
}
