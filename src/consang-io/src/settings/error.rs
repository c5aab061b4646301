use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to open settings file: {0}")]
    OpenFile(#[source] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("Settings file must contain a YAML mapping at the top level")]
    NotAMapping,

    #[error("Settings key is not a string")]
    InvalidKey,

    #[error("Settings value for '{0}' is not a scalar")]
    InvalidValue(String),
}
