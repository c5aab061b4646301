use std::{collections::BTreeMap, fs, path::Path};

use sosa::Settings;

mod error;
pub use error::SettingsError;

/// Read-only string-keyed settings backed by a flat YAML mapping, e.g.
///
/// ```yaml
/// sosa_root: 9
/// fuzzy_threshold: 0.8
/// ```
///
/// Scalar values (strings, numbers, booleans) are normalized to strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YamlSettings {
    values: BTreeMap<String, String>,
}

impl YamlSettings {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a settings mapping from a YAML file.
    ///
    /// # Errors
    /// [`SettingsError`] on IO failures, unparsable YAML, a non-mapping
    /// document, or non-scalar entries.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(SettingsError::OpenFile)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let document: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(SettingsError::Parse)?;
        let mapping = document.as_mapping().ok_or(SettingsError::NotAMapping)?;

        let mut values = BTreeMap::new();
        for (key, value) in mapping {
            let key = key.as_str().ok_or(SettingsError::InvalidKey)?.to_string();
            let value = match value {
                serde_yaml::Value::String(text) => text.clone(),
                serde_yaml::Value::Number(number) => number.to_string(),
                serde_yaml::Value::Bool(flag) => flag.to_string(),
                _ => return Err(SettingsError::InvalidValue(key)),
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }
}

impl Settings for YamlSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
