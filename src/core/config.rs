//! The Apollonfile: which targets should link a cached static library.
//!
//! The file is a property list mapping target names to booleans. It lives
//! next to the Pods project and is rewritten (binary format) by
//! `apollon --install` whenever the set of targets changes.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use plist::Value;

use crate::core::errors::{ApollonError, ConfigError};

/// File name of the configuration, relative to the Pods project directory.
pub const APOLLONFILE: &str = "Apollonfile";

/// One line of the Apollonfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub target: String,
    pub static_enabled: bool,
}

/// Declarative desired state: target name to "link from cache".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApollonConfig {
    entries: BTreeMap<String, bool>,
}

impl ApollonConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        ApollonConfig::default()
    }

    /// Load and validate an Apollonfile (binary or XML plist).
    pub fn load(path: &Path) -> Result<Self> {
        let value = Value::from_file(path)
            .with_context(|| format!("failed to read Apollonfile: {}", path.display()))?;
        let config = Self::from_value(value, path).map_err(ApollonError::from)?;
        Ok(config)
    }

    /// Build a configuration from a parsed property list, rejecting
    /// anything that is not a dictionary of booleans.
    pub fn from_value(value: Value, path: &Path) -> Result<Self, ConfigError> {
        let dict = match value {
            Value::Dictionary(dict) => dict,
            _ => {
                return Err(ConfigError::NotADictionary {
                    path: path.to_path_buf(),
                })
            }
        };

        let mut entries = BTreeMap::new();
        for (target, value) in dict {
            match value {
                Value::Boolean(enabled) => {
                    entries.insert(target, enabled);
                }
                other => {
                    return Err(ConfigError::NotBoolean {
                        target,
                        found: describe(&other),
                    })
                }
            }
        }

        Ok(ApollonConfig { entries })
    }

    /// Write the configuration as a binary property list.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut dict = plist::Dictionary::new();
        for (target, enabled) in &self.entries {
            dict.insert(target.clone(), Value::Boolean(*enabled));
        }
        Value::Dictionary(dict)
            .to_file_binary(path)
            .with_context(|| format!("failed to write Apollonfile: {}", path.display()))
    }

    /// Whether the target is configured to link from cache.
    /// Unconfigured targets compile from source.
    pub fn is_static(&self, target: &str) -> bool {
        self.entries.get(target).copied().unwrap_or(false)
    }

    /// The configured value, if any.
    pub fn get(&self, target: &str) -> Option<bool> {
        self.entries.get(target).copied()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target)
    }

    pub fn set(&mut self, target: impl Into<String>, static_enabled: bool) {
        self.entries.insert(target.into(), static_enabled);
    }

    pub fn remove(&mut self, target: &str) -> Option<bool> {
        self.entries.remove(target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, ordered by target name.
    pub fn entries(&self) -> impl Iterator<Item = ConfigEntry> + '_ {
        self.entries.iter().map(|(target, enabled)| ConfigEntry {
            target: target.clone(),
            static_enabled: *enabled,
        })
    }

    /// Every configured name must be a target of the project.
    pub fn validate_targets(&self, targets: &[String]) -> Result<(), ConfigError> {
        for name in self.entries.keys() {
            if !targets.iter().any(|t| t == name) {
                return Err(ConfigError::UnknownTarget {
                    target: name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, bool)> for ApollonConfig {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        ApollonConfig {
            entries: iter.into_iter().collect(),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {:?}", s),
        Value::Integer(i) => format!("integer {}", i),
        Value::Real(r) => format!("real {}", r),
        Value::Array(_) => "an array".to_string(),
        Value::Dictionary(_) => "a dictionary".to_string(),
        Value::Data(_) => "data".to_string(),
        Value::Date(_) => "a date".to_string(),
        _ => "an unsupported value".to_string(),
    }
}
