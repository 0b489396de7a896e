//! This module defines the operator configuration file.

use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub selectors: Option<Selectors>,
    /// Delay before a failed reconciliation is retried.
    #[serde(default = "default_error_requeue_seconds")]
    pub error_requeue_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
/// A reduced version of the Kubernetes LabelSelector: only matchLabels is supported, expressions are not.
pub struct LabelSelector {
    #[serde(rename = "matchLabels")]
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Selectors {
    /// Namespaces matching this selector are never mutated, whatever their labels say.
    pub exclude: Option<LabelSelector>,
}

fn default_error_requeue_seconds() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selectors: None,
            error_requeue_seconds: default_error_requeue_seconds(),
        }
    }
}

/// matchLabels is a map of {key,value} pairs. A single {key,value} in the matchLabels map is equivalent to an element of matchExpressions, whose key field is "key", the operator is "In", and the values array contains only "value". The requirements are ANDed.
pub fn run_match_labels(
    labels: Option<&BTreeMap<String, String>>,
    match_labels: &BTreeMap<String, String>,
) -> bool {
    match_labels
        .iter()
        .all(|(key, value)| labels.and_then(|l| l.get(key)).map_or(false, |v| v == value))
}

impl Config {
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_file(file_path: &Path) -> anyhow::Result<Self> {
        let config_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed reading {}", file_path.display()))?;
        Self::from_str(&config_content)
    }

    /// Loads the file if one is given, falls back to the defaults otherwise.
    pub fn load(file_path: Option<&Path>) -> anyhow::Result<Self> {
        match file_path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Whether a namespace with these labels is excluded from mutation.
    pub fn is_namespace_excluded(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.selectors
            .as_ref()
            .and_then(|selectors| selectors.exclude.as_ref())
            .map_or(false, |exclude| run_match_labels(labels, &exclude.match_labels))
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_seconds)
    }
}
