//! Decides whether a workload is instrumented, and which per-workload overrides apply.
//!
//! Enablement is a label that may be set on the workload or on its namespace. The first source
//! defining the label decides, so a workload label overrides the namespace-wide default.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Returns true if the first source carrying `label` sets it to `"true"`.
/// Sources without the label are skipped. If none carries it, instrumentation is disabled.
pub fn is_enabled(label: &str, sources: &[&ObjectMeta]) -> bool {
    sources
        .iter()
        .find_map(|meta| meta.labels.as_ref()?.get(label))
        .map_or(false, |value| value == "true")
}

/// Returns the annotation `key` if it is set and non-empty, `base` otherwise.
pub fn resolve_override<'a>(
    base: &'a str,
    key: &str,
    annotations: Option<&'a BTreeMap<String, String>>,
) -> &'a str {
    annotations
        .and_then(|annotations| annotations.get(key))
        .filter(|value| !value.is_empty())
        .map_or(base, String::as_str)
}

/// Metadata sources of one workload, highest priority first.
#[derive(Debug, Clone)]
pub struct EnablementContext<'a> {
    sources: Vec<&'a ObjectMeta>,
}

impl<'a> EnablementContext<'a> {
    /// The workload's own metadata takes precedence over its namespace.
    pub fn new(workload: &'a ObjectMeta, namespace: &'a ObjectMeta) -> Self {
        Self {
            sources: vec![workload, namespace],
        }
    }

    pub fn from_sources(sources: Vec<&'a ObjectMeta>) -> Self {
        Self { sources }
    }

    pub fn is_enabled(&self, label: &str) -> bool {
        is_enabled(label, &self.sources)
    }
}
