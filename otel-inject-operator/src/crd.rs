//! The OpenTelemetryInstrumentation custom resource.
//!
//! One instance per namespace, named [`INSTRUMENTATION_RESOURCE_NAME`], configures the agent injected
//! into that namespace's workloads.

use std::collections::BTreeMap;

use kube::CustomResource;
use otel_inject::InstrumentationConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The well-known name the operator looks the resource up by.
pub const INSTRUMENTATION_RESOURCE_NAME: &str = "opentelemetry-instrumentation";

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "opentelemetry.io",
    version = "v1alpha1",
    kind = "OpenTelemetryInstrumentation",
    plural = "opentelemetryinstrumentations",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct OpenTelemetryInstrumentationSpec {
    /// Collector endpoint exported as OTEL_EXPORTER_OTLP_ENDPOINT.
    #[serde(rename = "OTLPEndpoint", default)]
    pub otlp_endpoint: String,

    /// Image shipping the agent at /javaagent.jar.
    #[serde(default)]
    pub javaagent_image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces_sampler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces_sampler_arg: Option<String>,

    /// Extra attributes prepended to OTEL_RESOURCE_ATTRIBUTES.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_attributes: BTreeMap<String, String>,
}

impl OpenTelemetryInstrumentationSpec {
    pub fn to_config(&self) -> InstrumentationConfig {
        InstrumentationConfig {
            javaagent_image: self.javaagent_image.clone(),
            otlp_endpoint: self.otlp_endpoint.clone(),
            traces_sampler: self.traces_sampler.clone().filter(|s| !s.is_empty()),
            traces_sampler_arg: self.traces_sampler_arg.clone().filter(|s| !s.is_empty()),
            resource_attributes: self.resource_attributes.clone(),
            ..Default::default()
        }
    }
}
