//! The resolved instrumentation settings handed to the mutator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What to do when JAVA_TOOL_OPTIONS is already set but does not carry the agent flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JavaToolOptionsPolicy {
    /// Leave the user's value alone. The container will run without the agent.
    #[default]
    LeaveExisting,
    /// Append the agent flag to the user's value.
    AppendFlag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Image that ships the agent jar at `/javaagent.jar`.
    pub javaagent_image: String,
    pub otlp_endpoint: String,
    pub traces_sampler: Option<String>,
    pub traces_sampler_arg: Option<String>,
    pub resource_attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub java_tool_options: JavaToolOptionsPolicy,
}

impl InstrumentationConfig {
    pub fn new(javaagent_image: impl Into<String>, otlp_endpoint: impl Into<String>) -> Self {
        Self {
            javaagent_image: javaagent_image.into(),
            otlp_endpoint: otlp_endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_traces_sampler(mut self, sampler: impl Into<String>) -> Self {
        self.traces_sampler = Some(sampler.into());
        self
    }

    pub fn with_traces_sampler_arg(mut self, arg: impl Into<String>) -> Self {
        self.traces_sampler_arg = Some(arg.into());
        self
    }

    pub fn with_resource_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_java_tool_options(mut self, policy: JavaToolOptionsPolicy) -> Self {
        self.java_tool_options = policy;
        self
    }

    /// The configured sampler, treating an empty string as unset.
    pub fn traces_sampler(&self) -> Option<&str> {
        non_empty(self.traces_sampler.as_deref())
    }

    pub fn traces_sampler_arg(&self) -> Option<&str> {
        non_empty(self.traces_sampler_arg.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
