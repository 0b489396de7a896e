//! Attaches the OpenTelemetry Java agent to workload pod templates and removes it again.
//!
//! Everything in this crate operates on in-memory objects borrowed from the caller. Fetching and
//! persisting the objects is left to the operator.
pub mod cleanup;
pub mod config;
pub mod enablement;
pub mod error;
pub mod inject;
mod lookup;

pub use cleanup::clean;
pub use config::{InstrumentationConfig, JavaToolOptionsPolicy};
pub use enablement::{is_enabled, resolve_override, EnablementContext};
pub use error::InjectError;
pub use inject::{inject, WorkloadMeta};

/// Identifiers shared by injection and cleanup. Both sides read these, never a literal copy.
pub mod consts {
    /// Name of the init container and of the volume it fills with the agent jar.
    pub const INSTRUMENTATION_NAME: &str = "opentelemetry-auto-instrumentation";
    macro_rules! mount_path {
        () => {
            "/otel-auto-instrumentation"
        };
    }

    pub const MOUNT_PATH: &str = mount_path!();
    /// Location of the jar inside the agent image.
    pub const AGENT_SOURCE_PATH: &str = "/javaagent.jar";
    pub const AGENT_TARGET_PATH: &str = concat!(mount_path!(), "/javaagent.jar");
    /// The flag added to JAVA_TOOL_OPTIONS. The leading space lets it be concatenated to existing flags.
    pub const JAVAAGENT_FLAG: &str = concat!(" -javaagent:", mount_path!(), "/javaagent.jar");
    pub const PULL_POLICY_ALWAYS: &str = "Always";

    /// Label read from the workload and its namespace to decide whether to instrument.
    pub const LABEL_ENABLED: &str = "opentelemetry-inst-java";

    pub const ANNOTATION_TRACES_SAMPLER: &str = "otel.tracesSampler";
    pub const ANNOTATION_TRACES_SAMPLER_ARG: &str = "otel.tracesSamplerArg";

    pub const ENV_JAVA_TOOL_OPTIONS: &str = "JAVA_TOOL_OPTIONS";
    pub const ENV_OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
    pub const ENV_OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
    pub const ENV_OTEL_RESOURCE_ATTRIBUTES: &str = "OTEL_RESOURCE_ATTRIBUTES";
    pub const ENV_OTEL_TRACES_SAMPLER: &str = "OTEL_TRACES_SAMPLER";
    pub const ENV_OTEL_TRACES_SAMPLER_ARG: &str = "OTEL_TRACES_SAMPLER_ARG";

    /// Variables owned outright by the instrumentation: overwritten on inject, removed on cleanup.
    pub const OWNED_ENV_VARS: [&str; 5] = [
        ENV_OTEL_EXPORTER_OTLP_ENDPOINT,
        ENV_OTEL_SERVICE_NAME,
        ENV_OTEL_RESOURCE_ATTRIBUTES,
        ENV_OTEL_TRACES_SAMPLER,
        ENV_OTEL_TRACES_SAMPLER_ARG,
    ];
}
