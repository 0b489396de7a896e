//! Attaches the Java agent to a pod template.
//!
//! Every step converges: running [`inject`] again on its own output changes nothing.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, PodSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::{
    config::{InstrumentationConfig, JavaToolOptionsPolicy},
    consts::*,
    enablement::resolve_override,
    error::InjectError,
    lookup::{append_if_missing, position, upsert_env},
};

/// Identity of the workload owning the pod template.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadMeta<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    /// The workload's own annotations. Namespace annotations are never consulted.
    pub annotations: Option<&'a BTreeMap<String, String>>,
}

impl<'a> WorkloadMeta<'a> {
    pub fn new(name: &'a str, namespace: &'a str) -> Self {
        Self {
            name,
            namespace,
            annotations: None,
        }
    }

    pub fn with_annotations(mut self, annotations: &'a BTreeMap<String, String>) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn from_object_meta(meta: &'a ObjectMeta) -> Self {
        Self {
            name: meta.name.as_deref().unwrap_or_default(),
            namespace: meta.namespace.as_deref().unwrap_or_default(),
            annotations: meta.annotations.as_ref(),
        }
    }
}

/// Adds the agent init container, the shared volume, and the agent environment of the first
/// application container. Existing init containers and volumes with the reserved name are kept
/// as they are.
pub fn inject(
    workload: &WorkloadMeta,
    pod: &mut PodSpec,
    config: &InstrumentationConfig,
) -> Result<(), InjectError> {
    if pod.containers.is_empty() {
        return Err(InjectError::NoApplicationContainer {
            workload: format!("{}/{}", workload.namespace, workload.name),
        });
    }

    append_if_missing(&mut pod.init_containers, agent_init_container(config));
    append_if_missing(
        &mut pod.volumes,
        Volume {
            name: INSTRUMENTATION_NAME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        },
    );

    inject_container(workload, &mut pod.containers[0], config);
    Ok(())
}

fn agent_volume_mount() -> VolumeMount {
    VolumeMount {
        name: INSTRUMENTATION_NAME.to_string(),
        mount_path: MOUNT_PATH.to_string(),
        ..Default::default()
    }
}

fn agent_init_container(config: &InstrumentationConfig) -> Container {
    Container {
        name: INSTRUMENTATION_NAME.to_string(),
        image: Some(config.javaagent_image.clone()),
        image_pull_policy: Some(PULL_POLICY_ALWAYS.to_string()),
        command: Some(vec![
            "cp".to_string(),
            AGENT_SOURCE_PATH.to_string(),
            AGENT_TARGET_PATH.to_string(),
        ]),
        volume_mounts: Some(vec![agent_volume_mount()]),
        ..Default::default()
    }
}

fn inject_container(
    workload: &WorkloadMeta,
    container: &mut Container,
    config: &InstrumentationConfig,
) {
    inject_java_tool_options(&mut container.env, config.java_tool_options);

    upsert_env(
        &mut container.env,
        ENV_OTEL_EXPORTER_OTLP_ENDPOINT,
        config.otlp_endpoint.clone(),
    );

    append_if_missing(&mut container.volume_mounts, agent_volume_mount());

    upsert_env(
        &mut container.env,
        ENV_OTEL_SERVICE_NAME,
        workload.name.to_string(),
    );

    if !config.resource_attributes.is_empty() {
        let attributes = resource_attributes(workload, &container.name, config);
        upsert_env(&mut container.env, ENV_OTEL_RESOURCE_ATTRIBUTES, attributes);
    }

    if let Some(sampler) = config.traces_sampler() {
        let sampler = resolve_override(sampler, ANNOTATION_TRACES_SAMPLER, workload.annotations);
        upsert_env(
            &mut container.env,
            ENV_OTEL_TRACES_SAMPLER,
            sampler.to_string(),
        );
    }

    if let Some(arg) = config.traces_sampler_arg() {
        let arg = resolve_override(arg, ANNOTATION_TRACES_SAMPLER_ARG, workload.annotations);
        upsert_env(
            &mut container.env,
            ENV_OTEL_TRACES_SAMPLER_ARG,
            arg.to_string(),
        );
    }
}

fn inject_java_tool_options(env: &mut Option<Vec<EnvVar>>, policy: JavaToolOptionsPolicy) {
    match position(env.as_ref(), ENV_JAVA_TOOL_OPTIONS) {
        None => upsert_env(env, ENV_JAVA_TOOL_OPTIONS, JAVAAGENT_FLAG.to_string()),
        Some(idx) => {
            let Some(var) = env.as_mut().map(|vars| &mut vars[idx]) else {
                return;
            };
            // A value sourced through valueFrom cannot be extended here.
            let Some(current) = var.value.as_deref() else {
                return;
            };
            if current.contains(JAVAAGENT_FLAG) {
                return;
            }
            match policy {
                JavaToolOptionsPolicy::LeaveExisting => {}
                JavaToolOptionsPolicy::AppendFlag => {
                    var.value = Some(format!("{current}{JAVAAGENT_FLAG}"));
                }
            }
        }
    }
}

/// User attributes first, then the fixed `k8s.*` attributes describing where the agent runs.
fn resource_attributes(
    workload: &WorkloadMeta,
    container_name: &str,
    config: &InstrumentationConfig,
) -> String {
    config
        .resource_attributes
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .chain([
            format!("k8s.namespace={}", workload.namespace),
            format!("k8s.deployment={}", workload.name),
            format!("k8s.container={container_name}"),
        ])
        .collect::<Vec<_>>()
        .join(",")
}
