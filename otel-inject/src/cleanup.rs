//! Removes the Java agent from a pod template.

use k8s_openapi::api::core::v1::{EnvVar, PodSpec};

use crate::{consts::*, lookup::remove};

/// Reverts [`crate::inject`]. Returns true if the pod template was modified and must be persisted.
///
/// The reserved init container marks an instrumented template: without it nothing is touched.
///
/// Lists emptied by the removal (`initContainers`, `volumes`, `env`, `volumeMounts`) become absent,
/// so a template that arrived with an explicit empty list comes back without it. The API server
/// stores both forms the same way.
pub fn clean(pod: &mut PodSpec) -> bool {
    if remove(&mut pod.init_containers, INSTRUMENTATION_NAME).is_none() {
        return false;
    }
    remove(&mut pod.volumes, INSTRUMENTATION_NAME);

    let Some(container) = pod.containers.first_mut() else {
        return true;
    };

    remove(&mut container.volume_mounts, INSTRUMENTATION_NAME);
    for name in OWNED_ENV_VARS {
        remove(&mut container.env, name);
    }
    strip_javaagent_flag(&mut container.env);

    true
}

/// Removes the agent flag from JAVA_TOOL_OPTIONS, keeping any other flags. The variable is
/// dropped if nothing else is left. A variable without a literal value (`valueFrom`) is never ours.
fn strip_javaagent_flag(env: &mut Option<Vec<EnvVar>>) {
    let Some(var) = env
        .iter_mut()
        .flatten()
        .find(|var| var.name == ENV_JAVA_TOOL_OPTIONS)
    else {
        return;
    };
    let Some(current) = var.value.as_deref() else {
        return;
    };
    let stripped = current.replacen(JAVAAGENT_FLAG, "", 1);
    if !stripped.is_empty() {
        var.value = Some(stripped);
        return;
    }
    remove(env, ENV_JAVA_TOOL_OPTIONS);
}
