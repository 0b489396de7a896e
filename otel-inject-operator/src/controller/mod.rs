//! Reconcilers that keep Deployments in line with their instrumentation label.
//!
//! Three watches feed the same decision: a Deployment changed, its Namespace changed, or the
//! namespace's OpenTelemetryInstrumentation changed. [`sync`] decides what to do with one
//! Deployment; [`sync_deployment`] persists the result when the pod template changed.

pub mod deployment;
pub mod instrumentation;
pub mod namespace;

use std::sync::Arc;

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Namespace};
use kube::{
    api::{ListParams, PostParams},
    runtime::controller::Action,
    Api, Resource, ResourceExt,
};
use otel_inject::{
    clean, consts::LABEL_ENABLED, inject, EnablementContext, InjectError, WorkloadMeta,
};
use tracing::{debug, error, info};

use crate::{
    config::Config,
    crd::{
        OpenTelemetryInstrumentation, OpenTelemetryInstrumentationSpec,
        INSTRUMENTATION_RESOURCE_NAME,
    },
    error::{Error, Result},
};

/// Shared state handed to every reconciliation.
pub struct Context {
    pub client: kube::Client,
    pub config: Config,
}

impl Context {
    pub fn new(client: kube::Client, config: Config) -> Self {
        Self { client, config }
    }
}

/// What [`sync`] did to a Deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Injected,
    Cleaned,
    Unchanged,
    /// The namespace matches the exclusion selector.
    Excluded,
    /// Instrumentation is enabled but the namespace has no OpenTelemetryInstrumentation.
    MissingInstrumentation,
}

impl SyncOutcome {
    pub fn needs_update(self) -> bool {
        matches!(self, SyncOutcome::Injected | SyncOutcome::Cleaned)
    }
}

/// Injects or cleans the Deployment's pod template in place.
pub fn sync(
    config: &Config,
    deployment: &mut Deployment,
    namespace: &Namespace,
    instrumentation: Option<&OpenTelemetryInstrumentationSpec>,
) -> Result<SyncOutcome> {
    if config.is_namespace_excluded(namespace.metadata.labels.as_ref()) {
        return Ok(SyncOutcome::Excluded);
    }

    let enabled =
        EnablementContext::new(&deployment.metadata, &namespace.metadata).is_enabled(LABEL_ENABLED);
    let pod = deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut());

    if !enabled {
        let changed = pod.map_or(false, clean);
        return Ok(if changed {
            SyncOutcome::Cleaned
        } else {
            SyncOutcome::Unchanged
        });
    }

    let Some(instrumentation) = instrumentation else {
        return Ok(SyncOutcome::MissingInstrumentation);
    };
    let workload = WorkloadMeta::from_object_meta(&deployment.metadata);
    let Some(pod) = pod else {
        return Err(InjectError::NoApplicationContainer {
            workload: format!("{}/{}", workload.namespace, workload.name),
        }
        .into());
    };

    let before = pod.clone();
    inject(&workload, pod, &instrumentation.to_config())?;
    Ok(if *pod != before {
        SyncOutcome::Injected
    } else {
        SyncOutcome::Unchanged
    })
}

/// Syncs one Deployment and writes it back if its pod template changed.
///
/// The write carries the resourceVersion the Deployment was read with, so a concurrent writer
/// surfaces as a conflict and the reconciliation is retried from a fresh read.
pub async fn sync_deployment(
    ctx: &Context,
    mut deployment: Deployment,
    namespace: &Namespace,
    instrumentation: Option<&OpenTelemetryInstrumentationSpec>,
) -> Result<SyncOutcome> {
    let name = deployment
        .metadata
        .name
        .clone()
        .ok_or(Error::MissingName { kind: "Deployment" })?;
    let ns = namespace.name_any();

    let outcome = sync(&ctx.config, &mut deployment, namespace, instrumentation)?;
    debug!(deployment = %name, namespace = %ns, ?outcome, "Synced deployment");

    if !outcome.needs_update() {
        return Ok(outcome);
    }

    let api: Api<Deployment> = Api::namespaced(ctx.client.clone(), &ns);
    match api.replace(&name, &PostParams::default(), &deployment).await {
        Ok(_) => {
            info!(deployment = %name, namespace = %ns, ?outcome, "Updated deployment");
            Ok(outcome)
        }
        Err(e) => {
            let e = Error::from(e);
            if e.is_not_found() {
                debug!(deployment = %name, namespace = %ns, "Deployment is gone, skipping update");
                return Ok(SyncOutcome::Unchanged);
            }
            Err(e)
        }
    }
}

/// Syncs every Deployment of a namespace.
pub async fn sync_namespace(
    ctx: &Context,
    namespace: &Namespace,
    instrumentation: Option<&OpenTelemetryInstrumentationSpec>,
) -> Result<()> {
    let ns = namespace.name_any();
    let api: Api<Deployment> = Api::namespaced(ctx.client.clone(), &ns);
    let deployments = api.list(&ListParams::default()).await?;

    debug!(namespace = %ns, count = deployments.items.len(), "Syncing deployments");
    for deployment in deployments.items {
        sync_deployment(ctx, deployment, namespace, instrumentation).await?;
    }
    Ok(())
}

pub async fn get_namespace(ctx: &Context, name: &str) -> Result<Option<Namespace>> {
    let api: Api<Namespace> = Api::all(ctx.client.clone());
    Ok(api.get_opt(name).await?)
}

/// The namespace's well-known OpenTelemetryInstrumentation, if it exists.
pub async fn get_instrumentation(
    ctx: &Context,
    namespace: &str,
) -> Result<Option<OpenTelemetryInstrumentation>> {
    let api: Api<OpenTelemetryInstrumentation> = Api::namespaced(ctx.client.clone(), namespace);
    Ok(api.get_opt(INSTRUMENTATION_RESOURCE_NAME).await?)
}

/// Requeues a failed object after the configured backoff. Conflicts are retried the same way,
/// the next attempt works on a fresh read.
pub fn error_policy<K>(object: Arc<K>, error: &Error, ctx: Arc<Context>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    if error.is_conflict() {
        debug!(
            kind = %K::kind(&()),
            object = %object.name_any(),
            namespace = ?object.namespace(),
            "Update conflicted, retrying"
        );
    } else {
        error!(
            ?error,
            kind = %K::kind(&()),
            object = %object.name_any(),
            namespace = ?object.namespace(),
            "Reconciliation failed"
        );
    }
    Action::requeue(ctx.config.error_requeue())
}
