use std::sync::Arc;

use k8s_openapi::api::apps::v1::Deployment;
use kube::{runtime::controller::Action, ResourceExt};
use tracing::debug;

use super::{get_instrumentation, get_namespace, sync_deployment, Context};
use crate::error::{Error, Result};

/// Reconciles a single Deployment against its namespace and instrumentation.
pub async fn reconcile(deployment: Arc<Deployment>, ctx: Arc<Context>) -> Result<Action> {
    let name = deployment.name_any();
    let ns = deployment.namespace().ok_or_else(|| Error::MissingNamespace {
        kind: "Deployment",
        name: name.clone(),
    })?;

    let Some(namespace) = get_namespace(&ctx, &ns).await? else {
        debug!(deployment = %name, namespace = %ns, "Namespace not found, nothing to do");
        return Ok(Action::await_change());
    };
    let instrumentation = get_instrumentation(&ctx, &ns).await?;

    sync_deployment(
        &ctx,
        Deployment::clone(&deployment),
        &namespace,
        instrumentation.as_ref().map(|i| &i.spec),
    )
    .await?;

    Ok(Action::await_change())
}
