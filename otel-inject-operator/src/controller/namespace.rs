use std::sync::Arc;

use k8s_openapi::api::core::v1::Namespace;
use kube::{runtime::controller::Action, ResourceExt};
use tracing::debug;

use super::{get_instrumentation, sync_namespace, Context};
use crate::error::Result;

/// A namespace label change may flip the default for every Deployment in it.
pub async fn reconcile(namespace: Arc<Namespace>, ctx: Arc<Context>) -> Result<Action> {
    let name = namespace.name_any();
    debug!(namespace = %name, "Reconciling namespace");

    let instrumentation = get_instrumentation(&ctx, &name).await?;
    sync_namespace(&ctx, &namespace, instrumentation.as_ref().map(|i| &i.spec)).await?;

    Ok(Action::await_change())
}
