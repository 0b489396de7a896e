use std::sync::Arc;

use kube::{runtime::controller::Action, ResourceExt};
use tracing::debug;

use super::{get_namespace, sync_namespace, Context};
use crate::{
    crd::{OpenTelemetryInstrumentation, INSTRUMENTATION_RESOURCE_NAME},
    error::{Error, Result},
};

/// Re-applies a changed OpenTelemetryInstrumentation to every Deployment of its namespace.
pub async fn reconcile(
    instrumentation: Arc<OpenTelemetryInstrumentation>,
    ctx: Arc<Context>,
) -> Result<Action> {
    let name = instrumentation.name_any();
    let ns = instrumentation
        .namespace()
        .ok_or_else(|| Error::MissingNamespace {
            kind: "OpenTelemetryInstrumentation",
            name: name.clone(),
        })?;

    // Only the well-known instance configures a namespace.
    if name != INSTRUMENTATION_RESOURCE_NAME {
        debug!(instrumentation = %name, namespace = %ns, "Ignoring instrumentation with unexpected name");
        return Ok(Action::await_change());
    }

    let Some(namespace) = get_namespace(&ctx, &ns).await? else {
        debug!(namespace = %ns, "Namespace not found, nothing to do");
        return Ok(Action::await_change());
    };

    sync_namespace(&ctx, &namespace, Some(&instrumentation.spec)).await?;
    Ok(Action::await_change())
}
