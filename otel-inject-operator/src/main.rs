//! The operator attaches the OpenTelemetry Java agent to Deployments labelled for it.
use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Namespace};
use kube::{
    runtime::{watcher, Controller},
    Api, CustomResourceExt,
};
use tracing::{info, Level};

use controller::{error_policy, Context};
use crd::OpenTelemetryInstrumentation;

mod config;
mod controller;
mod crd;
mod error;

#[derive(Parser, Debug)]
#[command(name = "otel-inject-operator")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config_file: Option<PathBuf>,

    /// Maximum level of the emitted logs.
    #[arg(long, global = true, default_value_t = Level::INFO)]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the reconcilers (the default).
    Run,
    /// Print the OpenTelemetryInstrumentation CRD manifest.
    Crd,
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let ctx = Arc::new(Context::new(client.clone(), config));

    let deployments: Api<Deployment> = Api::all(client.clone());
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let instrumentations: Api<OpenTelemetryInstrumentation> = Api::all(client);

    info!("Starting deployment, namespace and instrumentation reconcilers");

    let deployment_controller = Controller::new(deployments, watcher::Config::default())
        .shutdown_on_signal()
        .run(controller::deployment::reconcile, error_policy, ctx.clone())
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => {
                    tracing::debug!(%object, ?action, "Deployment reconciliation completed")
                }
                Err(e) => tracing::warn!(error = ?e, "Deployment reconciliation error"),
            }
        });

    let namespace_controller = Controller::new(namespaces, watcher::Config::default())
        .shutdown_on_signal()
        .run(controller::namespace::reconcile, error_policy, ctx.clone())
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => {
                    tracing::debug!(%object, ?action, "Namespace reconciliation completed")
                }
                Err(e) => tracing::warn!(error = ?e, "Namespace reconciliation error"),
            }
        });

    let instrumentation_controller =
        Controller::new(instrumentations, watcher::Config::default())
            .shutdown_on_signal()
            .run(
                controller::instrumentation::reconcile,
                error_policy,
                ctx.clone(),
            )
            .for_each(|result| async move {
                match result {
                    Ok((object, action)) => {
                        tracing::debug!(%object, ?action, "Instrumentation reconciliation completed")
                    }
                    Err(e) => tracing::warn!(error = ?e, "Instrumentation reconciliation error"),
                }
            });

    tokio::join!(
        deployment_controller,
        namespace_controller,
        instrumentation_controller
    );

    info!("Reconcilers stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse the CLI arguments
    let args = Args::try_parse()?;

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match args.command.unwrap_or(Command::Run) {
        Command::Crd => {
            print!("{}", serde_yaml::to_string(&OpenTelemetryInstrumentation::crd())?);
            Ok(())
        }
        Command::Run => {
            info!("Parsed CLI arguments: {:?}", args);

            let config = config::Config::load(args.config_file.as_deref())
                .context("Failed to load configuration file")?;
            run(config).await
        }
    }
}
