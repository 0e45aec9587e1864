/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::sync::Arc;

use controlplane::{config::Args, *};

use anyhow::Context as _;
use clap::Parser;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).context("invalid log level")?)
        .init();

    run(args).await
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = ControllerConfig::try_from(&args)?;
    info!(
        excluded = ?config.excluded_namespaces.iter().collect::<Vec<_>>(),
        "loaded configuration"
    );

    let client = Client::try_default()
        .await
        .context("failed to create kube Client")?;
    let reconciler = Reconciler::new(KubeStore::new(client), config.excluded_namespaces.clone())
        .with_timeout(config.reconcile_timeout);

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let ctx = Context {
        reconciler: Arc::new(reconciler),
        config,
        shutdown,
    };

    if let Err(error) = namespace_controller(ctx).await {
        error!("failed to start controllers: {error:?}");
        std::process::exit(1);
    }
    Ok(())
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(error) => {
                warn!("failed to listen for SIGTERM: {error}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    let _ = tokio::signal::ctrl_c().await;

    info!("shutdown signal received");
    shutdown.cancel();
}
