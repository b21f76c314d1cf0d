// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use k8s_host_change::{
    config::{LogFormat, Settings},
    global_config::ConfigMapGlobalConfig,
    reconcilers::{run_until_cancelled, HostAliasUpdater},
};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sync hosts-specific changes.
///
/// Reads the global config of the namespace given by `NAMESPACE` and writes
/// the derived host aliases into every dogu Deployment.
#[derive(Parser, Debug)]
#[command(name = "k8s-host-change", version, about = "Sync hosts-specific changes")]
struct Cli {}

fn main() {
    let _cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("exit k8s-host-change: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&settings);

    let result = tokio::runtime::Builder::new_multi_thread()
        .thread_name("k8s-host-change")
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(async_main(settings)));

    if let Err(e) = result {
        error!(error = format!("{e:#}"), "exit k8s-host-change");
        std::process::exit(1);
    }
}

fn init_tracing(settings: &Settings) {
    // Format: timestamp file:line LEVEL message
    // RUST_LOG takes precedence over LOG_LEVEL; RUST_LOG_FORMAT=json switches to JSON
    let env_filter = tracing_subscriber::EnvFilter::try_new(&settings.log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match settings.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(settings: Settings) -> Result<()> {
    info!(namespace = %settings.namespace, "Starting k8s-host-change");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let config_reader = Arc::new(ConfigMapGlobalConfig::with_name(
        client.clone(),
        &settings.namespace,
        &settings.global_config_map,
    ));
    let updater = HostAliasUpdater::from_client(client, config_reader);

    if let Some(limit) = settings.run_timeout {
        debug!(timeout_secs = limit.as_secs(), "Run deadline configured");
    }

    run_until_cancelled(
        updater.update_hosts(&settings.namespace),
        settings.run_timeout,
        shutdown_signal(),
    )
    .await
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, listening for SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received SIGINT");
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
