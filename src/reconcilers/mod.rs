// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host alias reconciliation for dogu Deployments.
//!
//! A run reads the desired host aliases once and pushes them into every
//! Deployment carrying the `dogu.name` label. Nothing watches for changes;
//! the binary performs one run and exits.
//!
//! # Building Blocks
//!
//! - [`DeploymentApi`] - Transport seam over the Kubernetes Deployment API
//! - [`DeploymentFetcher`] - Lists the dogu Deployments of a namespace
//! - [`DeploymentUpdater`] - Writes alias lists with conflict retries
//! - [`HostAliasUpdater`] - Generate, fetch, apply and roll back
//!
//! # Example
//!
//! ```rust,no_run
//! use k8s_host_change::global_config::ConfigMapGlobalConfig;
//! use k8s_host_change::reconcilers::HostAliasUpdater;
//! use kube::Client;
//! use std::sync::Arc;
//!
//! async fn sync(client: Client) -> anyhow::Result<()> {
//!     let reader = Arc::new(ConfigMapGlobalConfig::new(client.clone(), "ecosystem"));
//!     HostAliasUpdater::from_client(client, reader)
//!         .update_hosts("ecosystem")
//!         .await
//! }
//! ```

pub mod deployment_api;
pub mod fetcher;
pub mod host_aliases;
pub mod orchestrator;
pub mod retry;
pub mod updater;

#[cfg(test)]
mod test_support;

pub use deployment_api::{DeploymentApi, KubeDeploymentApi};
pub use fetcher::{DeploymentFetcher, DoguDeploymentFetcher};
pub use host_aliases::{AliasSnapshot, DesiredAliases};
pub use orchestrator::{run_until_cancelled, HostAliasUpdater, RunPhase};
pub use retry::{retry_on_conflict, RetryError, RetryPolicy};
pub use updater::{DeploymentUpdater, HostAliasDeploymentUpdater};
