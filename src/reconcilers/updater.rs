// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Writing host aliases into Deployments.
//!
//! Every Deployment is handled on its own:
//!
//! 1. **Get** - re-read it by name, so the write starts from current state
//! 2. **Modify** - replace `spec.template.spec.hostAliases` with the desired list
//! 3. **Update** - `replace` it; on 409 Conflict go back to 1 under the
//!    [`RetryPolicy`]
//!
//! A failing Deployment does not stop the batch. All failures are collected
//! and returned together, so a partially applied batch is always reported
//! with every Deployment that did not make it.

use crate::errors::{display_chain, ErrorList, HostChangeError};
use crate::reconcilers::deployment_api::DeploymentApi;
use crate::reconcilers::host_aliases::{set_host_aliases, DesiredAliases};
use crate::reconcilers::retry::{is_conflict, retry_on_conflict, RetryError, RetryPolicy};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::HostAlias;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Writes alias lists into a batch of Deployments.
#[async_trait]
pub trait DeploymentUpdater: Send + Sync {
    /// Apply `desired` to every Deployment in `deployments`, sequentially and in
    /// input order.
    ///
    /// # Errors
    ///
    /// Returns [`HostChangeError::Multiple`] listing every Deployment that
    /// could not be updated, after all of them were attempted.
    async fn update_host_aliases(
        &self,
        namespace: &str,
        deployments: &[Deployment],
        desired: &DesiredAliases,
    ) -> Result<(), HostChangeError>;
}

/// [`DeploymentUpdater`] using get-modify-replace with conflict retries.
pub struct HostAliasDeploymentUpdater {
    api: Arc<dyn DeploymentApi>,
    policy: RetryPolicy,
}

impl HostAliasDeploymentUpdater {
    /// Updater with the default conflict retry policy.
    #[must_use]
    pub fn new(api: Arc<dyn DeploymentApi>) -> Self {
        Self::with_policy(api, RetryPolicy::default())
    }

    #[must_use]
    pub fn with_policy(api: Arc<dyn DeploymentApi>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    async fn update_one(
        &self,
        namespace: &str,
        name: &str,
        aliases: &[HostAlias],
    ) -> Result<(), HostChangeError> {
        let operation_name = format!("update host aliases of deployment {namespace}/{name}");

        let result = retry_on_conflict(&self.policy, &operation_name, is_conflict, || async {
            let mut deployment = self.api.get(namespace, name).await?;
            set_host_aliases(&mut deployment, aliases);
            self.api.replace(namespace, name, &deployment).await?;
            Ok::<(), kube::Error>(())
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(RetryError::Exhausted { attempts, last }) => {
                Err(HostChangeError::UpdateConflictExhausted {
                    deployment: name.to_string(),
                    attempts,
                    source: last,
                })
            }
            Err(RetryError::Aborted(source)) => Err(HostChangeError::UpdateFailed {
                deployment: name.to_string(),
                source,
            }),
        }
    }
}

#[async_trait]
impl DeploymentUpdater for HostAliasDeploymentUpdater {
    async fn update_host_aliases(
        &self,
        namespace: &str,
        deployments: &[Deployment],
        desired: &DesiredAliases,
    ) -> Result<(), HostChangeError> {
        let mut failures = ErrorList::new();

        for deployment in deployments {
            let name = deployment.name_any();
            let Some(aliases) = desired.for_deployment(&name) else {
                debug!(
                    namespace,
                    deployment = %name,
                    "No alias list for deployment, leaving it untouched"
                );
                continue;
            };

            match self.update_one(namespace, &name, aliases).await {
                Ok(()) => {
                    info!(
                        namespace,
                        deployment = %name,
                        aliases = aliases.len(),
                        "Updated host aliases"
                    );
                }
                Err(e) => {
                    error!(
                        namespace,
                        deployment = %name,
                        error = display_chain(&e),
                        "Failed to update host aliases"
                    );
                    failures.push(e);
                }
            }
        }

        failures.into_result()
    }
}

#[cfg(test)]
#[path = "updater_tests.rs"]
mod updater_tests;
