// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! One host alias sync run.
//!
//! [`HostAliasUpdater::update_hosts`] walks through these phases:
//!
//! ```text
//! Init -> Generating -> Fetching -> Snapshotting -> Applying -> Done
//!                                                      |
//!                                                      v
//!                                                 RollingBack -> Failed
//! ```
//!
//! Generation and fetch failures end the run before anything is written.
//! If applying fails for any Deployment, the aliases captured in the
//! snapshot are written back to every Deployment of the original batch. The
//! apply failure is returned either way; rollback failures are appended to it.
//!
//! There is no transactional multi-resource update in Kubernetes, so a crash
//! between applying and rolling back can leave a mixed fleet behind.

use crate::alias::{describe_aliases, AliasGenerator, HostAliasGenerator};
use crate::errors::{display_chain, ErrorList, HostChangeError};
use crate::global_config::GlobalConfigReader;
use crate::reconcilers::deployment_api::{DeploymentApi, KubeDeploymentApi};
use crate::reconcilers::fetcher::{DeploymentFetcher, DoguDeploymentFetcher};
use crate::reconcilers::host_aliases::{AliasSnapshot, DesiredAliases};
use crate::reconcilers::updater::{DeploymentUpdater, HostAliasDeploymentUpdater};
use anyhow::{Context as _, Result};
use kube::ResourceExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Phase of a run, attached to log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Generating,
    Fetching,
    Snapshotting,
    Applying,
    RollingBack,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Generating => "Generating",
            Self::Fetching => "Fetching",
            Self::Snapshotting => "Snapshotting",
            Self::Applying => "Applying",
            Self::RollingBack => "RollingBack",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Syncs host aliases into the managed Deployments of a namespace.
pub struct HostAliasUpdater {
    generator: Arc<dyn AliasGenerator>,
    fetcher: Arc<dyn DeploymentFetcher>,
    updater: Arc<dyn DeploymentUpdater>,
}

impl HostAliasUpdater {
    /// Compose a run from its three capabilities.
    #[must_use]
    pub fn new(
        generator: Arc<dyn AliasGenerator>,
        fetcher: Arc<dyn DeploymentFetcher>,
        updater: Arc<dyn DeploymentUpdater>,
    ) -> Self {
        Self {
            generator,
            fetcher,
            updater,
        }
    }

    /// Wiring against a live cluster.
    #[must_use]
    pub fn from_client(client: kube::Client, config_reader: Arc<dyn GlobalConfigReader>) -> Self {
        Self::from_parts(config_reader, Arc::new(KubeDeploymentApi::new(client)))
    }

    /// Aliases from `config_reader`, Deployments through `api`.
    #[must_use]
    pub fn from_parts(
        config_reader: Arc<dyn GlobalConfigReader>,
        api: Arc<dyn DeploymentApi>,
    ) -> Self {
        Self::new(
            Arc::new(HostAliasGenerator::new(config_reader)),
            Arc::new(DoguDeploymentFetcher::new(api.clone())),
            Arc::new(HostAliasDeploymentUpdater::new(api)),
        )
    }

    /// Update all dogu Deployments in `namespace` with the host aliases derived
    /// from the global config.
    ///
    /// # Errors
    ///
    /// - Generation failure, wrapped in "failed to generate host aliases"
    /// - Fetch failure, wrapped in "failed to fetch dogu deployments"
    /// - [`HostChangeError::ApplyFailed`] when at least one Deployment could not
    ///   be updated and the rollback succeeded
    /// - [`HostChangeError::Multiple`] holding the apply failure followed by
    ///   [`HostChangeError::RollbackFetchFailed`] or
    ///   [`HostChangeError::RollbackUpdateFailed`] when the rollback failed too
    pub async fn update_hosts(&self, namespace: &str) -> Result<()> {
        let mut phase = RunPhase::Init;
        info!(namespace, %phase, "Update host entries in dogu deployments");

        phase = RunPhase::Generating;
        let host_aliases = self
            .generator
            .generate()
            .await
            .context("failed to generate host aliases")
            .inspect_err(|e| log_failed(phase, e))?;

        if host_aliases.is_empty() {
            info!(%phase, "Delete all aliases from dogu deployments");
        } else {
            info!(%phase, aliases = %describe_aliases(&host_aliases), "Use aliases");
        }

        phase = RunPhase::Fetching;
        let deployments = self
            .fetcher
            .fetch_all(namespace)
            .await
            .context("failed to fetch dogu deployments")
            .inspect_err(|e| log_failed(phase, e))?;
        info!(%phase, count = deployments.len(), "Fetched dogu deployments");

        phase = RunPhase::Snapshotting;
        let snapshot = AliasSnapshot::capture(&deployments);
        debug!(%phase, deployments = snapshot.len(), "Captured current host aliases");

        phase = RunPhase::Applying;
        info!(%phase, "Update deployments with host aliases");
        let apply_result = self
            .updater
            .update_host_aliases(namespace, &deployments, &DesiredAliases::Uniform(host_aliases))
            .await;

        let apply_error = match apply_result {
            Ok(()) => {
                info!(phase = %RunPhase::Done, namespace, "Host aliases updated");
                return Ok(());
            }
            Err(source) => HostChangeError::ApplyFailed {
                source: Box::new(source),
            },
        };

        phase = RunPhase::RollingBack;
        warn!(%phase, error = display_chain(&apply_error), "Rolling back dogu deployments");

        let outcome = match self.rollback(namespace, snapshot).await {
            Ok(()) => {
                info!(%phase, "Rollback restored previous host aliases");
                apply_error
            }
            Err(rollback_error) => {
                let mut errors = ErrorList::new();
                errors.push(apply_error);
                errors.push(rollback_error);
                HostChangeError::Multiple(errors)
            }
        };

        let err = anyhow::Error::new(outcome);
        log_failed(RunPhase::Failed, &err);
        Err(err)
    }

    async fn rollback(&self, namespace: &str, snapshot: AliasSnapshot) -> Result<(), HostChangeError> {
        let deployments = self.fetcher.fetch_all(namespace).await.map_err(|source| {
            HostChangeError::RollbackFetchFailed {
                source: Box::new(source),
            }
        })?;

        debug!(
            namespace,
            deployments = ?deployments.iter().map(ResourceExt::name_any).collect::<Vec<_>>(),
            "Restoring host aliases"
        );

        self.updater
            .update_host_aliases(namespace, &deployments, &DesiredAliases::PerDeployment(snapshot))
            .await
            .map_err(|source| HostChangeError::RollbackUpdateFailed {
                source: Box::new(source),
            })
    }
}

fn log_failed(phase: RunPhase, err: &anyhow::Error) {
    error!(%phase, error = format!("{err:#}"), "Host alias update failed");
}

/// Drive `run` to completion unless `deadline` elapses or `shutdown` resolves
/// first.
///
/// Whichever fires first drops the in-flight run; nothing already written is
/// undone.
///
/// # Errors
///
/// Returns the run's own error, or [`HostChangeError::Cancelled`] when the
/// deadline or shutdown wins.
pub async fn run_until_cancelled<R, S>(
    run: R,
    deadline: Option<Duration>,
    shutdown: S,
) -> Result<()>
where
    R: Future<Output = Result<()>>,
    S: Future<Output = ()>,
{
    let timed = async {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, run).await.unwrap_or_else(|_| {
                Err(HostChangeError::Cancelled {
                    reason: format!("deadline of {}s exceeded", limit.as_secs()),
                }
                .into())
            }),
            None => run.await,
        }
    };

    tokio::select! {
        result = timed => result,
        () = shutdown => Err(HostChangeError::Cancelled {
            reason: "received shutdown signal".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
