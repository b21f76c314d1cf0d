// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Discovery of the Deployments whose host aliases are managed.

use crate::errors::HostChangeError;
use crate::reconcilers::deployment_api::DeploymentApi;
use crate::selector::{dogu_selector, format_label_selector};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use std::sync::Arc;
use tracing::debug;

/// Lists the managed Deployments of a namespace.
#[async_trait]
pub trait DeploymentFetcher: Send + Sync {
    /// Fetch every managed Deployment in `namespace`, in server order.
    ///
    /// # Errors
    ///
    /// Returns [`HostChangeError::FetchFailed`] if the list call fails. The
    /// call is not retried.
    async fn fetch_all(&self, namespace: &str) -> Result<Vec<Deployment>, HostChangeError>;
}

/// Fetches Deployments carrying the `dogu.name` label.
pub struct DoguDeploymentFetcher {
    api: Arc<dyn DeploymentApi>,
    selector: String,
}

impl DoguDeploymentFetcher {
    #[must_use]
    pub fn new(api: Arc<dyn DeploymentApi>) -> Self {
        Self {
            api,
            selector: format_label_selector(&dogu_selector()),
        }
    }

    /// The label selector sent with every list call.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

#[async_trait]
impl DeploymentFetcher for DoguDeploymentFetcher {
    async fn fetch_all(&self, namespace: &str) -> Result<Vec<Deployment>, HostChangeError> {
        let deployments = self
            .api
            .list(namespace, &self.selector)
            .await
            .map_err(|source| HostChangeError::FetchFailed {
                selector: self.selector.clone(),
                source,
            })?;

        debug!(
            namespace,
            selector = %self.selector,
            count = deployments.len(),
            "Fetched dogu deployments"
        );

        Ok(deployments)
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod fetcher_tests;
