// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The Kubernetes calls the reconcilers make against Deployments.
//!
//! Fetcher and updater talk to the cluster only through [`DeploymentApi`].
//! [`KubeDeploymentApi`] is the production implementation; tests plug in an
//! in-memory fleet.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// List, get and replace on namespaced Deployments.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// List Deployments in `namespace` matching `label_selector`, in server order.
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Deployment>, kube::Error>;

    /// Read one Deployment.
    async fn get(&self, namespace: &str, name: &str) -> Result<Deployment, kube::Error>;

    /// Replace one Deployment.
    ///
    /// `deployment` carries the `resourceVersion` it was read with; the API
    /// server answers 409 Conflict if the object changed since.
    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, kube::Error>;
}

/// [`DeploymentApi`] backed by a kube [`Client`].
#[derive(Clone)]
pub struct KubeDeploymentApi {
    client: Client,
}

impl KubeDeploymentApi {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl DeploymentApi for KubeDeploymentApi {
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Deployment>, kube::Error> {
        let params = ListParams::default().labels(label_selector);
        let list = self.api(namespace).list(&params).await?;
        debug!(
            namespace,
            selector = label_selector,
            count = list.items.len(),
            "Listed deployments"
        );
        Ok(list.items)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Deployment, kube::Error> {
        self.api(namespace).get(name).await
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, kube::Error> {
        self.api(namespace)
            .replace(name, &PostParams::default(), deployment)
            .await
    }
}
