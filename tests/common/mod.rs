// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use k8s_host_change::reconcilers::DeploymentApi;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{HostAlias, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::client::Client;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub const NAMESPACE: &str = "ecosystem";

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(
        kube::core::Status::failure(message, reason)
            .with_code(code)
            .boxed(),
    )
}

pub fn alias(ip: &str, hostname: &str) -> HostAlias {
    HostAlias {
        ip: ip.to_string(),
        hostnames: Some(vec![hostname.to_string()]),
    }
}

/// Deployment labeled as a dogu, optionally with host aliases already set.
pub fn dogu(name: &str, aliases: Option<Vec<HostAlias>>) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(BTreeMap::from([("dogu.name".to_string(), name.to_string())])),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    host_aliases: aliases,
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// Deployment without the dogu label.
pub fn plain(name: &str) -> Deployment {
    let mut deployment = dogu(name, None);
    deployment.metadata.labels = Some(BTreeMap::from([("app".to_string(), name.to_string())]));
    deployment
}

pub fn aliases_of(deployment: &Deployment) -> Option<Vec<HostAlias>> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|s| s.host_aliases.clone())
}

#[derive(Default)]
struct FleetState {
    deployments: BTreeMap<String, Deployment>,
    next_version: u64,
    list_calls: u32,
    fail_list_from_call: Option<u32>,
    replace_failures: HashMap<String, u32>,
    concurrent_writes: HashMap<String, u32>,
}

/// Namespace-sized stand-in for the API server.
///
/// Honors `resourceVersion` on replace: a stale version is rejected with 409
/// the way the real API server does. Failures can be scripted per call.
#[derive(Default)]
pub struct InMemoryFleet {
    state: Mutex<FleetState>,
}

impl InMemoryFleet {
    pub fn new(deployments: Vec<Deployment>) -> Self {
        let fleet = Self::default();
        {
            let mut state = fleet.state.lock().unwrap();
            for mut deployment in deployments {
                state.next_version += 1;
                deployment.metadata.resource_version = Some(state.next_version.to_string());
                state.deployments.insert(deployment.name_any(), deployment);
            }
        }
        fleet
    }

    /// List calls numbered `call` and later fail with 503.
    pub fn fail_list_from_call(&self, call: u32) {
        self.state.lock().unwrap().fail_list_from_call = Some(call);
    }

    /// The next `times` replaces of `name` fail with 500.
    pub fn fail_replace(&self, name: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .replace_failures
            .insert(name.to_string(), times);
    }

    /// Another writer modifies `name` right after each of the next `times` gets.
    pub fn race_writer(&self, name: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .concurrent_writes
            .insert(name.to_string(), times);
    }

    pub fn deployment(&self, name: &str) -> Deployment {
        self.state.lock().unwrap().deployments[name].clone()
    }

    pub fn aliases(&self, name: &str) -> Option<Vec<HostAlias>> {
        aliases_of(&self.deployment(name))
    }
}

fn decrement(counter: &mut HashMap<String, u32>, name: &str) -> bool {
    match counter.get_mut(name) {
        Some(left) if *left > 0 => {
            *left -= 1;
            true
        }
        _ => false,
    }
}

#[async_trait]
impl DeploymentApi for InMemoryFleet {
    async fn list(&self, _namespace: &str, label_selector: &str) -> Result<Vec<Deployment>, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.fail_list_from_call.is_some_and(|from| state.list_calls >= from) {
            return Err(api_error(503, "ServiceUnavailable", "the server is currently unable to handle the request"));
        }

        Ok(state
            .deployments
            .values()
            .filter(|d| d.labels().contains_key(label_selector))
            .cloned()
            .collect())
    }

    async fn get(&self, _namespace: &str, name: &str) -> Result<Deployment, kube::Error> {
        let mut state = self.state.lock().unwrap();
        let found = state.deployments.get(name).cloned().ok_or_else(|| {
            api_error(404, "NotFound", &format!("deployments.apps \"{name}\" not found"))
        })?;

        if decrement(&mut state.concurrent_writes, name) {
            state.next_version += 1;
            let version = state.next_version.to_string();
            if let Some(stored) = state.deployments.get_mut(name) {
                stored.metadata.resource_version = Some(version);
            }
        }

        Ok(found)
    }

    async fn replace(
        &self,
        _namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, kube::Error> {
        let mut state = self.state.lock().unwrap();
        if decrement(&mut state.replace_failures, name) {
            return Err(api_error(500, "InternalError", "etcdserver: request timed out"));
        }

        let stored_version = state
            .deployments
            .get(name)
            .and_then(|d| d.metadata.resource_version.clone())
            .ok_or_else(|| {
                api_error(404, "NotFound", &format!("deployments.apps \"{name}\" not found"))
            })?;

        if deployment.metadata.resource_version.as_deref() != Some(stored_version.as_str()) {
            return Err(api_error(
                409,
                "Conflict",
                &format!(
                    "Operation cannot be fulfilled on deployments.apps \"{name}\": the object has been modified; please apply your changes to the latest version and try again"
                ),
            ));
        }

        state.next_version += 1;
        let mut updated = deployment.clone();
        updated.metadata.resource_version = Some(state.next_version.to_string());
        state.deployments.insert(name.to_string(), updated.clone());
        Ok(updated)
    }
}
