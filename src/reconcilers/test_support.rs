// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`DeploymentApi`] used by the reconciler unit tests.

use crate::reconcilers::deployment_api::DeploymentApi;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{HostAlias, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

pub const TEST_NAMESPACE: &str = "ecosystem";

pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(
        kube::core::Status::failure(message, reason)
            .with_code(code)
            .boxed(),
    )
}

pub fn conflict_error(name: &str) -> kube::Error {
    api_error(
        409,
        "Conflict",
        &format!("Operation cannot be fulfilled on deployments.apps \"{name}\": the object has been modified"),
    )
}

pub fn alias(ip: &str, hostname: &str) -> HostAlias {
    HostAlias {
        ip: ip.to_string(),
        hostnames: Some(vec![hostname.to_string()]),
    }
}

pub fn dogu_deployment(name: &str, aliases: Option<Vec<HostAlias>>) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            labels: Some(BTreeMap::from([
                ("app".to_string(), "ces".to_string()),
                ("dogu.name".to_string(), name.to_string()),
            ])),
            resource_version: Some("1".to_string()),
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

/// A failure scripted for one call: HTTP code and reason.
#[derive(Clone, Copy)]
pub struct Failure {
    pub code: u16,
    pub reason: &'static str,
}

pub const CONFLICT: Failure = Failure {
    code: 409,
    reason: "Conflict",
};

pub const FORBIDDEN: Failure = Failure {
    code: 403,
    reason: "Forbidden",
};

#[derive(Default)]
struct State {
    deployments: BTreeMap<String, Deployment>,
    list_failures: VecDeque<Failure>,
    get_failures: HashMap<String, VecDeque<Failure>>,
    replace_failures: HashMap<String, VecDeque<Failure>>,
    get_calls: Vec<String>,
    replace_calls: Vec<String>,
    list_selectors: Vec<String>,
}

/// Deployment store with scripted per-call failures.
#[derive(Default)]
pub struct FakeDeploymentApi {
    state: Mutex<State>,
}

impl FakeDeploymentApi {
    pub fn with_deployments(deployments: Vec<Deployment>) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            for d in deployments {
                state.deployments.insert(d.name_any(), d);
            }
        }
        api
    }

    pub fn fail_list(&self, failure: Failure) {
        self.state.lock().unwrap().list_failures.push_back(failure);
    }

    pub fn fail_get(&self, name: &str, failure: Failure) {
        self.state
            .lock()
            .unwrap()
            .get_failures
            .entry(name.to_string())
            .or_default()
            .push_back(failure);
    }

    pub fn fail_replace(&self, name: &str, failure: Failure) {
        self.state
            .lock()
            .unwrap()
            .replace_failures
            .entry(name.to_string())
            .or_default()
            .push_back(failure);
    }

    pub fn stored(&self, name: &str) -> Option<Deployment> {
        self.state.lock().unwrap().deployments.get(name).cloned()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().get_calls.clone()
    }

    pub fn replace_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().replace_calls.clone()
    }

    pub fn list_selectors(&self) -> Vec<String> {
        self.state.lock().unwrap().list_selectors.clone()
    }
}

fn to_error(failure: Failure, name: &str) -> kube::Error {
    api_error(failure.code, failure.reason, &format!("{} for {name}", failure.reason))
}

#[async_trait]
impl DeploymentApi for FakeDeploymentApi {
    async fn list(
        &self,
        _namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Deployment>, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.list_selectors.push(label_selector.to_string());
        if let Some(failure) = state.list_failures.pop_front() {
            return Err(to_error(failure, "list"));
        }
        Ok(state.deployments.values().cloned().collect())
    }

    async fn get(&self, _namespace: &str, name: &str) -> Result<Deployment, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.get_calls.push(name.to_string());
        if let Some(failure) = state.get_failures.get_mut(name).and_then(VecDeque::pop_front) {
            return Err(to_error(failure, name));
        }
        state.deployments.get(name).cloned().ok_or_else(|| {
            api_error(
                404,
                "NotFound",
                &format!("deployments.apps \"{name}\" not found"),
            )
        })
    }

    async fn replace(
        &self,
        _namespace: &str,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, kube::Error> {
        let mut state = self.state.lock().unwrap();
        state.replace_calls.push(name.to_string());
        if let Some(failure) = state
            .replace_failures
            .get_mut(name)
            .and_then(VecDeque::pop_front)
        {
            return Err(to_error(failure, name));
        }
        state
            .deployments
            .insert(name.to_string(), deployment.clone());
        Ok(deployment.clone())
    }
}
