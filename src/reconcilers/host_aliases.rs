// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reading and writing `spec.template.spec.hostAliases` on Deployments.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::HostAlias;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Host aliases currently set on the Deployment's pod template.
///
/// A missing spec, pod spec or field all read as an empty list.
#[must_use]
pub fn current_host_aliases(deployment: &Deployment) -> Vec<HostAlias> {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .and_then(|pod| pod.host_aliases.clone())
        .unwrap_or_default()
}

/// Replace the pod template's host aliases with `aliases`.
///
/// Full replace, not merge. An empty list clears the field.
pub fn set_host_aliases(deployment: &mut Deployment, aliases: &[HostAlias]) {
    let pod_spec = deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .spec
        .get_or_insert_with(Default::default);

    pod_spec.host_aliases = if aliases.is_empty() {
        None
    } else {
        Some(aliases.to_vec())
    };
}

/// Apply the same alias list to every Deployment in `deployments`.
pub fn patch_host_aliases(deployments: &mut [Deployment], aliases: &[HostAlias]) {
    for deployment in deployments {
        set_host_aliases(deployment, aliases);
    }
}

/// Alias lists of a set of Deployments, keyed by Deployment name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasSnapshot {
    by_name: BTreeMap<String, Vec<HostAlias>>,
}

impl AliasSnapshot {
    /// Record the current aliases of every Deployment.
    #[must_use]
    pub fn capture(deployments: &[Deployment]) -> Self {
        Self {
            by_name: deployments
                .iter()
                .map(|d| (d.name_any(), current_host_aliases(d)))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[HostAlias]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// What the updater writes into each Deployment.
#[derive(Debug, Clone, PartialEq)]
pub enum DesiredAliases {
    /// Same list for every Deployment
    Uniform(Vec<HostAlias>),
    /// Per-Deployment lists; Deployments absent from the snapshot are left alone
    PerDeployment(AliasSnapshot),
}

impl DesiredAliases {
    /// Aliases `name` should end up with, or `None` if it is not to be touched.
    #[must_use]
    pub fn for_deployment(&self, name: &str) -> Option<&[HostAlias]> {
        match self {
            Self::Uniform(aliases) => Some(aliases.as_slice()),
            Self::PerDeployment(snapshot) => snapshot.get(name),
        }
    }
}

#[cfg(test)]
#[path = "host_aliases_tests.rs"]
mod host_aliases_tests;
