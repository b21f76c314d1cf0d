// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read access to the ecosystem's global config.
//!
//! The global config lives in the `global-config` `ConfigMap` of the target
//! namespace, under the `config.yaml` data key, as a nested YAML document:
//!
//! ```yaml
//! fqdn: ecosystem.example.com
//! k8s:
//!   use_internal_ip: "true"
//!   internal_ip: 10.0.0.17
//! containers:
//!   additional_hosts:
//!     registry: 10.0.0.20
//! ```
//!
//! Readers see it flattened into `/`-separated keys (`k8s/internal_ip`,
//! `containers/additional_hosts/registry`), which is the view the alias
//! generator works with.

use crate::constants::{CONFIG_KEY_SEPARATOR, DEFAULT_GLOBAL_CONFIG_MAP, GLOBAL_CONFIG_DATA_KEY};
use crate::errors::HostChangeError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use serde_yaml::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A flat, immutable snapshot of the global config.
///
/// Keys are kept sorted, so every iteration over the snapshot is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    entries: BTreeMap<String, String>,
}

impl GlobalConfig {
    /// Build a snapshot from flat key/value pairs.
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a nested YAML document and flatten it.
    ///
    /// # Errors
    ///
    /// Returns [`HostChangeError::ConfigStoreUnavailable`] if the document is
    /// not valid YAML, is not a mapping, or contains sequences.
    pub fn from_yaml(document: &str) -> Result<Self, HostChangeError> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }

        let root: Value = serde_yaml::from_str(document).map_err(HostChangeError::store)?;
        let mut entries = BTreeMap::new();
        match &root {
            Value::Null => {}
            Value::Mapping(_) => flatten_into(&mut entries, String::new(), &root)?,
            _ => {
                return Err(HostChangeError::store(
                    "global config document must be a mapping",
                ))
            }
        }

        Ok(Self { entries })
    }

    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// All entries whose key starts with `prefix`, in key order.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten_into(
    entries: &mut BTreeMap<String, String>,
    path: String,
    value: &Value,
) -> Result<(), HostChangeError> {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let segment = scalar_to_string(key).ok_or_else(|| {
                    HostChangeError::store(format!(
                        "global config key below '{path}' is not a scalar"
                    ))
                })?;
                let child_path = if path.is_empty() {
                    segment
                } else {
                    format!("{path}{CONFIG_KEY_SEPARATOR}{segment}")
                };
                flatten_into(entries, child_path, child)?;
            }
            Ok(())
        }
        Value::Sequence(_) => Err(HostChangeError::store(format!(
            "global config key '{path}' holds a list, expected a scalar or mapping"
        ))),
        Value::Tagged(tagged) => flatten_into(entries, path, &tagged.value),
        scalar => {
            entries.insert(path, scalar_to_string(scalar).unwrap_or_default());
            Ok(())
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Source of the global config.
///
/// Implemented by the `ConfigMap` backed reader used in production and by
/// [`GlobalConfig`] itself, so a fixed snapshot can stand in for the store.
#[async_trait]
pub trait GlobalConfigReader: Send + Sync {
    /// Read the complete global config.
    ///
    /// # Errors
    ///
    /// Returns [`HostChangeError::ConfigStoreUnavailable`] if the store cannot
    /// be read or its content cannot be parsed.
    async fn read(&self) -> Result<GlobalConfig, HostChangeError>;
}

#[async_trait]
impl GlobalConfigReader for GlobalConfig {
    async fn read(&self) -> Result<GlobalConfig, HostChangeError> {
        Ok(self.clone())
    }
}

/// Reads the global config from its `ConfigMap`.
pub struct ConfigMapGlobalConfig {
    api: Api<ConfigMap>,
    name: String,
}

impl ConfigMapGlobalConfig {
    /// Reader for the default `global-config` `ConfigMap` in `namespace`.
    #[must_use]
    pub fn new(client: Client, namespace: &str) -> Self {
        Self::with_name(client, namespace, DEFAULT_GLOBAL_CONFIG_MAP)
    }

    /// Reader for a differently named `ConfigMap`.
    #[must_use]
    pub fn with_name(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl GlobalConfigReader for ConfigMapGlobalConfig {
    async fn read(&self) -> Result<GlobalConfig, HostChangeError> {
        debug!(configmap = %self.name, "Reading global config");

        let configmap = self.api.get(&self.name).await.map_err(HostChangeError::store)?;
        let document = configmap
            .data
            .as_ref()
            .and_then(|data| data.get(GLOBAL_CONFIG_DATA_KEY))
            .ok_or_else(|| {
                HostChangeError::store(format!(
                    "configmap '{}' has no '{GLOBAL_CONFIG_DATA_KEY}' entry",
                    self.name
                ))
            })?;

        let config = GlobalConfig::from_yaml(document)?;
        debug!(
            configmap = %self.name,
            entries = config.len(),
            "Global config loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
#[path = "global_config_tests.rs"]
mod global_config_tests;
