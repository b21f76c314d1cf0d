// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host alias generation from the global config.
//!
//! The generator derives the complete `hostAliases` list every managed
//! Deployment should carry:
//!
//! 1. **Split-horizon entry** - when `k8s/use_internal_ip` is enabled, the
//!    public FQDN is mapped to `k8s/internal_ip`, so pods reach the ecosystem
//!    through the internal address instead of leaving the cluster.
//! 2. **Additional hosts** - every `containers/additional_hosts/<hostname>`
//!    entry becomes one alias mapping its value to `<hostname>`.
//!
//! The split-horizon entry always comes first. Additional hosts follow,
//! sorted by hostname, so identical config always yields an identical list.
//!
//! # Example
//!
//! ```rust,no_run
//! use k8s_host_change::alias::{AliasGenerator, HostAliasGenerator};
//! use k8s_host_change::global_config::GlobalConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), k8s_host_change::errors::HostChangeError> {
//! let config = GlobalConfig::from_entries([
//!     ("fqdn", "ecosystem.example.com"),
//!     ("k8s/use_internal_ip", "true"),
//!     ("k8s/internal_ip", "10.0.0.17"),
//! ]);
//! let generator = HostAliasGenerator::new(Arc::new(config));
//! let aliases = generator.generate().await?;
//! assert_eq!(aliases[0].ip, "10.0.0.17");
//! # Ok(())
//! # }
//! ```

use crate::constants::{ADDITIONAL_HOSTS_PREFIX, FQDN_KEY, INTERNAL_IP_KEY, USE_INTERNAL_IP_KEY};
use crate::errors::HostChangeError;
use crate::global_config::{GlobalConfig, GlobalConfigReader};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::HostAlias;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces the host alias list for one run.
#[async_trait]
pub trait AliasGenerator: Send + Sync {
    /// Generate the ordered alias list.
    ///
    /// # Errors
    ///
    /// Returns [`HostChangeError::ConfigKeyMissing`],
    /// [`HostChangeError::ConfigValueInvalid`] or
    /// [`HostChangeError::ConfigStoreUnavailable`]. No partial list is ever
    /// returned.
    async fn generate(&self) -> Result<Vec<HostAlias>, HostChangeError>;
}

/// Host-specific values extracted from the global config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Public fully-qualified domain name
    pub fqdn: String,
    /// Whether the split-horizon entry is emitted
    pub use_internal_ip: bool,
    /// Internal address, present only when `use_internal_ip` is set
    pub internal_ip: Option<IpAddr>,
    /// Hostname to configured value, sorted by hostname
    pub additional_hosts: BTreeMap<String, String>,
}

impl GeneratorConfig {
    /// Extract and validate the host-specific keys.
    ///
    /// # Errors
    ///
    /// - `ConfigKeyMissing` if `fqdn` is absent, or if `k8s/internal_ip` is
    ///   absent while internal IP usage is enabled
    /// - `ConfigValueInvalid` if `k8s/use_internal_ip` is not a boolean
    ///   literal or `k8s/internal_ip` is not an IP literal
    pub fn from_global_config(config: &GlobalConfig) -> Result<Self, HostChangeError> {
        let fqdn = config
            .get(FQDN_KEY)
            .ok_or_else(|| HostChangeError::missing_key(FQDN_KEY))?
            .to_string();

        let use_internal_ip = match config.get(USE_INTERNAL_IP_KEY) {
            Some(raw) => parse_bool_literal(raw).ok_or_else(|| {
                HostChangeError::invalid_value(
                    USE_INTERNAL_IP_KEY,
                    raw,
                    "not a valid boolean literal",
                )
            })?,
            None => {
                debug!(key = USE_INTERNAL_IP_KEY, "Key not set, internal IP disabled");
                false
            }
        };

        let internal_ip = if use_internal_ip {
            let raw = config
                .get(INTERNAL_IP_KEY)
                .ok_or_else(|| HostChangeError::missing_key(INTERNAL_IP_KEY))?;
            let ip = raw.parse::<IpAddr>().map_err(|_| {
                HostChangeError::invalid_value(INTERNAL_IP_KEY, raw, "not a valid ip")
            })?;
            Some(ip)
        } else {
            None
        };

        let mut additional_hosts = BTreeMap::new();
        for (key, value) in config.with_prefix(ADDITIONAL_HOSTS_PREFIX) {
            let hostname = key.strip_prefix(ADDITIONAL_HOSTS_PREFIX).unwrap_or_default();
            if hostname.is_empty() {
                warn!(key, "Ignoring additional host entry without hostname");
                continue;
            }
            additional_hosts.insert(hostname.to_string(), value.to_string());
        }

        Ok(Self {
            fqdn,
            use_internal_ip,
            internal_ip,
            additional_hosts,
        })
    }

    /// Build the alias list: split-horizon entry first, then additional hosts
    /// by hostname.
    #[must_use]
    pub fn to_host_aliases(&self) -> Vec<HostAlias> {
        let mut aliases = Vec::with_capacity(self.additional_hosts.len() + 1);

        if let Some(ip) = self.internal_ip {
            aliases.push(host_alias(ip.to_string(), &self.fqdn));
        }

        aliases.extend(
            self.additional_hosts
                .iter()
                .map(|(hostname, ip)| host_alias(ip.clone(), hostname)),
        );

        aliases
    }
}

fn host_alias(ip: String, hostname: &str) -> HostAlias {
    HostAlias {
        ip,
        hostnames: Some(vec![hostname.to_string()]),
    }
}

/// Parse a boolean literal.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
#[must_use]
pub fn parse_bool_literal(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// [`AliasGenerator`] backed by the global config.
pub struct HostAliasGenerator {
    config_reader: Arc<dyn GlobalConfigReader>,
}

impl HostAliasGenerator {
    #[must_use]
    pub fn new(config_reader: Arc<dyn GlobalConfigReader>) -> Self {
        Self { config_reader }
    }
}

#[async_trait]
impl AliasGenerator for HostAliasGenerator {
    async fn generate(&self) -> Result<Vec<HostAlias>, HostChangeError> {
        let global_config = self.config_reader.read().await?;
        let config = GeneratorConfig::from_global_config(&global_config)?;

        debug!(
            fqdn = %config.fqdn,
            use_internal_ip = config.use_internal_ip,
            additional_hosts = config.additional_hosts.len(),
            "Read host configuration"
        );

        Ok(config.to_host_aliases())
    }
}

/// Render aliases as `ip=host1,host2` pairs for log output.
#[must_use]
pub fn describe_aliases(aliases: &[HostAlias]) -> String {
    aliases
        .iter()
        .map(|alias| {
            let hostnames = alias.hostnames.as_deref().unwrap_or_default().join(",");
            format!("{}={hostnames}", alias.ip)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "alias_tests.rs"]
mod alias_tests;
