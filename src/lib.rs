// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # k8s-host-change - Host alias sync for dogu Deployments
//!
//! Derives a list of `hostAliases` from the namespace's global config and
//! writes it into the pod template of every Deployment labeled `dogu.name`.
//! When any Deployment cannot be updated, all of them are restored to the
//! aliases they had before the run.
//!
//! ## Modules
//!
//! - [`global_config`] - Flat key/value view of the global config ConfigMap
//! - [`alias`] - Host alias generation from global config
//! - [`selector`] - Label selector for dogu Deployments
//! - [`reconcilers`] - Fetch, update and rollback of Deployments
//! - [`config`] - Process settings from the environment
//! - [`errors`] - Error types
//!
//! ## Example
//!
//! ```rust
//! use k8s_host_change::alias::GeneratorConfig;
//! use k8s_host_change::global_config::GlobalConfig;
//!
//! let config = GlobalConfig::from_entries([
//!     ("fqdn", "ces.example.com"),
//!     ("k8s/use_internal_ip", "true"),
//!     ("k8s/internal_ip", "10.0.0.5"),
//! ]);
//!
//! let aliases = GeneratorConfig::from_global_config(&config)
//!     .unwrap()
//!     .to_host_aliases();
//! assert_eq!(aliases[0].ip, "10.0.0.5");
//! ```

pub mod alias;
pub mod config;
pub mod constants;
pub mod errors;
pub mod global_config;
pub mod labels;
pub mod reconcilers;
pub mod selector;
