// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the host change job.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Global Config Keys
// ============================================================================

/// Public fully-qualified domain name of the ecosystem
pub const FQDN_KEY: &str = "fqdn";

/// Boolean literal gating the split-horizon alias for the FQDN
pub const USE_INTERNAL_IP_KEY: &str = "k8s/use_internal_ip";

/// IP literal the FQDN resolves to from inside the cluster
pub const INTERNAL_IP_KEY: &str = "k8s/internal_ip";

/// Prefix of all additional static host mappings (`<prefix><hostname>` = ip)
pub const ADDITIONAL_HOSTS_PREFIX: &str = "containers/additional_hosts/";

/// Separator used when flattening the nested global config document into keys
pub const CONFIG_KEY_SEPARATOR: &str = "/";

// ============================================================================
// Global Config Storage
// ============================================================================

/// Name of the `ConfigMap` holding the global config
pub const DEFAULT_GLOBAL_CONFIG_MAP: &str = "global-config";

/// Data key inside the global config `ConfigMap`
pub const GLOBAL_CONFIG_DATA_KEY: &str = "config.yaml";

// ============================================================================
// Process Environment
// ============================================================================

/// Environment variable naming the target namespace
pub const NAMESPACE_ENV: &str = "NAMESPACE";

/// Namespace used when `NAMESPACE` is absent or empty
pub const DEFAULT_NAMESPACE: &str = "default";

/// Standard tracing filter variable
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Legacy log level variable (error, warn, info, debug)
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Output format of the log subscriber (text or json)
pub const RUST_LOG_FORMAT_ENV: &str = "RUST_LOG_FORMAT";

/// Optional deadline for one run, in seconds
pub const RUN_TIMEOUT_ENV: &str = "HOST_CHANGE_TIMEOUT_SECS";

/// Optional override of the global config `ConfigMap` name
pub const GLOBAL_CONFIG_MAP_ENV: &str = "GLOBAL_CONFIG_MAP";

/// Log filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set
pub const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// Conflict Retry
// ============================================================================

/// Attempts per Deployment before a conflict is reported as exhausted
pub const CONFLICT_RETRY_MAX_ATTEMPTS: u32 = 5;

/// Delay before the first conflict retry (10ms)
pub const CONFLICT_RETRY_INITIAL_INTERVAL_MILLIS: u64 = 10;

/// Upper bound for the delay between conflict retries (1 second)
pub const CONFLICT_RETRY_MAX_INTERVAL_MILLIS: u64 = 1000;

/// Backoff multiplier (exponential growth factor)
pub const CONFLICT_RETRY_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent lockstep retries (±10%)
pub const CONFLICT_RETRY_RANDOMIZATION_FACTOR: f64 = 0.1;

// ============================================================================
// Kubernetes API
// ============================================================================

/// HTTP status code the API server returns for optimistic-concurrency conflicts
pub const HTTP_STATUS_CONFLICT: u16 = 409;
