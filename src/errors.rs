// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for host alias generation and Deployment reconciliation.
//!
//! This module provides:
//! - [`HostChangeError`] - every failure kind a run can produce
//! - [`ErrorList`] - an ordered collection of failures rendered as one error
//!
//! Errors are never swallowed. Per-Deployment failures are collected into an
//! [`ErrorList`] and rollback failures are appended to the original apply
//! failure, so the operator always sees the root cause together with
//! everything that went wrong afterwards.

use std::fmt;
use thiserror::Error;

/// Boxed error from a configuration store backend.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All failures that can occur while syncing host aliases.
#[derive(Error, Debug)]
pub enum HostChangeError {
    /// A required key is absent from the global config.
    #[error("key: {key} does not exist in global config")]
    ConfigKeyMissing {
        /// The missing key (e.g. `fqdn`)
        key: String,
    },

    /// A key is present but its value cannot be parsed.
    ///
    /// Returned for non-boolean `k8s/use_internal_ip` values and for
    /// `k8s/internal_ip` values that are not IP literals.
    #[error("failed to parse value '{value}' of field '{key}' in global config: {reason}")]
    ConfigValueInvalid {
        /// The offending key
        key: String,
        /// The raw value as stored
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The configuration store itself could not be read.
    #[error("failed to get global config")]
    ConfigStoreUnavailable {
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Listing the managed Deployments failed.
    #[error("could not list deployments with selector '{selector}'")]
    FetchFailed {
        /// Label selector used for the list call
        selector: String,
        /// Underlying Kubernetes API error
        #[source]
        source: kube::Error,
    },

    /// A Deployment kept conflicting with concurrent writers until the retry
    /// policy gave up.
    #[error(
        "failed to update deployment '{deployment}': conflict persisted after {attempts} attempts"
    )]
    UpdateConflictExhausted {
        /// Name of the Deployment
        deployment: String,
        /// Number of get-modify-update cycles attempted
        attempts: u32,
        /// The last conflict reported by the API server
        #[source]
        source: kube::Error,
    },

    /// A Deployment could not be read or written for a reason other than a
    /// conflict.
    #[error("failed to update deployment '{deployment}'")]
    UpdateFailed {
        /// Name of the Deployment
        deployment: String,
        /// Underlying Kubernetes API error
        #[source]
        source: kube::Error,
    },

    /// Applying the new alias list to the fleet failed.
    #[error("failed to update host-aliases of dogu deployments in cluster")]
    ApplyFailed {
        /// The aggregated per-Deployment failures
        #[source]
        source: Box<HostChangeError>,
    },

    /// The Deployment list could not be re-read before restoring the snapshot.
    #[error("failed to fetch dogu deployments on rollback")]
    RollbackFetchFailed {
        /// The fetch failure
        #[source]
        source: Box<HostChangeError>,
    },

    /// Restoring the captured alias snapshot failed.
    #[error("failed to rollback dogu deployments")]
    RollbackUpdateFailed {
        /// The aggregated per-Deployment restore failures
        #[source]
        source: Box<HostChangeError>,
    },

    /// The run was aborted by a deadline or a shutdown signal.
    #[error("host change run cancelled: {reason}")]
    Cancelled {
        /// What triggered the cancellation
        reason: String,
    },

    /// Several independent failures.
    #[error("{0}")]
    Multiple(ErrorList),
}

impl HostChangeError {
    /// Build a [`HostChangeError::ConfigKeyMissing`] for `key`.
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::ConfigKeyMissing { key: key.into() }
    }

    /// Build a [`HostChangeError::ConfigValueInvalid`].
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ConfigValueInvalid {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Wrap any store backend error.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<StoreError>,
    {
        Self::ConfigStoreUnavailable { source: err.into() }
    }

    /// Iterate over the leaf errors, flattening nested [`ErrorList`]s.
    ///
    /// Wrapping variants (`ApplyFailed`, `RollbackFetchFailed`,
    /// `RollbackUpdateFailed`) are leaves themselves; only `Multiple` is
    /// expanded.
    #[must_use]
    pub fn leaves(&self) -> Vec<&HostChangeError> {
        match self {
            Self::Multiple(list) => list.iter().flat_map(HostChangeError::leaves).collect(),
            other => vec![other],
        }
    }
}

/// Render `err` followed by each of its causes, separated by `: `.
///
/// Matches anyhow's `{:#}` output for a single error.
#[must_use]
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        cause = inner.source();
    }
    rendered
}

/// An ordered list of errors reported as a single error.
///
/// Renders like:
///
/// ```text
/// 2 errors occurred:
///     * failed to update deployment 'cas': ...
///     * failed to update deployment 'ldap': ...
/// ```
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<HostChangeError>,
}

impl ErrorList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error. A nested `Multiple` is flattened into this list.
    pub fn push(&mut self, err: HostChangeError) {
        match err {
            HostChangeError::Multiple(list) => self.errors.extend(list.errors),
            other => self.errors.push(other),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostChangeError> {
        self.errors.iter()
    }

    /// Turn the list into a result: `Ok(())` when empty, `Err(Multiple)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`HostChangeError::Multiple`] holding every collected error.
    pub fn into_result(self) -> Result<(), HostChangeError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(HostChangeError::Multiple(self))
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 {
            "error"
        } else {
            "errors"
        };
        write!(f, "{} {noun} occurred:", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n\t* {}", display_chain(err))?;
        }
        Ok(())
    }
}

impl FromIterator<HostChangeError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = HostChangeError>>(iter: I) -> Self {
        let mut list = Self::new();
        for err in iter {
            list.push(err);
        }
        list
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
