// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process settings read from the environment.
//!
//! All lookups go through a caller-supplied function so the parsing rules can
//! be exercised without touching the process environment.

use crate::constants::{
    DEFAULT_GLOBAL_CONFIG_MAP, DEFAULT_LOG_FILTER, DEFAULT_NAMESPACE, GLOBAL_CONFIG_MAP_ENV,
    LOG_LEVEL_ENV, NAMESPACE_ENV, RUN_TIMEOUT_ENV, RUST_LOG_ENV, RUST_LOG_FORMAT_ENV,
};
use std::time::Duration;
use thiserror::Error;

/// An environment variable holds a value that cannot be used.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("value of environment variable [{var}] is not valid: '{value}' ({reason})")]
pub struct SettingsError {
    /// Variable name
    pub var: &'static str,
    /// Raw value
    pub value: String,
    /// Why it was rejected
    pub reason: String,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Everything the binary needs to know before connecting to the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Namespace holding the global config and the dogu Deployments
    pub namespace: String,
    /// `EnvFilter` directive string
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Upper bound for a whole run, `None` for no limit
    pub run_timeout: Option<Duration>,
    /// Name of the ConfigMap holding the global config
    pub global_config_map: String,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_lookup`].
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable
    /// or `None` when it is unset.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] naming the variable when `LOG_LEVEL` is not a
    /// known level or `HOST_CHANGE_TIMEOUT_SECS` is not a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let namespace = get(NAMESPACE_ENV).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let log_filter = match (get(RUST_LOG_ENV), get(LOG_LEVEL_ENV)) {
            (Some(filter), _) => filter,
            (None, Some(level)) => level_to_filter(&level)?.to_string(),
            (None, None) => DEFAULT_LOG_FILTER.to_string(),
        };

        let log_format = match get(RUST_LOG_FORMAT_ENV) {
            Some(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let run_timeout = get(RUN_TIMEOUT_ENV)
            .map(|raw| parse_timeout(&raw))
            .transpose()?;

        let global_config_map =
            get(GLOBAL_CONFIG_MAP_ENV).unwrap_or_else(|| DEFAULT_GLOBAL_CONFIG_MAP.to_string());

        Ok(Self {
            namespace,
            log_filter,
            log_format,
            run_timeout,
            global_config_map,
        })
    }
}

/// Map a `LOG_LEVEL` value onto an `EnvFilter` directive.
///
/// # Errors
///
/// Returns [`SettingsError`] for unknown levels.
pub fn level_to_filter(level: &str) -> Result<&'static str, SettingsError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => Ok("error"),
        "warn" | "warning" => Ok("warn"),
        "info" => Ok("info"),
        "debug" => Ok("debug"),
        "trace" => Ok("trace"),
        _ => Err(SettingsError {
            var: LOG_LEVEL_ENV,
            value: level.to_string(),
            reason: "expected one of error, warn, info, debug, trace".to_string(),
        }),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, SettingsError> {
    let invalid = |reason: &str| SettingsError {
        var: RUN_TIMEOUT_ENV,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be greater than zero")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(invalid(&e.to_string())),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
