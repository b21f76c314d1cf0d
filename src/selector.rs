// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label selector rendering for Deployment list calls.
//!
//! The API server accepts label selectors only in their string form
//! (`?labelSelector=...`). This module renders a structured
//! [`LabelSelector`] into that syntax:
//!
//! | Selector part                   | Rendered as        |
//! |---------------------------------|--------------------|
//! | `matchLabels: {app: ces}`       | `app=ces`          |
//! | `In [a, b]`                     | `key in (a,b)`     |
//! | `NotIn [a, b]`                  | `key notin (a,b)`  |
//! | `Exists`                        | `key`              |
//! | `DoesNotExist`                  | `!key`             |
//!
//! Requirements are joined with `,` and sorted by key, so the same selector
//! always renders to the same string.

use crate::labels::DOGU_NAME_LABEL;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};

/// Selector matching every Deployment that carries the dogu name label.
#[must_use]
pub fn dogu_selector() -> LabelSelector {
    LabelSelector {
        match_expressions: Some(vec![LabelSelectorRequirement {
            key: DOGU_NAME_LABEL.to_string(),
            operator: "Exists".to_string(),
            values: None,
        }]),
        match_labels: None,
    }
}

/// Render `selector` in the API server's string syntax.
///
/// Operators other than `In`, `NotIn`, `Exists` and `DoesNotExist` are
/// rendered lowercased in set form; the API server rejects them, which
/// surfaces as a failed list call.
#[must_use]
pub fn format_label_selector(selector: &LabelSelector) -> String {
    let mut requirements: Vec<(String, String)> = Vec::new();

    if let Some(labels) = &selector.match_labels {
        requirements.extend(
            labels
                .iter()
                .map(|(key, value)| (key.clone(), format!("{key}={value}"))),
        );
    }

    if let Some(expressions) = &selector.match_expressions {
        requirements.extend(
            expressions
                .iter()
                .map(|req| (req.key.clone(), format_requirement(req))),
        );
    }

    requirements.sort_by(|a, b| a.0.cmp(&b.0));
    requirements
        .into_iter()
        .map(|(_, rendered)| rendered)
        .collect::<Vec<_>>()
        .join(",")
}

fn format_requirement(req: &LabelSelectorRequirement) -> String {
    let values = || {
        let mut values = req.values.clone().unwrap_or_default();
        values.sort();
        values.join(",")
    };

    match req.operator.as_str() {
        "Exists" => req.key.clone(),
        "DoesNotExist" => format!("!{}", req.key),
        "In" => format!("{} in ({})", req.key, values()),
        "NotIn" => format!("{} notin ({})", req.key, values()),
        other => format!("{} {} ({})", req.key, other.to_lowercase(), values()),
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod selector_tests;
