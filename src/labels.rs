// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label constants used to select the Deployments whose host aliases are managed.

/// Workload identity label carried by every dogu Deployment.
///
/// Deployments are in scope when this label is present, whatever its value.
pub const DOGU_NAME_LABEL: &str = "dogu.name";

