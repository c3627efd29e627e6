// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declared hit types per namespace.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Namespace configuration (runtime, fully resolved).
///
/// Maps each namespace to the hit types that may be recorded against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespacesConfig {
	pub hit_types: BTreeMap<String, Vec<String>>,
}

impl NamespacesConfig {
	/// Declares `hit_types` for `namespace`, replacing any earlier declaration.
	pub fn declare<I, S>(&mut self, namespace: impl Into<String>, hit_types: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self
			.hit_types
			.insert(namespace.into(), hit_types.into_iter().map(Into::into).collect());
	}

	pub fn get(&self, namespace: &str) -> Option<&[String]> {
		self.hit_types.get(namespace).map(Vec::as_slice)
	}
}

/// Namespace configuration layer (partial, for merging).
///
/// In TOML this is a plain table: `article = ["view", "like"]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct NamespacesConfigLayer {
	pub hit_types: BTreeMap<String, Vec<String>>,
}

impl NamespacesConfigLayer {
	/// Later layers replace whole namespace declarations.
	pub fn merge(&mut self, other: NamespacesConfigLayer) {
		self.hit_types.extend(other.hit_types);
	}

	pub fn finalize(self) -> NamespacesConfig {
		NamespacesConfig {
			hit_types: self.hit_types,
		}
	}
}
