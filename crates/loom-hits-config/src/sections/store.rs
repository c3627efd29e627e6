// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store connection configuration.

use loom_hits_core::DEFAULT_KEY_PREFIX;
use serde::Deserialize;

pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379";

/// Store configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
	/// Connection URL understood by the store client.
	pub url: String,
	/// First segment of every bucket key.
	pub key_prefix: String,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_STORE_URL.to_string(),
			key_prefix: DEFAULT_KEY_PREFIX.to_string(),
		}
	}
}

/// Store configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub key_prefix: Option<String>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: StoreConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.key_prefix.is_some() {
			self.key_prefix = other.key_prefix;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_STORE_URL.to_string()),
			key_prefix: self
				.key_prefix
				.unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
		}
	}
}
