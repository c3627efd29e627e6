// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Window granularity configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use loom_hits_core::{Window, WindowUnit};
use serde::Deserialize;

pub const DEFAULT_UNION_TTL_SECS: u64 = 60;

fn default_window() -> Window {
	// 7 is non-zero, so this cannot fail.
	Window::new(WindowUnit::Days, 7).unwrap_or_else(|_| unreachable!())
}

/// Window configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsConfig {
	/// Units every hit is recorded at. Queries for other units are rejected.
	pub units: Vec<WindowUnit>,
	/// Window used by convenience queries that take none.
	pub default_window: Window,
	/// Store-level expiry applied to buckets of each unit.
	pub bucket_ttl: BTreeMap<WindowUnit, Duration>,
	/// Lifetime of scratch union keys.
	pub union_ttl: Duration,
}

impl WindowsConfig {
	pub fn is_active(&self, unit: WindowUnit) -> bool {
		self.units.contains(&unit)
	}

	pub fn ttl_for(&self, unit: WindowUnit) -> Option<Duration> {
		self.bucket_ttl.get(&unit).copied()
	}
}

impl Default for WindowsConfig {
	fn default() -> Self {
		WindowsConfigLayer::default().finalize()
	}
}

/// Window configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowsConfigLayer {
	#[serde(default)]
	pub units: Option<Vec<WindowUnit>>,
	#[serde(default, rename = "default")]
	pub default_window: Option<Window>,
	#[serde(default)]
	pub ttl_secs: Option<BTreeMap<WindowUnit, u64>>,
	#[serde(default)]
	pub union_ttl_secs: Option<u64>,
}

impl WindowsConfigLayer {
	pub fn merge(&mut self, other: WindowsConfigLayer) {
		if other.units.is_some() {
			self.units = other.units;
		}
		if other.default_window.is_some() {
			self.default_window = other.default_window;
		}
		if let Some(ttls) = other.ttl_secs {
			self.ttl_secs.get_or_insert_with(BTreeMap::new).extend(ttls);
		}
		if other.union_ttl_secs.is_some() {
			self.union_ttl_secs = other.union_ttl_secs;
		}
	}

	pub fn finalize(self) -> WindowsConfig {
		let mut units = self.units.unwrap_or_else(|| WindowUnit::ALL.to_vec());
		units.sort();
		units.dedup();

		WindowsConfig {
			units,
			default_window: self.default_window.unwrap_or_else(default_window),
			bucket_ttl: self
				.ttl_secs
				.unwrap_or_default()
				.into_iter()
				.map(|(unit, secs)| (unit, Duration::from_secs(secs)))
				.collect(),
			union_ttl: Duration::from_secs(self.union_ttl_secs.unwrap_or(DEFAULT_UNION_TTL_SECS)),
		}
	}
}
