// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::Deserialize;

use crate::sections::{LoggingConfigLayer, NamespacesConfigLayer, StoreConfigLayer, WindowsConfigLayer};

/// One source's view of the configuration. Absent sections leave lower
/// precedence values untouched when merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitsConfigLayer {
	#[serde(default)]
	pub store: Option<StoreConfigLayer>,
	#[serde(default)]
	pub windows: Option<WindowsConfigLayer>,
	#[serde(default)]
	pub namespaces: Option<NamespacesConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}

impl HitsConfigLayer {
	/// Merges `other` on top of `self`.
	pub fn merge(&mut self, other: HitsConfigLayer) {
		merge_section(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_section(&mut self.windows, other.windows, WindowsConfigLayer::merge);
		merge_section(&mut self.namespaces, other.namespaces, NamespacesConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}
