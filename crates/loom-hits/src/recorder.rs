// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Writes hits into every active bucket.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use loom_hits_config::WindowsConfig;
use loom_hits_core::{CoreError, Keyspace, WindowUnit};
use tracing::debug;

use crate::error::Result;
use crate::store::HitStore;

/// What a single [`HitRecorder::record`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitOutcome {
	/// Buckets the session identifier was added to.
	pub buckets_written: usize,
	/// Buckets where the session identifier was not already present.
	pub new_members: usize,
}

impl HitOutcome {
	/// True when this hit was the session's first in at least one bucket.
	pub fn is_new(&self) -> bool {
		self.new_members > 0
	}
}

/// Adds session identifiers to bucket sets.
///
/// Holds no state of its own beyond shared handles; recording the same
/// session into the same bucket twice is a no-op at the store.
#[derive(Clone)]
pub struct HitRecorder {
	store: Arc<dyn HitStore>,
	windows: Arc<WindowsConfig>,
}

impl HitRecorder {
	pub fn new(store: Arc<dyn HitStore>, windows: Arc<WindowsConfig>) -> Self {
		Self { store, windows }
	}

	/// Records `session` for `hit_type` at every active window unit.
	///
	/// The namespace-wide bucket is always written; the per-instance bucket is
	/// written too when `instance` is given. All keys are computed, and so all
	/// validation happens, before the first store command.
	pub async fn record(
		&self,
		keyspace: &Keyspace,
		instance: Option<&str>,
		hit_type: &str,
		session: &str,
		at: DateTime<Utc>,
	) -> Result<HitOutcome> {
		if session.is_empty() {
			return Err(CoreError::Validation("session identifier must not be empty".to_string()).into());
		}
		if instance.is_some_and(str::is_empty) {
			return Err(CoreError::Validation("instance key must not be empty".to_string()).into());
		}
		keyspace.ensure_declared(hit_type)?;

		let mut writes: Vec<(WindowUnit, String)> = Vec::with_capacity(self.windows.units.len() * 2);
		for &unit in &self.windows.units {
			writes.push((unit, keyspace.build_key(hit_type, unit, &at)?));
			if let Some(instance) = instance {
				writes.push((unit, keyspace.build_instance_key(instance, hit_type, unit, &at)?));
			}
		}

		let mut outcome = HitOutcome::default();
		for (unit, key) in &writes {
			if self.store.sadd(key, session).await? {
				outcome.new_members += 1;
			}
			if let Some(ttl) = self.windows.ttl_for(*unit) {
				self.store.expire(key, ttl).await?;
			}
			outcome.buckets_written += 1;
		}

		debug!(
			namespace = %keyspace.namespace(),
			hit_type,
			instance = instance.unwrap_or_default(),
			buckets = outcome.buckets_written,
			new_members = outcome.new_members,
			"recorded hit"
		);

		Ok(outcome)
	}
}
