// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recording and aggregation for one namespace.
//!
//! Queries resolve a window into bucket keys and let the store union them,
//! so a visitor seen in several buckets of the window is counted once.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use loom_hits_config::WindowsConfig;
use loom_hits_core::{
	uniquenesses_as_session_identifier, CoreError, Keyspace, Namespace, Scope, Subject, Window,
};
use tracing::debug;

use crate::error::{HitsError, Result};
use crate::recorder::{HitOutcome, HitRecorder};
use crate::store::HitStore;

/// A hit type paired with the window to read it over.
pub type Series<'a> = (&'a str, Window);

/// Hit tracker bound to a single namespace.
///
/// Cheap to clone; clones share the store handle and the hit-type allow-list.
#[derive(Clone)]
pub struct Tracker {
	keyspace: Arc<Keyspace>,
	store: Arc<dyn HitStore>,
	windows: Arc<WindowsConfig>,
	recorder: HitRecorder,
}

impl std::fmt::Debug for Tracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tracker")
			.field("keyspace", &self.keyspace)
			.field("units", &self.windows.units)
			.finish_non_exhaustive()
	}
}

impl Tracker {
	pub fn new(keyspace: Keyspace, store: Arc<dyn HitStore>, windows: Arc<WindowsConfig>) -> Self {
		let recorder = HitRecorder::new(store.clone(), windows.clone());
		Self {
			keyspace: Arc::new(keyspace),
			store,
			windows,
			recorder,
		}
	}

	pub fn namespace(&self) -> &Namespace {
		self.keyspace.namespace()
	}

	pub fn keyspace(&self) -> &Keyspace {
		&self.keyspace
	}

	pub fn hit_types(&self) -> impl Iterator<Item = &str> {
		self.keyspace.hit_types()
	}

	/// Per-instance scope for a tracked object.
	///
	/// Entities from another namespace are rejected so they cannot be counted
	/// under this one.
	pub fn scope_of(&self, object: &Subject) -> Result<Scope> {
		if let Subject::Entity { namespace, .. } = object {
			if namespace != self.namespace() {
				return Err(CoreError::Validation(format!(
					"entity from namespace '{namespace}' cannot be tracked in '{}'",
					self.namespace()
				))
				.into());
			}
		}
		Ok(Scope::of(object)?)
	}

	/// Records a hit from an explicit session identifier.
	pub async fn record_hit(
		&self,
		object: &Subject,
		hit_type: &str,
		session: &str,
		at: DateTime<Utc>,
	) -> Result<HitOutcome> {
		let instance = match self.scope_of(object)? {
			Scope::Namespace => None,
			Scope::Instance(key) => Some(key),
		};
		self
			.recorder
			.record(&self.keyspace, instance.as_deref(), hit_type, session, at)
			.await
	}

	/// Records a hit now, identifying the actor by the first non-blank
	/// uniqueness (or a random token when there is none).
	pub async fn hit(&self, object: &Subject, hit_type: &str, uniquenesses: &[Subject]) -> Result<HitOutcome> {
		self.hit_at(object, hit_type, uniquenesses, Utc::now()).await
	}

	pub async fn hit_at(
		&self,
		object: &Subject,
		hit_type: &str,
		uniquenesses: &[Subject],
		at: DateTime<Utc>,
	) -> Result<HitOutcome> {
		let session = uniquenesses_as_session_identifier(uniquenesses);
		self.record_hit(object, hit_type, &session, at).await
	}

	/// Number of distinct sessions over `window`, ending now.
	pub async fn unique_count(&self, scope: &Scope, hit_type: &str, window: &Window) -> Result<u64> {
		self.unique_count_at(scope, hit_type, window, Utc::now()).await
	}

	/// [`Tracker::unique_count`] over the configured default window.
	pub async fn unique_count_default(&self, scope: &Scope, hit_type: &str) -> Result<u64> {
		let window = self.windows.default_window;
		self.unique_count(scope, hit_type, &window).await
	}

	/// Number of distinct sessions over `window`, ending at `reference`.
	///
	/// A single bucket is read with `SCARD`. Several buckets are unioned into
	/// a short-lived scratch key with `SUNIONSTORE`, whose reply is the count;
	/// members never leave the store.
	pub async fn unique_count_at(
		&self,
		scope: &Scope,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<u64> {
		let keys = self.resolve(scope, hit_type, window, reference)?;
		let count = match keys.as_slice() {
			[key] => self.store.scard(key).await?,
			_ => {
				let destination = self.keyspace.union_key(scope, hit_type, window, reference)?;
				self
					.store
					.sunionstore(&destination, &keys, self.windows.union_ttl)
					.await?
			}
		};

		debug!(
			namespace = %self.namespace(),
			hit_type,
			%window,
			buckets = keys.len(),
			count,
			"unique count"
		);
		Ok(count)
	}

	/// Distinct session identifiers over `window`, ending now.
	pub async fn unique_members(
		&self,
		scope: &Scope,
		hit_type: &str,
		window: &Window,
	) -> Result<BTreeSet<String>> {
		self
			.unique_members_at(scope, hit_type, window, Utc::now())
			.await
	}

	pub async fn unique_members_at(
		&self,
		scope: &Scope,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<BTreeSet<String>> {
		let keys = self.resolve(scope, hit_type, window, reference)?;
		let members = self.store.sunion(&keys).await?;
		debug!(
			namespace = %self.namespace(),
			hit_type,
			%window,
			buckets = keys.len(),
			members = members.len(),
			"unique members"
		);
		Ok(members)
	}

	/// Sessions present in both series, e.g. visitors who viewed in the last
	/// 30 days and also signed up this week.
	pub async fn overlap_count_at(
		&self,
		scope: &Scope,
		first: Series<'_>,
		second: Series<'_>,
		reference: DateTime<Utc>,
	) -> Result<u64> {
		// Both series are validated before either is read.
		self.resolve(scope, first.0, &first.1, reference)?;
		self.resolve(scope, second.0, &second.1, reference)?;

		let a = self
			.unique_members_at(scope, first.0, &first.1, reference)
			.await?;
		let b = self
			.unique_members_at(scope, second.0, &second.1, reference)
			.await?;
		Ok(a.intersection(&b).count() as u64)
	}

	/// Whether `session` hit `hit_type` in any bucket of the window.
	pub async fn session_hit_at(
		&self,
		scope: &Scope,
		hit_type: &str,
		session: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<bool> {
		let keys = self.resolve(scope, hit_type, window, reference)?;
		// Newest buckets first: recent activity is the common case.
		for key in keys.iter().rev() {
			if self.store.sismember(key, session).await? {
				return Ok(true);
			}
		}
		Ok(false)
	}

	/// Validates a query and returns the bucket keys it reads.
	fn resolve(
		&self,
		scope: &Scope,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<Vec<String>> {
		if !self.windows.is_active(window.unit()) {
			return Err(HitsError::InactiveWindowUnit(window.unit()));
		}
		Ok(self.keyspace.bucket_keys(scope, hit_type, window, reference)?)
	}
}
