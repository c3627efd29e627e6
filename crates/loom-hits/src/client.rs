// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The configured entry point: one store, one tracker per namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use loom_hits_config::{HitsConfig, WindowsConfig};
use loom_hits_core::{CoreError, Keyspace, Namespace};
use tracing::info;

use crate::error::{HitsError, Result};
use crate::store::{HitStore, RedisStore};
use crate::trackable::{Trackable, Tracked};
use crate::tracker::Tracker;

struct Inner {
	config: HitsConfig,
	store: Arc<dyn HitStore>,
	windows: Arc<WindowsConfig>,
	trackers: BTreeMap<Namespace, Tracker>,
}

/// Hit tracking client.
///
/// The namespace allow-list is fixed when the client is built; cloning is
/// cheap and every clone shares the same store handle.
#[derive(Clone)]
pub struct Hits {
	inner: Arc<Inner>,
}

impl std::fmt::Debug for Hits {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Hits")
			.field("key_prefix", &self.inner.config.store.key_prefix)
			.field("namespaces", &self.inner.trackers.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

impl Hits {
	/// Builds a client over `store`, validating `config` first.
	pub fn new(config: HitsConfig, store: Arc<dyn HitStore>) -> Result<Self> {
		config.validate()?;

		let windows = Arc::new(config.windows.clone());
		let mut trackers = BTreeMap::new();
		for (name, hit_types) in &config.namespaces.hit_types {
			let namespace = Namespace::literal(name.as_str());
			let keyspace = Keyspace::new(
				config.store.key_prefix.as_str(),
				namespace.clone(),
				hit_types.iter().cloned(),
			)?;
			trackers.insert(namespace, Tracker::new(keyspace, store.clone(), windows.clone()));
		}

		info!(
			key_prefix = %config.store.key_prefix,
			namespaces = trackers.len(),
			units = ?windows.units,
			"Hit tracking client ready"
		);

		Ok(Self {
			inner: Arc::new(Inner {
				config,
				store,
				windows,
				trackers,
			}),
		})
	}

	/// Connects to the Redis store named by `config.store.url`.
	pub async fn connect(config: HitsConfig) -> Result<Self> {
		let store = RedisStore::connect(&config.store.url).await?;
		Self::new(config, Arc::new(store))
	}

	pub fn config(&self) -> &HitsConfig {
		&self.inner.config
	}

	pub fn store(&self) -> Arc<dyn HitStore> {
		self.inner.store.clone()
	}

	/// Namespaces declared in the configuration.
	pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
		self.inner.trackers.keys()
	}

	/// Tracker for a namespace declared in the configuration.
	pub fn tracker(&self, namespace: &str) -> Result<Tracker> {
		self
			.inner
			.trackers
			.get(&Namespace::literal(namespace))
			.cloned()
			.ok_or_else(|| HitsError::UnknownNamespace(namespace.to_string()))
	}

	/// Configured tracker for `T`'s namespace.
	pub fn tracker_for<T: Trackable>(&self) -> Result<Tracker> {
		self.tracker(T::namespace().as_str())
	}

	/// Tracker for `namespace` that also accepts `hit_types`.
	///
	/// When the namespace is configured, its configured hit types stay
	/// declared alongside the new ones. The returned tracker shares this
	/// client's store and windows but is not registered; [`Hits::tracker`]
	/// keeps returning only configured ones.
	pub fn track_namespace<I, S>(&self, namespace: impl Into<Namespace>, hit_types: I) -> Result<Tracker>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let namespace = namespace.into();
		if namespace.as_str().trim().is_empty() {
			return Err(CoreError::Validation("namespace must not be blank".to_string()).into());
		}
		let hit_types: Vec<String> = hit_types.into_iter().map(Into::into).collect();
		if hit_types.is_empty() || hit_types.iter().any(|h| h.trim().is_empty()) {
			return Err(CoreError::Validation(format!(
				"namespace '{namespace}' needs at least one non-blank hit type"
			))
			.into());
		}

		let configured = self
			.inner
			.trackers
			.get(&namespace)
			.map(|tracker| tracker.hit_types().map(str::to_string).collect::<Vec<_>>())
			.unwrap_or_default();

		let keyspace = Keyspace::new(
			self.inner.config.store.key_prefix.as_str(),
			namespace,
			configured.into_iter().chain(hit_types),
		)?;
		Ok(Tracker::new(
			keyspace,
			self.inner.store.clone(),
			self.inner.windows.clone(),
		))
	}

	/// Ad-hoc tracker for `T`'s namespace.
	pub fn track<T: Trackable, I, S>(&self, hit_types: I) -> Result<Tracker>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.track_namespace(T::namespace(), hit_types)
	}

	/// Binds `entity` to the configured tracker for its namespace.
	pub fn tracked<'a, T: Trackable>(&self, entity: &'a T) -> Result<Tracked<'a, T>> {
		Tracked::new(entity, self.tracker_for::<T>()?)
	}
}
