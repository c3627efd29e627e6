// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Binding between application entities and a [`Tracker`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use loom_hits_core::{CoreError, Namespace, Scope, Subject, Window};

use crate::error::Result;
use crate::recorder::HitOutcome;
use crate::tracker::Tracker;

/// An entity whose hits can be counted.
///
/// ```ignore
/// struct Article { id: u64 }
///
/// impl Trackable for Article {
///     fn hit_key(&self) -> Option<String> {
///         Some(self.id.to_string())
///     }
/// }
///
/// assert_eq!(Article::namespace().as_str(), "article");
/// ```
pub trait Trackable {
	/// Namespace every instance is counted under. Defaults to the
	/// underscored type name.
	fn namespace() -> Namespace
	where
		Self: Sized,
	{
		Namespace::of::<Self>()
	}

	/// Stable identity of this instance, or `None` when hits should only be
	/// counted namespace-wide.
	fn hit_key(&self) -> Option<String>;

	fn as_subject(&self) -> Subject
	where
		Self: Sized,
	{
		match self.hit_key() {
			Some(key) => Subject::entity(Self::namespace(), key),
			None => Subject::Absent,
		}
	}
}

/// An entity paired with the tracker for its namespace.
///
/// Every call is scoped to the entity: hits land in both its per-instance
/// buckets and the namespace-wide ones, and queries read the per-instance
/// buckets.
#[derive(Debug, Clone)]
pub struct Tracked<'a, T> {
	entity: &'a T,
	tracker: Tracker,
}

impl<'a, T: Trackable> Tracked<'a, T> {
	pub fn new(entity: &'a T, tracker: Tracker) -> Result<Self> {
		let expected = T::namespace();
		if tracker.namespace() != &expected {
			return Err(CoreError::Validation(format!(
				"tracker for '{}' cannot track entities of namespace '{expected}'",
				tracker.namespace()
			))
			.into());
		}
		Ok(Self { entity, tracker })
	}

	pub fn entity(&self) -> &T {
		self.entity
	}

	pub fn tracker(&self) -> &Tracker {
		&self.tracker
	}

	pub fn scope(&self) -> Result<Scope> {
		self.tracker.scope_of(&self.entity.as_subject())
	}

	pub async fn hit(&self, hit_type: &str, uniquenesses: &[Subject]) -> Result<HitOutcome> {
		self.hit_at(hit_type, uniquenesses, Utc::now()).await
	}

	pub async fn hit_at(
		&self,
		hit_type: &str,
		uniquenesses: &[Subject],
		at: DateTime<Utc>,
	) -> Result<HitOutcome> {
		self
			.tracker
			.hit_at(&self.entity.as_subject(), hit_type, uniquenesses, at)
			.await
	}

	pub async fn unique_count(&self, hit_type: &str, window: &Window) -> Result<u64> {
		self.unique_count_at(hit_type, window, Utc::now()).await
	}

	pub async fn unique_count_at(
		&self,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<u64> {
		let scope = self.scope()?;
		self
			.tracker
			.unique_count_at(&scope, hit_type, window, reference)
			.await
	}

	pub async fn unique_members(&self, hit_type: &str, window: &Window) -> Result<BTreeSet<String>> {
		self.unique_members_at(hit_type, window, Utc::now()).await
	}

	pub async fn unique_members_at(
		&self,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<BTreeSet<String>> {
		let scope = self.scope()?;
		self
			.tracker
			.unique_members_at(&scope, hit_type, window, reference)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::HitsError;
	use crate::store::MemoryStore;
	use chrono::TimeZone;
	use loom_hits_config::WindowsConfig;
	use loom_hits_core::{Keyspace, WindowUnit};
	use std::sync::Arc;

	#[derive(Debug)]
	struct BlogPost {
		id: u64,
	}

	impl Trackable for BlogPost {
		fn hit_key(&self) -> Option<String> {
			Some(self.id.to_string())
		}
	}

	#[derive(Debug)]
	struct Homepage;

	impl Trackable for Homepage {
		fn namespace() -> Namespace {
			Namespace::literal("site")
		}

		fn hit_key(&self) -> Option<String> {
			None
		}
	}

	fn tracker(namespace: &str, store: &MemoryStore) -> Tracker {
		Tracker::new(
			Keyspace::new("hits", Namespace::literal(namespace), ["view"]).unwrap(),
			Arc::new(store.clone()),
			Arc::new(WindowsConfig::default()),
		)
	}

	fn noon() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2011, 2, 15, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_default_namespace_from_type_name() {
		assert_eq!(BlogPost::namespace().as_str(), "blog_post");
		assert_eq!(
			BlogPost { id: 3 }.as_subject(),
			Subject::entity(Namespace::literal("blog_post"), "3")
		);
	}

	#[test]
	fn test_keyless_entity_is_absent() {
		assert_eq!(Homepage.as_subject(), Subject::Absent);
	}

	#[test]
	fn test_namespace_mismatch_rejected() {
		let store = MemoryStore::new();
		let post = BlogPost { id: 1 };
		let err = Tracked::new(&post, tracker("article", &store)).unwrap_err();
		assert!(matches!(err, HitsError::Core(CoreError::Validation(_))));
	}

	#[tokio::test]
	async fn test_tracked_queries_are_instance_scoped() {
		let store = MemoryStore::new();
		let first = BlogPost { id: 1 };
		let second = BlogPost { id: 2 };
		let first_tracked = Tracked::new(&first, tracker("blog_post", &store)).unwrap();
		let second_tracked = Tracked::new(&second, tracker("blog_post", &store)).unwrap();
		let window = Window::new(WindowUnit::Days, 1).unwrap();

		first_tracked
			.hit_at("view", &["alice".into()], noon())
			.await
			.unwrap();
		first_tracked
			.hit_at("view", &["bob".into()], noon())
			.await
			.unwrap();
		second_tracked
			.hit_at("view", &["alice".into()], noon())
			.await
			.unwrap();

		assert_eq!(first_tracked.scope().unwrap(), Scope::instance("1"));
		assert_eq!(
			first_tracked
				.unique_count_at("view", &window, noon())
				.await
				.unwrap(),
			2
		);
		assert_eq!(
			second_tracked
				.unique_members_at("view", &window, noon())
				.await
				.unwrap(),
			BTreeSet::from(["alice".to_string()])
		);
	}

	#[tokio::test]
	async fn test_keyless_entity_counts_namespace_wide() {
		let store = MemoryStore::new();
		let home = Homepage;
		let tracked = Tracked::new(&home, tracker("site", &store)).unwrap();

		tracked.hit_at("view", &["alice".into()], noon()).await.unwrap();

		assert_eq!(tracked.scope().unwrap(), Scope::Namespace);
		assert_eq!(
			store.keys().await,
			vec![
				"hits:site:view:days:2011-02-15",
				"hits:site:view:hours:2011-02-15-12",
				"hits:site:view:months:2011-02",
			]
		);
	}
}
