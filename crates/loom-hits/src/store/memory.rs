// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process [`HitStore`] for tests and local development.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::HitStore;
use crate::error::Result;

#[derive(Debug, Default)]
struct Entry {
	members: BTreeSet<String>,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_live(&self, now: Instant) -> bool {
		self.expires_at.map_or(true, |at| at > now)
	}
}

/// Sets held in memory behind a [`RwLock`].
///
/// Reads skip expired keys; every write first drops all keys past their
/// deadline. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	sets: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Live keys, sorted.
	pub async fn keys(&self) -> Vec<String> {
		let now = Instant::now();
		let sets = self.sets.read().await;
		let mut keys: Vec<String> = sets
			.iter()
			.filter(|(_, entry)| entry.is_live(now))
			.map(|(key, _)| key.clone())
			.collect();
		keys.sort();
		keys
	}

	/// Remaining lifetime of `key`, if it exists and has an expiry.
	pub async fn ttl(&self, key: &str) -> Option<Duration> {
		let now = Instant::now();
		let sets = self.sets.read().await;
		sets
			.get(key)
			.filter(|entry| entry.is_live(now))
			.and_then(|entry| entry.expires_at)
			.map(|at| at.saturating_duration_since(now))
	}

	fn prune(sets: &mut HashMap<String, Entry>, now: Instant) {
		sets.retain(|_, entry| entry.is_live(now));
	}

	fn union_of(sets: &HashMap<String, Entry>, keys: &[String], now: Instant) -> BTreeSet<String> {
		keys
			.iter()
			.filter_map(|key| sets.get(key))
			.filter(|entry| entry.is_live(now))
			.flat_map(|entry| entry.members.iter().cloned())
			.collect()
	}
}

#[async_trait]
impl HitStore for MemoryStore {
	async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
		let now = Instant::now();
		let mut sets = self.sets.write().await;
		Self::prune(&mut sets, now);
		let entry = sets.entry(key.to_string()).or_default();
		Ok(entry.members.insert(member.to_string()))
	}

	async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
		let now = Instant::now();
		let sets = self.sets.read().await;
		Ok(sets
			.get(key)
			.filter(|entry| entry.is_live(now))
			.is_some_and(|entry| entry.members.contains(member)))
	}

	async fn scard(&self, key: &str) -> Result<u64> {
		let now = Instant::now();
		let sets = self.sets.read().await;
		Ok(sets
			.get(key)
			.filter(|entry| entry.is_live(now))
			.map_or(0, |entry| entry.members.len() as u64))
	}

	async fn sunion(&self, keys: &[String]) -> Result<BTreeSet<String>> {
		let now = Instant::now();
		let sets = self.sets.read().await;
		Ok(Self::union_of(&sets, keys, now))
	}

	async fn sunionstore(&self, destination: &str, keys: &[String], ttl: Duration) -> Result<u64> {
		let now = Instant::now();
		let mut sets = self.sets.write().await;
		Self::prune(&mut sets, now);
		let members = Self::union_of(&sets, keys, now);
		let count = members.len() as u64;
		if members.is_empty() {
			sets.remove(destination);
		} else {
			sets.insert(
				destination.to_string(),
				Entry {
					members,
					expires_at: Some(now + ttl),
				},
			);
		}
		Ok(count)
	}

	async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
		let now = Instant::now();
		let mut sets = self.sets.write().await;
		Self::prune(&mut sets, now);
		if let Some(entry) = sets.get_mut(key) {
			entry.expires_at = Some(now + ttl);
		}
		Ok(())
	}
}
