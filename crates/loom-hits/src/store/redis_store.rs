// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redis-backed [`HitStore`].

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use super::HitStore;
use crate::error::{HitsError, Result};

/// Expiry in whole seconds, never less than one so keys cannot be created
/// already expired.
fn ttl_secs(ttl: Duration) -> u64 {
	ttl.as_secs().max(1)
}

fn unavailable(command: &'static str) -> impl FnOnce(redis::RedisError) -> HitsError {
	move |err| {
		warn!(command, error = %err, "store command failed");
		HitsError::from(err)
	}
}

/// Store backed by a Redis (or protocol compatible) server.
///
/// Uses a [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects on failure. Clones share the connection.
#[derive(Clone)]
pub struct RedisStore {
	conn: ConnectionManager,
}

impl RedisStore {
	/// Connects to `url`, e.g. `redis://127.0.0.1:6379/0`.
	pub async fn connect(url: &str) -> Result<Self> {
		let client = redis::Client::open(url).map_err(unavailable("CONNECT"))?;
		let conn = ConnectionManager::new(client)
			.await
			.map_err(unavailable("CONNECT"))?;
		debug!("connected to hit store");
		Ok(Self { conn })
	}

	pub fn from_manager(conn: ConnectionManager) -> Self {
		Self { conn }
	}
}

impl std::fmt::Debug for RedisStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedisStore").finish_non_exhaustive()
	}
}

#[async_trait]
impl HitStore for RedisStore {
	async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
		let mut conn = self.conn.clone();
		let added: u64 = redis::cmd("SADD")
			.arg(key)
			.arg(member)
			.query_async(&mut conn)
			.await
			.map_err(unavailable("SADD"))?;
		Ok(added > 0)
	}

	async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
		let mut conn = self.conn.clone();
		let present: bool = redis::cmd("SISMEMBER")
			.arg(key)
			.arg(member)
			.query_async(&mut conn)
			.await
			.map_err(unavailable("SISMEMBER"))?;
		Ok(present)
	}

	async fn scard(&self, key: &str) -> Result<u64> {
		let mut conn = self.conn.clone();
		let count: u64 = redis::cmd("SCARD")
			.arg(key)
			.query_async(&mut conn)
			.await
			.map_err(unavailable("SCARD"))?;
		Ok(count)
	}

	async fn sunion(&self, keys: &[String]) -> Result<BTreeSet<String>> {
		if keys.is_empty() {
			return Ok(BTreeSet::new());
		}
		let mut conn = self.conn.clone();
		let members: HashSet<String> = redis::cmd("SUNION")
			.arg(keys)
			.query_async(&mut conn)
			.await
			.map_err(unavailable("SUNION"))?;
		Ok(members.into_iter().collect())
	}

	async fn sunionstore(&self, destination: &str, keys: &[String], ttl: Duration) -> Result<u64> {
		if keys.is_empty() {
			return Ok(0);
		}
		let mut conn = self.conn.clone();
		let (count,): (u64,) = redis::pipe()
			.atomic()
			.cmd("SUNIONSTORE")
			.arg(destination)
			.arg(keys)
			.cmd("EXPIRE")
			.arg(destination)
			.arg(ttl_secs(ttl))
			.ignore()
			.query_async(&mut conn)
			.await
			.map_err(unavailable("SUNIONSTORE"))?;
		Ok(count)
	}

	async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
		let mut conn = self.conn.clone();
		let _: i64 = redis::cmd("EXPIRE")
			.arg(key)
			.arg(ttl_secs(ttl))
			.query_async(&mut conn)
			.await
			.map_err(unavailable("EXPIRE"))?;
		Ok(())
	}
}
