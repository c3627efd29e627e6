// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Set-oriented key/value store used as the only persistence layer.
//!
//! The trait mirrors the handful of Redis set commands hit tracking needs.
//! Every method is a single atomic store operation; implementations must be
//! safe to call from many tasks at once.

mod memory;
mod redis_store;

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

#[async_trait]
pub trait HitStore: Send + Sync {
	/// `SADD`: returns true when `member` was not already in the set.
	async fn sadd(&self, key: &str, member: &str) -> Result<bool>;

	/// `SISMEMBER`.
	async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

	/// `SCARD`: zero for missing keys.
	async fn scard(&self, key: &str) -> Result<u64>;

	/// `SUNION` of `keys`; missing keys count as empty sets.
	async fn sunion(&self, keys: &[String]) -> Result<BTreeSet<String>>;

	/// `SUNIONSTORE` into `destination` followed by `EXPIRE destination ttl`,
	/// executed atomically. Returns the cardinality of the union.
	async fn sunionstore(&self, destination: &str, keys: &[String], ttl: Duration) -> Result<u64>;

	/// `EXPIRE`: no-op for missing keys.
	async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
}
