// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for recording and querying hits.

use loom_hits_config::ConfigError;
use loom_hits_core::{CoreError, WindowUnit};
use thiserror::Error;

/// Hit tracking errors.
#[derive(Debug, Error)]
pub enum HitsError {
	/// Window, hit type or identifier validation failed.
	#[error(transparent)]
	Core(#[from] CoreError),

	/// The window unit is not recorded by this deployment.
	#[error("window unit '{0}' is not active")]
	InactiveWindowUnit(WindowUnit),

	/// No hit types were declared for the namespace.
	#[error("namespace '{0}' is not tracked")]
	UnknownNamespace(String),

	/// The backing store could not be reached or rejected a command.
	#[error("store unavailable: {0}")]
	StoreUnavailable(String),

	/// The process-wide client was used before [`crate::global::init`].
	#[error("hit tracking is not configured")]
	NotConfigured,

	/// [`crate::global::init`] was called more than once.
	#[error("hit tracking is already configured")]
	AlreadyConfigured,

	/// Configuration failed to load or validate.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl HitsError {
	/// Whether retrying the same call may succeed.
	///
	/// Nothing in this crate retries; callers decide on backoff.
	pub fn is_retryable(&self) -> bool {
		matches!(self, HitsError::StoreUnavailable(_))
	}
}

impl From<redis::RedisError> for HitsError {
	fn from(err: redis::RedisError) -> Self {
		HitsError::StoreUnavailable(err.to_string())
	}
}

/// Result type alias for hit tracking operations.
pub type Result<T> = std::result::Result<T, HitsError>;
