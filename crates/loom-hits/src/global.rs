// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide client.
//!
//! Initialization is explicit and happens once; every accessor reports
//! [`HitsError::NotConfigured`] until then.

use std::sync::OnceLock;

use tracing::info;

use crate::client::Hits;
use crate::error::{HitsError, Result};

static HITS: OnceLock<Hits> = OnceLock::new();

/// Installs `hits` as the process-wide client.
pub fn init(hits: Hits) -> Result<&'static Hits> {
	HITS.set(hits).map_err(|_| HitsError::AlreadyConfigured)?;
	info!("process-wide hit tracking configured");
	get()
}

/// The process-wide client.
pub fn get() -> Result<&'static Hits> {
	HITS.get().ok_or(HitsError::NotConfigured)
}

pub fn is_configured() -> bool {
	HITS.get().is_some()
}

/// Loads configuration from the standard sources, connects to the store
/// and installs the result.
pub async fn configure() -> Result<&'static Hits> {
	if is_configured() {
		return Err(HitsError::AlreadyConfigured);
	}
	let config = loom_hits_config::load_config()?;
	let hits = Hits::connect(config).await?;
	init(hits)
}
