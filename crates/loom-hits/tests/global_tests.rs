// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The process-wide client is installed once per process, so the whole
//! lifecycle lives in a single test.

use std::sync::Arc;

use loom_hits::{global, Hits, HitsConfig, HitsError, MemoryStore};

#[test]
fn test_global_lifecycle() {
	assert!(!global::is_configured());
	assert!(matches!(global::get(), Err(HitsError::NotConfigured)));

	let config = HitsConfig::default().with_namespace("article", ["view"]);
	let hits = Hits::new(config.clone(), Arc::new(MemoryStore::new())).unwrap();
	let installed = global::init(hits).unwrap();
	assert!(installed.tracker("article").is_ok());
	assert!(global::is_configured());
	assert!(global::get().unwrap().tracker("user").is_err());

	let again = Hits::new(config, Arc::new(MemoryStore::new())).unwrap();
	assert!(matches!(global::init(again), Err(HitsError::AlreadyConfigured)));

	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.unwrap();
	let err = runtime.block_on(global::configure()).unwrap_err();
	assert!(matches!(err, HitsError::AlreadyConfigured));
}
