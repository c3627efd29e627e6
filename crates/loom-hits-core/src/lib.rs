// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core primitives for Loom hit tracking.
//!
//! Everything here is pure: no store access, no clocks other than the
//! timestamps callers pass in.
//!
//! - [`window`]: window units, bucket labels and time ranges
//! - [`identity`]: namespaces, object keys and session identifiers
//! - [`keyspace`]: bucket key construction and hit-type validation

pub mod error;
pub mod identity;
pub mod keyspace;
pub mod window;

pub use error::{CoreError, Result};
pub use identity::{
	is_blank, object_key, object_session_identifier, quick_token, underscore,
	uniquenesses_as_session_identifier, Namespace, Subject,
};
pub use keyspace::{Keyspace, Scope, DEFAULT_KEY_PREFIX};
pub use window::{
	extract_window_unit, time_ago, time_ago_range, Window, WindowUnit, MAX_WINDOW_COUNT,
};
