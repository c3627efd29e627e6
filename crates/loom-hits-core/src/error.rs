// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for hit tracking primitives.

use thiserror::Error;

/// Errors raised by windowing, identifier derivation and key construction.
///
/// All of these are validation failures: they are raised before any store
/// command is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
	/// The window options were absent, ambiguous or malformed.
	#[error("invalid window spec: {0}")]
	InvalidWindowSpec(String),

	/// The hit type was never declared for the namespace.
	#[error("undefined hit type '{hit_type}' for namespace '{namespace}'")]
	UndefinedHitType { namespace: String, hit_type: String },

	/// An identifier or entity could not be used for derivation.
	#[error("validation failed: {0}")]
	Validation(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
