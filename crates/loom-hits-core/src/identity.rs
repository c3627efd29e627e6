// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier derivation for namespaces, object keys and session identifiers.
//!
//! Tracked values are loosely typed: a hit may be attributed to an entity with
//! an identity (a user, an article), to a bare scalar (an IP address, a
//! number), or to nothing at all. [`Subject`] captures those three cases.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Length of tokens produced by [`quick_token`].
pub const QUICK_TOKEN_LEN: usize = 16;

/// Category of tracked entities that owns a set of hit types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
	/// Uses `name` verbatim.
	pub fn literal(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// Derives a namespace from a (possibly path-qualified) type name.
	///
	/// `MyMod::MyClass` becomes `my_mod_my_class`.
	pub fn from_type_name(name: &str) -> Self {
		Self(underscore(name))
	}

	/// Derives a namespace from the Rust type `T`.
	///
	/// Only the type's own name is used; the module path and generic
	/// arguments are dropped, so `crate::blog::Article<Draft>` becomes
	/// `article`.
	pub fn of<T: ?Sized>() -> Self {
		let full = std::any::type_name::<T>();
		let base = full.split('<').next().unwrap_or(full);
		let last = base.rsplit("::").next().unwrap_or(base);
		Self::from_type_name(last)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for Namespace {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Namespace {
	fn from(name: &str) -> Self {
		Self::literal(name)
	}
}

impl From<String> for Namespace {
	fn from(name: String) -> Self {
		Self::literal(name)
	}
}

/// Converts a CamelCase, possibly `::`-qualified name to snake_case.
///
/// Blank input (empty or whitespace only) is returned unchanged.
pub fn underscore(name: &str) -> String {
	if name.trim().is_empty() {
		return name.to_string();
	}

	let chars: Vec<char> = name.replace("::", "_").replace('-', "_").chars().collect();
	let mut out = String::with_capacity(chars.len() + 4);

	for (i, &c) in chars.iter().enumerate() {
		if c.is_uppercase() {
			if i > 0 {
				let prev = chars[i - 1];
				let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
				// "MyClass" -> my_class, "HTTPServer" -> http_server
				if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
					out.push('_');
				}
			}
			out.extend(c.to_lowercase());
		} else {
			out.push(c);
		}
	}

	out
}

/// A value a hit can be attributed to.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
	/// Nothing was supplied.
	Absent,
	/// A bare value with no identity of its own.
	Scalar(Value),
	/// An identifiable entity.
	Entity { namespace: Namespace, key: String },
}

impl Subject {
	pub fn entity(namespace: Namespace, key: impl Into<String>) -> Self {
		Subject::Entity {
			namespace,
			key: key.into(),
		}
	}

	/// See [`is_blank`]. Entities are never blank.
	pub fn is_blank(&self) -> bool {
		match self {
			Subject::Absent => true,
			Subject::Scalar(value) => is_blank(value),
			Subject::Entity { .. } => false,
		}
	}
}

impl From<Value> for Subject {
	fn from(value: Value) -> Self {
		Subject::Scalar(value)
	}
}

impl From<&str> for Subject {
	fn from(value: &str) -> Self {
		Subject::Scalar(Value::from(value))
	}
}

impl From<String> for Subject {
	fn from(value: String) -> Self {
		Subject::Scalar(Value::from(value))
	}
}

impl From<i64> for Subject {
	fn from(value: i64) -> Self {
		Subject::Scalar(Value::from(value))
	}
}

impl From<u64> for Subject {
	fn from(value: u64) -> Self {
		Subject::Scalar(Value::from(value))
	}
}

impl From<f64> for Subject {
	fn from(value: f64) -> Self {
		Subject::Scalar(Value::from(value))
	}
}

impl From<bool> for Subject {
	fn from(value: bool) -> Self {
		Subject::Scalar(Value::from(value))
	}
}

impl<T: Into<Subject>> From<Option<T>> for Subject {
	fn from(value: Option<T>) -> Self {
		value.map_or(Subject::Absent, Into::into)
	}
}

/// Blank values: `null`, `false`, `""`, `[]` and `{}`.
///
/// Everything else, including `0` and whitespace-only strings, is present.
pub fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Bool(b) => !b,
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(map) => map.is_empty(),
		Value::Number(_) => false,
	}
}

/// Canonical string form of a scalar.
fn scalar_string(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		Value::Number(n) => n.to_string(),
		Value::Bool(b) => b.to_string(),
		other => other.to_string(),
	}
}

/// Stable per-instance key for a tracked object.
///
/// Entities use their id; scalars use the standard base64 encoding of their
/// string form. The encoding is only meant to be reversed while debugging.
pub fn object_key(subject: &Subject) -> Result<String> {
	match subject {
		Subject::Entity { namespace, key } if key.is_empty() => Err(CoreError::Validation(format!(
			"entity in namespace '{namespace}' has an empty id"
		))),
		Subject::Entity { key, .. } => Ok(key.clone()),
		Subject::Scalar(value) if !value.is_null() => Ok(STANDARD.encode(scalar_string(value))),
		_ => Err(CoreError::Validation(
			"cannot derive an object key from an absent value".to_string(),
		)),
	}
}

/// Session identifier contributed by a single subject.
///
/// `""` when absent, `<namespace>:<id>` for entities, the string form of the
/// value otherwise.
pub fn object_session_identifier(subject: &Subject) -> String {
	match subject {
		Subject::Absent => String::new(),
		Subject::Entity { namespace, key } => format!("{namespace}:{key}"),
		Subject::Scalar(value) => scalar_string(value),
	}
}

/// Session identifier from the first non-blank uniqueness attribute.
///
/// Falls back to a random [`quick_token`] when every attribute is blank, so
/// the hit is counted as an anonymous one-off actor.
pub fn uniquenesses_as_session_identifier(uniquenesses: &[Subject]) -> String {
	uniquenesses
		.iter()
		.find(|subject| !subject.is_blank())
		.map(object_session_identifier)
		.unwrap_or_else(quick_token)
}

/// Random alphanumeric token of [`QUICK_TOKEN_LEN`] characters.
pub fn quick_token() -> String {
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(QUICK_TOKEN_LEN)
		.map(char::from)
		.collect()
}
