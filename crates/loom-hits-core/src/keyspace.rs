// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store key construction for hit buckets.
//!
//! Bucket keys have the shape
//!
//! ```text
//! <prefix>:<namespace>[.<instance>]:<hit_type>:<unit>:<label>
//! ```
//!
//! Free-form components are percent-escaped for `%`, `:` and `.` so that two
//! distinct tuples can never produce the same key. The prefix is taken as
//! given and must not contain `:`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::identity::{object_key, Namespace, Subject};
use crate::window::{time_ago_range, Window, WindowUnit};

/// Prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "hits";

/// Which buckets a hit lands in or a query reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
	/// Every object in the namespace.
	Namespace,
	/// A single object, identified by its object key.
	Instance(String),
}

impl Scope {
	pub fn instance(key: impl Into<String>) -> Self {
		Scope::Instance(key.into())
	}

	/// Instance scope for `subject`, or the whole namespace when absent.
	pub fn of(subject: &Subject) -> Result<Self> {
		match subject {
			Subject::Absent => Ok(Scope::Namespace),
			other => object_key(other).map(Scope::Instance),
		}
	}
}

fn escape(component: &str) -> String {
	let mut out = String::with_capacity(component.len());
	for c in component.chars() {
		match c {
			'%' => out.push_str("%25"),
			':' => out.push_str("%3A"),
			'.' => out.push_str("%2E"),
			c => out.push(c),
		}
	}
	out
}

/// Key builder for one namespace and its declared hit types.
///
/// The hit-type allow-list is fixed at construction and only read
/// afterwards, so a `Keyspace` can be shared freely between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
	prefix: String,
	namespace: Namespace,
	hit_types: BTreeSet<String>,
}

impl Keyspace {
	/// Fails with [`CoreError::Validation`] when `prefix` is empty or
	/// contains `:`, since either would let distinct tuples share a key.
	pub fn new<I, S>(prefix: impl Into<String>, namespace: Namespace, hit_types: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let prefix = prefix.into();
		if prefix.is_empty() || prefix.contains(':') {
			return Err(CoreError::Validation(format!(
				"key prefix '{prefix}' must be non-empty and must not contain ':'"
			)));
		}
		Ok(Self {
			prefix,
			namespace,
			hit_types: hit_types.into_iter().map(Into::into).collect(),
		})
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn namespace(&self) -> &Namespace {
		&self.namespace
	}

	pub fn hit_types(&self) -> impl Iterator<Item = &str> {
		self.hit_types.iter().map(String::as_str)
	}

	pub fn is_declared(&self, hit_type: &str) -> bool {
		self.hit_types.contains(hit_type)
	}

	/// Fails with [`CoreError::UndefinedHitType`] for undeclared hit types.
	pub fn ensure_declared(&self, hit_type: &str) -> Result<()> {
		if self.is_declared(hit_type) {
			Ok(())
		} else {
			Err(CoreError::UndefinedHitType {
				namespace: self.namespace.to_string(),
				hit_type: hit_type.to_string(),
			})
		}
	}

	/// Namespace-wide bucket key for the bucket containing `timestamp`.
	pub fn build_key(&self, hit_type: &str, unit: WindowUnit, timestamp: &DateTime<Utc>) -> Result<String> {
		self.bucket_key(&Scope::Namespace, hit_type, unit, timestamp)
	}

	/// Per-object bucket key for the bucket containing `timestamp`.
	pub fn build_instance_key(
		&self,
		instance: &str,
		hit_type: &str,
		unit: WindowUnit,
		timestamp: &DateTime<Utc>,
	) -> Result<String> {
		self.bucket_key(&Scope::instance(instance), hit_type, unit, timestamp)
	}

	pub fn bucket_key(
		&self,
		scope: &Scope,
		hit_type: &str,
		unit: WindowUnit,
		timestamp: &DateTime<Utc>,
	) -> Result<String> {
		Ok(format!(
			"{}:{}",
			self.series(scope, hit_type, unit)?,
			unit.bucket_label(timestamp)
		))
	}

	/// Keys of every bucket covering `window` up to `reference`, oldest first.
	///
	/// Duplicates are removed; with 30-day months two steps can fall in the
	/// same calendar month.
	pub fn bucket_keys(
		&self,
		scope: &Scope,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<Vec<String>> {
		let series = self.series(scope, hit_type, window.unit())?;
		let mut seen = BTreeSet::new();
		let mut keys = Vec::with_capacity(window.count() as usize);
		for timestamp in time_ago_range(reference, window)? {
			let label = window.unit().bucket_label(&timestamp);
			if seen.insert(label.clone()) {
				keys.push(format!("{series}:{label}"));
			}
		}
		Ok(keys)
	}

	/// Scratch key that receives the union of a window's buckets.
	pub fn union_key(
		&self,
		scope: &Scope,
		hit_type: &str,
		window: &Window,
		reference: DateTime<Utc>,
	) -> Result<String> {
		let series = self.series(scope, hit_type, window.unit())?;
		let times = time_ago_range(reference, window)?;
		let unit = window.unit();
		let first = times.first().map(|t| unit.bucket_label(t)).unwrap_or_default();
		let last = times.last().map(|t| unit.bucket_label(t)).unwrap_or_default();
		Ok(format!("{series}:union:{}:{first}:{last}", window.count()))
	}

	/// Everything in a bucket key except the label.
	fn series(&self, scope: &Scope, hit_type: &str, unit: WindowUnit) -> Result<String> {
		self.ensure_declared(hit_type)?;
		let owner = match scope {
			Scope::Namespace => escape(self.namespace.as_str()),
			Scope::Instance(key) => format!("{}.{}", escape(self.namespace.as_str()), escape(key)),
		};
		Ok(format!(
			"{}:{owner}:{}:{}",
			self.prefix,
			escape(hit_type),
			unit.as_str()
		))
	}
}
