// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Time windowing: mapping a unit/count pair to bucket timestamps.
//!
//! All arithmetic happens in UTC so that bucket labels produced by
//! [`WindowUnit::bucket_label`] always agree with the timestamps produced by
//! [`time_ago`] and [`time_ago_range`].
//!
//! A "month" is a fixed 30 days, not a calendar month. Existing keyspaces
//! depend on this, so it must not change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Granularity at which buckets are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowUnit {
	#[serde(alias = "hour")]
	Hours,
	#[serde(alias = "day")]
	Days,
	#[serde(alias = "month")]
	Months,
}

impl WindowUnit {
	/// Every supported unit, finest first.
	pub const ALL: [WindowUnit; 3] = [WindowUnit::Hours, WindowUnit::Days, WindowUnit::Months];

	pub fn as_str(&self) -> &'static str {
		match self {
			WindowUnit::Hours => "hours",
			WindowUnit::Days => "days",
			WindowUnit::Months => "months",
		}
	}

	/// strftime pattern used for bucket labels.
	pub fn label_format(&self) -> &'static str {
		match self {
			WindowUnit::Hours => "%F-%H",
			WindowUnit::Days => "%F",
			WindowUnit::Months => "%Y-%m",
		}
	}

	/// Canonical bucket label for the bucket containing `timestamp`.
	///
	/// Two timestamps inside the same real-world bucket always produce the
	/// same label.
	pub fn bucket_label(&self, timestamp: &DateTime<Utc>) -> String {
		timestamp.format(self.label_format()).to_string()
	}

	/// Truncates `timestamp` to the start of its bucket.
	pub fn truncate(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
		let date = timestamp.date_naive();
		let (date, hour) = match self {
			WindowUnit::Hours => (date, timestamp.hour()),
			WindowUnit::Days => (date, 0),
			WindowUnit::Months => (date.with_day(1).unwrap_or(date), 0),
		};
		match date.and_hms_opt(hour, 0, 0) {
			Some(start) => start.and_utc(),
			None => timestamp,
		}
	}

	/// Length of `count` units. `None` when it does not fit in a [`TimeDelta`].
	pub fn span(&self, count: u32) -> Option<TimeDelta> {
		let count = i64::from(count);
		match self {
			WindowUnit::Hours => TimeDelta::try_hours(count),
			WindowUnit::Days => TimeDelta::try_hours(count.checked_mul(24)?),
			WindowUnit::Months => TimeDelta::try_days(count.checked_mul(30)?),
		}
	}

	/// The timestamp `count` units before `reference`.
	pub fn ago(&self, reference: DateTime<Utc>, count: u32) -> Result<DateTime<Utc>> {
		self
			.span(count)
			.and_then(|span| reference.checked_sub_signed(span))
			.ok_or_else(|| {
				CoreError::InvalidWindowSpec(format!(
					"{count} {} before {reference} is out of range",
					self.as_str()
				))
			})
	}
}

impl fmt::Display for WindowUnit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for WindowUnit {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"hour" | "hours" => Ok(WindowUnit::Hours),
			"day" | "days" => Ok(WindowUnit::Days),
			"month" | "months" => Ok(WindowUnit::Months),
			other => Err(CoreError::InvalidWindowSpec(format!(
				"unknown window unit '{other}'"
			))),
		}
	}
}

/// Largest accepted window count. A query touches one bucket per step, so
/// this bounds the keys built for a single query.
pub const MAX_WINDOW_COUNT: u32 = 100_000;

/// A span of `count` whole units, e.g. "7 days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
	unit: WindowUnit,
	count: u32,
}

impl Window {
	pub fn new(unit: WindowUnit, count: u32) -> Result<Self> {
		if count == 0 {
			return Err(CoreError::InvalidWindowSpec(format!(
				"window count for {unit} must be positive"
			)));
		}
		if count > MAX_WINDOW_COUNT {
			return Err(CoreError::InvalidWindowSpec(format!(
				"window of {count} {unit} exceeds the limit of {MAX_WINDOW_COUNT}"
			)));
		}
		Ok(Self { unit, count })
	}

	pub fn unit(&self) -> WindowUnit {
		self.unit
	}

	pub fn count(&self) -> u32 {
		self.count
	}
}

impl fmt::Display for Window {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.count, self.unit)
	}
}

impl Serialize for Window {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = Map::new();
		map.insert(self.unit.as_str().to_string(), Value::from(self.count));
		map.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Window {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let options = Map::<String, Value>::deserialize(deserializer)?;
		extract_window_unit(&options).map_err(D::Error::custom)
	}
}

/// Pulls the single `unit => count` pair out of an options map.
///
/// Keys that are not window units are ignored, so the map may carry other
/// query options alongside the window.
pub fn extract_window_unit(options: &Map<String, Value>) -> Result<Window> {
	let mut found: Option<(WindowUnit, &Value)> = None;

	for (key, value) in options {
		let Ok(unit) = key.parse::<WindowUnit>() else {
			continue;
		};
		if let Some((existing, _)) = found {
			return Err(CoreError::InvalidWindowSpec(format!(
				"expected exactly one time unit, found {existing} and {unit}"
			)));
		}
		found = Some((unit, value));
	}

	let (unit, value) = found.ok_or_else(|| {
		CoreError::InvalidWindowSpec("no time unit (hours, days or months) present".to_string())
	})?;

	let count = value
		.as_u64()
		.and_then(|count| u32::try_from(count).ok())
		.filter(|count| *count > 0)
		.ok_or_else(|| {
			CoreError::InvalidWindowSpec(format!(
				"count for {unit} must be a positive integer, got {value}"
			))
		})?;

	Window::new(unit, count)
}

/// The timestamp `window.count()` units before `reference`.
pub fn time_ago(reference: DateTime<Utc>, window: &Window) -> Result<DateTime<Utc>> {
	window.unit.ago(reference, window.count)
}

/// Ascending timestamps, one per bucket, ending at `reference`.
///
/// The result always has exactly `window.count()` elements; the first is
/// `count - 1` units before `reference`.
pub fn time_ago_range(reference: DateTime<Utc>, window: &Window) -> Result<Vec<DateTime<Utc>>> {
	(0..window.count)
		.rev()
		.map(|n| window.unit.ago(reference, n))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use proptest::prelude::*;
	use serde_json::json;

	fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
	}

	fn reference() -> DateTime<Utc> {
		at(2011, 2, 15, 12)
	}

	fn options(value: Value) -> Map<String, Value> {
		value.as_object().cloned().unwrap()
	}

	fn window(unit: WindowUnit, count: u32) -> Window {
		Window::new(unit, count).unwrap()
	}

	#[test]
	fn test_extract_window_unit_recognized_units() {
		assert_eq!(
			extract_window_unit(&options(json!({"hours": 6}))).unwrap(),
			window(WindowUnit::Hours, 6)
		);
		assert_eq!(
			extract_window_unit(&options(json!({"days": 2}))).unwrap(),
			window(WindowUnit::Days, 2)
		);
		assert_eq!(
			extract_window_unit(&options(json!({"months": 3}))).unwrap(),
			window(WindowUnit::Months, 3)
		);
	}

	#[test]
	fn test_extract_window_unit_accepts_singular_keys() {
		assert_eq!(
			extract_window_unit(&options(json!({"hour": 6}))).unwrap(),
			window(WindowUnit::Hours, 6)
		);
	}

	#[test]
	fn test_extract_window_unit_ignores_other_options() {
		let parsed = extract_window_unit(&options(json!({"days": 2, "unique": true}))).unwrap();
		assert_eq!(parsed, window(WindowUnit::Days, 2));
	}

	#[test]
	fn test_extract_window_unit_rejects_empty_map() {
		let err = extract_window_unit(&Map::new()).unwrap_err();
		assert!(matches!(err, CoreError::InvalidWindowSpec(_)));
	}

	#[test]
	fn test_extract_window_unit_rejects_unrecognized_keys() {
		let err = extract_window_unit(&options(json!({"fun": "times"}))).unwrap_err();
		assert!(matches!(err, CoreError::InvalidWindowSpec(_)));
	}

	#[test]
	fn test_extract_window_unit_rejects_multiple_units() {
		let err = extract_window_unit(&options(json!({"days": 2, "hours": 3}))).unwrap_err();
		assert!(matches!(err, CoreError::InvalidWindowSpec(_)));
	}

	#[test]
	fn test_extract_window_unit_rejects_bad_counts() {
		for bad in [json!(0), json!(-1), json!(2.5), json!("3"), json!(null)] {
			let err = extract_window_unit(&options(json!({"days": bad.clone()}))).unwrap_err();
			assert!(
				matches!(err, CoreError::InvalidWindowSpec(_)),
				"count {bad} should be rejected"
			);
		}
	}

	#[test]
	fn test_time_ago_hours() {
		assert_eq!(
			time_ago(reference(), &window(WindowUnit::Hours, 6)).unwrap(),
			at(2011, 2, 15, 6)
		);
	}

	#[test]
	fn test_time_ago_days() {
		assert_eq!(
			time_ago(reference(), &window(WindowUnit::Days, 5)).unwrap(),
			at(2011, 2, 10, 12)
		);
	}

	#[test]
	fn test_time_ago_month_is_thirty_days() {
		assert_eq!(
			time_ago(reference(), &window(WindowUnit::Months, 1)).unwrap(),
			at(2011, 1, 16, 12)
		);
	}

	#[test]
	fn test_time_ago_out_of_range() {
		let err = time_ago(DateTime::<Utc>::MIN_UTC, &window(WindowUnit::Days, 1)).unwrap_err();
		assert!(matches!(err, CoreError::InvalidWindowSpec(_)));
	}

	#[test]
	fn test_time_ago_range_days() {
		assert_eq!(
			time_ago_range(reference(), &window(WindowUnit::Days, 2)).unwrap(),
			vec![at(2011, 2, 14, 12), at(2011, 2, 15, 12)]
		);
		assert_eq!(
			time_ago_range(reference(), &window(WindowUnit::Days, 3)).unwrap(),
			vec![at(2011, 2, 13, 12), at(2011, 2, 14, 12), at(2011, 2, 15, 12)]
		);
	}

	#[test]
	fn test_time_ago_range_sizes() {
		assert_eq!(
			time_ago_range(reference(), &window(WindowUnit::Hours, 6))
				.unwrap()
				.len(),
			6
		);
		assert_eq!(
			time_ago_range(reference(), &window(WindowUnit::Months, 1))
				.unwrap()
				.len(),
			1
		);
	}

	#[test]
	fn test_time_ago_range_bounds() {
		let times = time_ago_range(reference(), &window(WindowUnit::Days, 4)).unwrap();
		assert_eq!(times.first(), Some(&at(2011, 2, 12, 12)));
		assert_eq!(times.last(), Some(&reference()));
	}

	#[test]
	fn test_bucket_labels() {
		let ts = Utc.with_ymd_and_hms(2011, 2, 5, 9, 41, 17).unwrap();
		assert_eq!(WindowUnit::Hours.bucket_label(&ts), "2011-02-05-09");
		assert_eq!(WindowUnit::Days.bucket_label(&ts), "2011-02-05");
		assert_eq!(WindowUnit::Months.bucket_label(&ts), "2011-02");
	}

	#[test]
	fn test_truncate() {
		let ts = Utc.with_ymd_and_hms(2011, 2, 5, 9, 41, 17).unwrap();
		assert_eq!(WindowUnit::Hours.truncate(ts), at(2011, 2, 5, 9));
		assert_eq!(WindowUnit::Days.truncate(ts), at(2011, 2, 5, 0));
		assert_eq!(WindowUnit::Months.truncate(ts), at(2011, 2, 1, 0));
	}

	#[test]
	fn test_window_unit_from_str() {
		assert_eq!("days".parse::<WindowUnit>().unwrap(), WindowUnit::Days);
		assert_eq!("month".parse::<WindowUnit>().unwrap(), WindowUnit::Months);
		assert!("weeks".parse::<WindowUnit>().is_err());
	}

	#[test]
	fn test_window_rejects_zero_count() {
		assert!(Window::new(WindowUnit::Days, 0).is_err());
	}

	#[test]
	fn test_window_count_is_capped() {
		assert!(Window::new(WindowUnit::Hours, MAX_WINDOW_COUNT).is_ok());
		assert!(matches!(
			Window::new(WindowUnit::Hours, MAX_WINDOW_COUNT + 1),
			Err(CoreError::InvalidWindowSpec(_))
		));
		let err = extract_window_unit(&options(json!({"hours": 1_000_000_000}))).unwrap_err();
		assert!(matches!(err, CoreError::InvalidWindowSpec(_)));
	}

	#[test]
	fn test_window_deserializes_from_table() {
		let parsed: Window = serde_json::from_value(json!({"days": 7})).unwrap();
		assert_eq!(parsed, window(WindowUnit::Days, 7));
		assert_eq!(parsed.to_string(), "7 days");

		let err = serde_json::from_value::<Window>(json!({"weeks": 1}));
		assert!(err.is_err());
	}

	#[test]
	fn test_window_serializes_as_table() {
		let value = serde_json::to_value(window(WindowUnit::Hours, 3)).unwrap();
		assert_eq!(value, json!({"hours": 3}));
	}

	fn any_unit() -> impl Strategy<Value = WindowUnit> {
		prop_oneof![
			Just(WindowUnit::Hours),
			Just(WindowUnit::Days),
			Just(WindowUnit::Months),
		]
	}

	proptest! {
		#[test]
		fn time_ago_range_shape(unit in any_unit(), count in 1u32..200, offset_hours in 0i64..200_000) {
			let reference = at(2000, 1, 1, 0) + TimeDelta::hours(offset_hours);
			let window = Window::new(unit, count).unwrap();
			let times = time_ago_range(reference, &window).unwrap();

			prop_assert_eq!(times.len(), count as usize);
			prop_assert_eq!(times.last().copied(), Some(reference));
			prop_assert_eq!(times.first().copied(), Some(unit.ago(reference, count - 1).unwrap()));
			prop_assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
		}

		#[test]
		fn range_labels_are_distinct(unit in any_unit(), count in 1u32..100, offset_hours in 0i64..200_000) {
			let reference = at(2000, 1, 1, 0) + TimeDelta::hours(offset_hours);
			let window = Window::new(unit, count).unwrap();
			let labels: std::collections::HashSet<String> = time_ago_range(reference, &window)
				.unwrap()
				.iter()
				.map(|ts| unit.bucket_label(ts))
				.collect();

			// A 30-day month step can land twice in one calendar month only
			// when the month has 31 days, so months may share labels.
			if unit != WindowUnit::Months {
				prop_assert_eq!(labels.len(), count as usize);
			}
		}

		#[test]
		fn truncate_preserves_label(unit in any_unit(), offset_secs in 0i64..100_000_000) {
			let ts = at(2000, 1, 1, 0) + TimeDelta::seconds(offset_secs);
			prop_assert_eq!(unit.bucket_label(&unit.truncate(ts)), unit.bucket_label(&ts));
		}
	}
}
