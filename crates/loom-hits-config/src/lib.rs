// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for Loom hit tracking.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with eager validation
//! - Consistent environment variable naming (`LOOM_HITS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use loom_hits_config::load_config;
//!
//! let config = load_config()?;
//! println!("recording at {:?}", config.windows.units);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::HitsConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::collections::BTreeSet;

use tracing::{debug, info};

/// Fully resolved hit tracking configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitsConfig {
	pub store: StoreConfig,
	pub windows: WindowsConfig,
	pub namespaces: NamespacesConfig,
	pub logging: LoggingConfig,
}

impl HitsConfig {
	/// Declares hit types for a namespace (builder pattern).
	pub fn with_namespace<I, S>(mut self, namespace: impl Into<String>, hit_types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.namespaces.declare(namespace, hit_types);
		self
	}

	/// Checks cross-field rules. Called by every loader; call it again after
	/// building a configuration by hand.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let prefix = &self.store.key_prefix;
		if prefix.trim().is_empty() {
			return Err(ConfigError::Validation(
				"store.key_prefix must not be empty".to_string(),
			));
		}
		if prefix.contains(':') {
			return Err(ConfigError::Validation(format!(
				"store.key_prefix '{prefix}' must not contain ':'"
			)));
		}

		if self.windows.units.is_empty() {
			return Err(ConfigError::Validation(
				"windows.units must name at least one unit".to_string(),
			));
		}
		let default_unit = self.windows.default_window.unit();
		if !self.windows.is_active(default_unit) {
			return Err(ConfigError::Validation(format!(
				"windows.default uses {default_unit}, which is not an active unit"
			)));
		}

		for (unit, ttl) in &self.windows.bucket_ttl {
			if ttl.is_zero() {
				return Err(ConfigError::Validation(format!(
					"windows.ttl_secs.{unit} must be at least one second"
				)));
			}
		}
		if self.windows.union_ttl.is_zero() {
			return Err(ConfigError::Validation(
				"windows.union_ttl_secs must be at least one second".to_string(),
			));
		}

		for (namespace, hit_types) in &self.namespaces.hit_types {
			if namespace.trim().is_empty() {
				return Err(ConfigError::Validation(
					"namespace names must not be blank".to_string(),
				));
			}
			let mut seen = BTreeSet::new();
			for hit_type in hit_types {
				if hit_type.trim().is_empty() {
					return Err(ConfigError::Validation(format!(
						"namespace '{namespace}' declares a blank hit type"
					)));
				}
				if !seen.insert(hit_type.as_str()) {
					return Err(ConfigError::Validation(format!(
						"namespace '{namespace}' declares hit type '{hit_type}' twice"
					)));
				}
			}
		}

		Ok(())
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_HITS_*`)
/// 2. Config file (`/etc/loom/hits.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<HitsConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<HitsConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<HitsConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<HitsConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = HitsConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: HitsConfigLayer) -> Result<HitsConfig, ConfigError> {
	let config = HitsConfig {
		store: layer.store.unwrap_or_default().finalize(),
		windows: layer.windows.unwrap_or_default().finalize(),
		namespaces: layer.namespaces.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	config.validate()?;

	info!(
		key_prefix = %config.store.key_prefix,
		units = ?config.windows.units,
		default_window = %config.windows.default_window,
		namespaces = config.namespaces.hit_types.len(),
		"Hit tracking configuration loaded"
	);

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_hits_core::{Window, WindowUnit};
	use std::env;
	use std::sync::Mutex;
	use std::time::Duration;

	static ENV_MUTEX: Mutex<()> = Mutex::new(());

	const HITS_ENV: [&str; 7] = [
		"LOOM_HITS_STORE_URL",
		"LOOM_HITS_KEY_PREFIX",
		"LOOM_HITS_WINDOW_UNITS",
		"LOOM_HITS_UNION_TTL_SECS",
		"LOOM_HITS_NAMESPACES",
		"LOOM_HITS_LOG_LEVEL",
		"LOOM_HITS_LOG_FORMAT",
	];

	fn clear_hits_env() {
		for name in HITS_ENV {
			env::remove_var(name);
		}
	}

	struct StaticSource(Precedence, &'static str);

	impl ConfigSource for StaticSource {
		fn name(&self) -> &'static str {
			"static"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<HitsConfigLayer, ConfigError> {
			Ok(toml::from_str(self.1).unwrap())
		}
	}

	#[test]
	fn test_default_config_is_valid() {
		assert!(HitsConfig::default().validate().is_ok());
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(StaticSource(Precedence::Environment, "[store]\nkey_prefix = \"env\"")),
			Box::new(StaticSource(
				Precedence::ConfigFile,
				"[store]\nkey_prefix = \"file\"\nurl = \"redis://file:6379\"",
			)),
		])
		.unwrap();
		assert_eq!(config.store.key_prefix, "env");
		assert_eq!(config.store.url, "redis://file:6379");
	}

	#[test]
	fn test_prefix_with_colon_is_rejected() {
		let mut config = HitsConfig::default();
		config.store.key_prefix = "app:hits".to_string();
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("must not contain ':'"));
	}

	#[test]
	fn test_empty_units_rejected() {
		let mut config = HitsConfig::default();
		config.windows.units.clear();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_default_window_must_use_active_unit() {
		let mut config = HitsConfig::default();
		config.windows.units = vec![WindowUnit::Hours];
		config.windows.default_window = Window::new(WindowUnit::Days, 7).unwrap();
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("not an active unit"));
	}

	#[test]
	fn test_duplicate_hit_types_rejected() {
		let config = HitsConfig::default().with_namespace("article", ["view", "view"]);
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("twice"));
	}

	#[test]
	fn test_blank_hit_type_rejected() {
		let config = HitsConfig::default().with_namespace("article", ["view", " "]);
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_blank_namespace_rejected() {
		let config = HitsConfig::default().with_namespace("", ["view"]);
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_load_config_with_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("hits.toml");
		std::fs::write(
			&path,
			"[windows]\nunits = [\"days\"]\ndefault = { days = 30 }\n\n[namespaces]\nuser = [\"signup\", \"login\"]\n",
		)
		.unwrap();

		let _guard = ENV_MUTEX.lock().unwrap();
		clear_hits_env();
		let config = load_config_with_file(&path).unwrap();
		assert_eq!(config.windows.units, vec![WindowUnit::Days]);
		assert_eq!(config.windows.default_window, Window::new(WindowUnit::Days, 30).unwrap());
		assert_eq!(
			config.namespaces.get("user"),
			Some(&["signup".to_string(), "login".to_string()][..])
		);
	}

	#[test]
	fn test_env_source_reads_every_variable() {
		let _guard = ENV_MUTEX.lock().unwrap();
		clear_hits_env();
		env::set_var("LOOM_HITS_STORE_URL", "redis://cache:6380/2");
		env::set_var("LOOM_HITS_KEY_PREFIX", "blog");
		env::set_var("LOOM_HITS_WINDOW_UNITS", "hours,days");
		env::set_var("LOOM_HITS_UNION_TTL_SECS", "15");
		env::set_var("LOOM_HITS_NAMESPACES", "article=view,like;user=signup");
		env::set_var("LOOM_HITS_LOG_LEVEL", "debug");
		env::set_var("LOOM_HITS_LOG_FORMAT", "json");

		let result = load_config_from_env();
		clear_hits_env();
		let config = result.unwrap();

		assert_eq!(config.store.url, "redis://cache:6380/2");
		assert_eq!(config.store.key_prefix, "blog");
		assert_eq!(config.windows.units, vec![WindowUnit::Hours, WindowUnit::Days]);
		assert_eq!(config.windows.union_ttl, Duration::from_secs(15));
		assert_eq!(config.namespaces.get("article"), Some(&["view".to_string(), "like".to_string()][..]));
		assert_eq!(config.namespaces.get("user"), Some(&["signup".to_string()][..]));
		assert_eq!(config.logging.level, "debug");
		assert_eq!(config.logging.format, LogFormat::Json);
	}

	#[test]
	fn test_env_overrides_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("hits.toml");
		std::fs::write(
			&path,
			"[store]\nkey_prefix = \"file\"\nurl = \"redis://file:6379\"\n\n[logging]\nlevel = \"warn\"\n",
		)
		.unwrap();

		let _guard = ENV_MUTEX.lock().unwrap();
		clear_hits_env();
		env::set_var("LOOM_HITS_KEY_PREFIX", "env");
		let result = load_config_with_file(&path);
		clear_hits_env();
		let config = result.unwrap();

		assert_eq!(config.store.key_prefix, "env");
		assert_eq!(config.store.url, "redis://file:6379");
		assert_eq!(config.logging.level, "warn");
	}

	#[test]
	fn test_invalid_env_value_is_reported() {
		let _guard = ENV_MUTEX.lock().unwrap();
		clear_hits_env();
		env::set_var("LOOM_HITS_UNION_TTL_SECS", "soon");
		let result = load_config_from_env();
		clear_hits_env();

		let err = result.unwrap_err();
		assert!(
			matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "LOOM_HITS_UNION_TTL_SECS")
		);
	}

	#[test]
	fn test_zero_bucket_ttl_rejected() {
		let mut config = HitsConfig::default();
		config.windows.bucket_ttl.insert(WindowUnit::Days, Duration::ZERO);
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("windows.ttl_secs.days"));
	}

	#[test]
	fn test_zero_union_ttl_rejected() {
		let mut config = HitsConfig::default();
		config.windows.union_ttl = Duration::ZERO;
		let err = config.validate().unwrap_err();
		assert!(err.to_string().contains("union_ttl_secs"));
	}

	#[test]
	fn test_zero_ttl_in_file_fails_to_load() {
		let result = load_from_sources(vec![Box::new(StaticSource(
			Precedence::ConfigFile,
			"[windows.ttl_secs]\ndays = 0\n",
		))]);
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}
}
