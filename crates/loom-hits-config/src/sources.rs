// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use loom_hits_core::WindowUnit;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::HitsConfigLayer;
use crate::sections::{
	LogFormat, LoggingConfigLayer, NamespacesConfigLayer, StoreConfigLayer, WindowsConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<HitsConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<HitsConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(HitsConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/loom/hits.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<HitsConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(HitsConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: HitsConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LOOM_HITS_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<HitsConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(HitsConfigLayer {
			store: Some(load_store_from_env()),
			windows: Some(load_windows_from_env()?),
			namespaces: load_namespaces_from_env()?,
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Parses a comma separated unit list such as `hours,days`.
pub fn parse_window_units(key: &str, value: &str) -> Result<Vec<WindowUnit>, ConfigError> {
	value
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| {
			s.parse::<WindowUnit>()
				.map_err(|e| ConfigError::InvalidValue {
					key: key.to_string(),
					message: e.to_string(),
				})
		})
		.collect()
}

/// Parses namespace declarations such as `article=view,like;user=signup`.
pub fn parse_namespaces(key: &str, value: &str) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
	let mut declared = BTreeMap::new();
	for entry in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
		let (namespace, hit_types) = entry.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("expected '<namespace>=<hit_type>,...', got '{entry}'"),
		})?;
		let hit_types = hit_types
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.collect();
		declared.insert(namespace.trim().to_string(), hit_types);
	}
	Ok(declared)
}

fn load_store_from_env() -> StoreConfigLayer {
	StoreConfigLayer {
		url: env_var("LOOM_HITS_STORE_URL"),
		key_prefix: env_var("LOOM_HITS_KEY_PREFIX"),
	}
}

fn load_windows_from_env() -> Result<WindowsConfigLayer, ConfigError> {
	let units = match env_var("LOOM_HITS_WINDOW_UNITS") {
		Some(v) => Some(parse_window_units("LOOM_HITS_WINDOW_UNITS", &v)?),
		None => None,
	};
	Ok(WindowsConfigLayer {
		units,
		default_window: None,
		ttl_secs: None,
		union_ttl_secs: env_u64("LOOM_HITS_UNION_TTL_SECS")?,
	})
}

fn load_namespaces_from_env() -> Result<Option<NamespacesConfigLayer>, ConfigError> {
	match env_var("LOOM_HITS_NAMESPACES") {
		Some(v) => Ok(Some(NamespacesConfigLayer {
			hit_types: parse_namespaces("LOOM_HITS_NAMESPACES", &v)?,
		})),
		None => Ok(None),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("LOOM_HITS_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "LOOM_HITS_LOG_FORMAT".to_string(),
					message,
				})?,
		),
		None => None,
	};
	Ok(LoggingConfigLayer {
		level: env_var("LOOM_HITS_LOG_LEVEL"),
		format,
	})
}
