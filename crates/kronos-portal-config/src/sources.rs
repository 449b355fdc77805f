// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::PortalConfigLayer;
use crate::sections::{LoggingConfigLayer, PluginConfigLayer};

/// Default location of the system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/kronosportal/portal.toml";

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
	fn load(&self) -> Result<PortalConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(PortalConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(PortalConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: PortalConfigLayer =
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
/// Convention: KRONOS_PORTAL_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<PortalConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_layer(|name| std::env::var(name).ok())
	}
}

/// Build a layer from an arbitrary variable lookup.
fn load_layer<F>(lookup: F) -> Result<PortalConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let env = Env { lookup };
	Ok(PortalConfigLayer {
		plugin: Some(PluginConfigLayer {
			user_field_solutionid: env.i64("KRONOS_PORTAL_USER_FIELD_SOLUTIONID")?,
			local_host: env.var("KRONOS_PORTAL_LOCAL_HOST"),
			userset_expiry_field_id: env.i64("KRONOS_PORTAL_USERSET_EXPIRY_FIELD_ID")?,
			userset_extension_field_id: env.i64("KRONOS_PORTAL_USERSET_EXTENSION_FIELD_ID")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("KRONOS_PORTAL_LOG_LEVEL"),
			json: env.bool("KRONOS_PORTAL_LOG_JSON"),
		}),
	})
}

struct Env<F> {
	lookup: F,
}

impl<F> Env<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn i64(&self, name: &str) -> Result<Option<i64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid i64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.plugin.is_none());
		assert!(layer.logging.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/portal.toml");
		let layer = source.load().unwrap();
		assert!(layer.plugin.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("portal.toml");
		std::fs::write(
			&path,
			"[plugin]\nuser_field_solutionid = 73\nlocal_host = \"edge\"\n",
		)
		.unwrap();

		let plugin = TomlSource::new(&path).load().unwrap().plugin.unwrap();
		assert_eq!(plugin.user_field_solutionid, Some(73));
		assert_eq!(plugin.local_host.as_deref(), Some("edge"));
	}

	#[test]
	fn test_toml_source_reports_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("portal.toml");
		std::fs::write(&path, "[plugin\nuser_field_solutionid = ").unwrap();

		let err = TomlSource::new(&path).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_layer_reads_plugin_fields() {
		let env = vars(&[
			("KRONOS_PORTAL_USER_FIELD_SOLUTIONID", "1023"),
			("KRONOS_PORTAL_LOCAL_HOST", "portal"),
			("KRONOS_PORTAL_USERSET_EXPIRY_FIELD_ID", "199"),
			("KRONOS_PORTAL_LOG_JSON", "1"),
		]);
		let layer = load_layer(|name| env.get(name).cloned()).unwrap();

		let plugin = layer.plugin.unwrap();
		assert_eq!(plugin.user_field_solutionid, Some(1023));
		assert_eq!(plugin.local_host.as_deref(), Some("portal"));
		assert_eq!(plugin.userset_expiry_field_id, Some(199));
		assert!(plugin.userset_extension_field_id.is_none());
		assert_eq!(layer.logging.unwrap().json, Some(true));
	}

	#[test]
	fn test_env_layer_ignores_empty_values() {
		let env = vars(&[("KRONOS_PORTAL_LOCAL_HOST", "")]);
		let layer = load_layer(|name| env.get(name).cloned()).unwrap();
		assert!(layer.plugin.unwrap().local_host.is_none());
	}

	#[test]
	fn test_env_layer_rejects_non_numeric_field_id() {
		let env = vars(&[("KRONOS_PORTAL_USER_FIELD_SOLUTIONID", "customerid")]);
		let err = load_layer(|name| env.get(name).cloned()).unwrap_err();
		match err {
			ConfigError::InvalidValue { key, .. } => {
				assert_eq!(key, "KRONOS_PORTAL_USER_FIELD_SOLUTIONID")
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}
