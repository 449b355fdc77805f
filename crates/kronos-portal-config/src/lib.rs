// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Kronos portal authentication adapter.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe plugin settings with validation
//! - Consistent environment variable naming (`KRONOS_PORTAL_*`)
//!
//! # Usage
//!
//! ```ignore
//! use kronos_portal_config::load_config;
//!
//! let config = load_config()?;
//! println!("solution field: {:?}", config.plugin.user_field_solutionid);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::PortalConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved portal configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalConfig {
	pub plugin: PluginConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`KRONOS_PORTAL_*`)
/// 2. Config file (`/etc/kronosportal/portal.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<PortalConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<PortalConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<PortalConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<PortalConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = PortalConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: PortalConfigLayer) -> Result<PortalConfig, ConfigError> {
	let plugin = layer.plugin.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&plugin)?;

	info!(
		solution_field_configured = plugin.user_field_solutionid.is_some(),
		local_host = %plugin.local_host,
		log_level = %logging.level,
		"Portal configuration loaded"
	);

	Ok(PortalConfig { plugin, logging })
}

/// Validate cross-field configuration rules.
fn validate_config(plugin: &PluginConfig) -> Result<(), ConfigError> {
	if plugin.local_host.trim().is_empty() {
		return Err(ConfigError::Validation(
			"plugin.local_host must not be empty".to_string(),
		));
	}

	let field_ids = [
		("plugin.user_field_solutionid", plugin.user_field_solutionid),
		("plugin.userset_expiry_field_id", plugin.userset_expiry_field_id),
		(
			"plugin.userset_extension_field_id",
			plugin.userset_extension_field_id,
		),
	];
	for (key, value) in field_ids {
		if let Some(id) = value {
			if id <= 0 {
				return Err(ConfigError::InvalidValue {
					key: key.to_string(),
					message: format!("field id must be positive, got {id}"),
				});
			}
		}
	}

	Ok(())
}
