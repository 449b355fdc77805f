// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication plugin settings.
//!
//! These are the values an administrator sets for the plugin component. The
//! most important one is [`PluginConfig::user_field_solutionid`], the internal
//! id of the custom profile field that stores a user's solution id.

use serde::{Deserialize, Serialize};

/// Host identifier that restricts an account to the local instance.
pub const DEFAULT_LOCAL_HOST: &str = "local";

/// Plugin configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
	/// Profile field id holding the solution id, if configured.
	pub user_field_solutionid: Option<i64>,
	/// External-host identifier used when the attribute bag has none.
	pub local_host: String,
	/// User set field holding the subscription expiry date.
	pub userset_expiry_field_id: Option<i64>,
	/// User set field holding the optional subscription extension date.
	pub userset_extension_field_id: Option<i64>,
}

impl Default for PluginConfig {
	fn default() -> Self {
		Self {
			user_field_solutionid: None,
			local_host: DEFAULT_LOCAL_HOST.to_string(),
			userset_expiry_field_id: None,
			userset_extension_field_id: None,
		}
	}
}

impl PluginConfig {
	/// Convenience constructor used by hosts that only care about the solution field.
	pub fn with_solution_field(field_id: i64) -> Self {
		Self {
			user_field_solutionid: Some(field_id),
			..Default::default()
		}
	}
}

/// Plugin configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PluginConfigLayer {
	#[serde(default)]
	pub user_field_solutionid: Option<i64>,
	#[serde(default)]
	pub local_host: Option<String>,
	#[serde(default)]
	pub userset_expiry_field_id: Option<i64>,
	#[serde(default)]
	pub userset_extension_field_id: Option<i64>,
}

impl PluginConfigLayer {
	pub fn merge(&mut self, other: PluginConfigLayer) {
		if other.user_field_solutionid.is_some() {
			self.user_field_solutionid = other.user_field_solutionid;
		}
		if other.local_host.is_some() {
			self.local_host = other.local_host;
		}
		if other.userset_expiry_field_id.is_some() {
			self.userset_expiry_field_id = other.userset_expiry_field_id;
		}
		if other.userset_extension_field_id.is_some() {
			self.userset_extension_field_id = other.userset_extension_field_id;
		}
	}

	pub fn finalize(self) -> PluginConfig {
		PluginConfig {
			user_field_solutionid: self.user_field_solutionid,
			local_host: self
				.local_host
				.unwrap_or_else(|| DEFAULT_LOCAL_HOST.to_string()),
			userset_expiry_field_id: self.userset_expiry_field_id,
			userset_extension_field_id: self.userset_extension_field_id,
		}
	}
}
