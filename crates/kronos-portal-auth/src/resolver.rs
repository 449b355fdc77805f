// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Solution id field resolution.

use kronos_portal_config::PluginConfig;
use tracing::{debug, instrument};

use crate::error::AuthError;
use crate::ports::ProfileFieldRegistry;
use crate::types::{FieldId, FieldShortname};

/// The configured solution id field id, if any.
pub fn configured_solution_field(config: &PluginConfig) -> Option<FieldId> {
	config.user_field_solutionid.map(FieldId::new)
}

/// Resolve the shortname of the profile field that stores solution ids.
///
/// Nothing is cached: every call reads `config` and queries `registry` again.
#[instrument(skip_all, fields(field_id = ?config.user_field_solutionid))]
pub async fn resolve_solution_field(
	config: &PluginConfig,
	registry: &dyn ProfileFieldRegistry,
) -> Result<FieldShortname, AuthError> {
	let field_id = configured_solution_field(config).ok_or(AuthError::SolutionFieldNotConfigured)?;

	let field = registry
		.get_field(field_id)
		.await?
		.ok_or(AuthError::SolutionFieldMissing(field_id))?;

	debug!(shortname = %field.shortname, "resolved solution id field");
	Ok(field.shortname)
}
