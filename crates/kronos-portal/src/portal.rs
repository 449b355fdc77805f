// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use kronos_portal_auth::{
	is_userset_expired_by_solution_id, is_userset_expired_by_user_id,
	is_userset_valid_by_solution_id, is_userset_valid_by_user_id, resolve_solution_field,
	AuthCollaborator, EventSink, FieldShortname, ProfileFieldRegistry, ProfileStore,
	ProfileUpdateHook, SolutionId, User, UserId, UserRecord, UserStore, UserValidator,
	ValidationMode, ValidationResult,
};
use kronos_portal_config::{load_config, PluginConfig, PortalConfig};
use kronos_portal_provisioning::{ProvisioningPorts, UserProvisioner};

use crate::error::Result;

/// Host-supplied implementations of every port the portal talks to.
#[derive(Clone)]
pub struct Collaborators {
	pub users: Arc<dyn UserStore>,
	pub profiles: Arc<dyn ProfileStore>,
	pub fields: Arc<dyn ProfileFieldRegistry>,
	pub auth: Arc<dyn AuthCollaborator>,
	pub hook: Arc<dyn ProfileUpdateHook>,
	pub events: Arc<dyn EventSink>,
}

/// The authentication adapter: provisioning plus login validation.
///
/// Configuration is fixed at construction. Nothing else is cached between
/// calls; every operation reads the stores afresh.
#[derive(Clone)]
pub struct KronosPortal {
	config: Arc<PluginConfig>,
	auth: Arc<dyn AuthCollaborator>,
	fields: Arc<dyn ProfileFieldRegistry>,
	provisioner: UserProvisioner,
	validator: UserValidator,
}

impl KronosPortal {
	pub fn new(config: PluginConfig, collaborators: Collaborators) -> Self {
		let config = Arc::new(config);
		let provisioner = UserProvisioner::new(
			config.clone(),
			ProvisioningPorts {
				users: collaborators.users,
				profiles: collaborators.profiles,
				fields: collaborators.fields.clone(),
				hook: collaborators.hook,
				events: collaborators.events.clone(),
			},
		);
		let validator = UserValidator::new(
			config.clone(),
			collaborators.fields.clone(),
			collaborators.auth.clone(),
			collaborators.events,
		);
		Self {
			config,
			auth: collaborators.auth,
			fields: collaborators.fields,
			provisioner,
			validator,
		}
	}

	/// Build from the standard configuration sources.
	pub fn from_config(config: PortalConfig, collaborators: Collaborators) -> Self {
		Self::new(config.plugin, collaborators)
	}

	/// Load configuration from defaults, `/etc/kronosportal/portal.toml` and
	/// `KRONOS_PORTAL_*` variables, then build.
	pub fn load(collaborators: Collaborators) -> Result<Self> {
		let config = load_config()?;
		Ok(Self::from_config(config, collaborators))
	}

	pub fn config(&self) -> &PluginConfig {
		&self.config
	}

	pub async fn create_user(&self, attributes: &UserRecord) -> Result<User> {
		Ok(self.provisioner.create(attributes).await?)
	}

	pub async fn update_user(&self, attributes: &UserRecord) -> Result<User> {
		Ok(self.provisioner.update(attributes).await?)
	}

	pub async fn validate_user(
		&self,
		user: Option<&UserRecord>,
		mode: ValidationMode,
	) -> Result<ValidationResult> {
		Ok(self.validator.validate(user, mode).await?)
	}

	/// Validate a raw JSON candidate; anything but an object is `InvalidUser`.
	pub async fn validate_json(
		&self,
		user: Option<&serde_json::Value>,
		mode: ValidationMode,
	) -> Result<ValidationResult> {
		Ok(self.validator.validate_json(user, mode).await?)
	}

	pub async fn resolve_solution_field(&self) -> Result<FieldShortname> {
		Ok(resolve_solution_field(&self.config, self.fields.as_ref()).await?)
	}

	pub async fn is_userset_valid_by_user_id(&self, user_id: UserId) -> Result<bool> {
		Ok(is_userset_valid_by_user_id(self.auth.as_ref(), user_id).await?)
	}

	pub async fn is_userset_valid_by_solution_id(&self, solution_id: &SolutionId) -> Result<bool> {
		Ok(is_userset_valid_by_solution_id(self.auth.as_ref(), solution_id).await?)
	}

	pub async fn is_userset_expired_by_user_id(&self, user_id: UserId) -> Result<bool> {
		Ok(is_userset_expired_by_user_id(self.auth.as_ref(), user_id).await?)
	}

	pub async fn is_userset_expired_by_solution_id(&self, solution_id: &SolutionId) -> Result<bool> {
		Ok(is_userset_expired_by_solution_id(self.auth.as_ref(), solution_id).await?)
	}
}

impl std::fmt::Debug for KronosPortal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KronosPortal")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}
