// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use kronos_portal_auth::AuthError;
use kronos_portal_config::ConfigError;
use kronos_portal_provisioning::ProvisioningError;

/// Errors surfaced by the portal facade.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error(transparent)]
	Provisioning(#[from] ProvisioningError),
}

impl PortalError {
	/// True when the plugin configuration, not the request, is at fault.
	pub fn is_configuration(&self) -> bool {
		match self {
			PortalError::Config(_) => true,
			PortalError::Auth(e) => e.is_configuration(),
			PortalError::Provisioning(ProvisioningError::Auth(e)) => e.is_configuration(),
			PortalError::Provisioning(_) => false,
		}
	}
}

pub type Result<T> = std::result::Result<T, PortalError>;
