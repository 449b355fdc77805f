// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use kronos_portal_auth::{AuthError, StoreError, UserId};

/// Errors that can occur during user provisioning.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("invalid user: {0}")]
	InvalidUser(String),

	#[error("user not found: {0}")]
	UserNotFound(UserId),

	#[error("user creation failed: {0}")]
	UserCreation(#[source] StoreError),

	#[error("user update failed: {0}")]
	UserUpdate(#[source] StoreError),

	#[error("profile storage failed: {0}")]
	ProfileStorage(#[source] StoreError),

	#[error(transparent)]
	Auth(#[from] AuthError),
}
