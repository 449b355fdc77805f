// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator ports.
//!
//! The platform owns user storage, custom profile fields and the user set
//! (enrollment) subsystem. This crate only talks to them through the traits
//! below; hosts supply the implementations and tests use the in-memory
//! doubles from `testing`.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::types::{ContextId, FieldId, ProfileField, SolutionId, UserId, UserSetRef};
use crate::user::{User, UserRecord};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
	#[error("Conflict: {0}")]
	Duplicate(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Invalid record: {0}")]
	Invalid(String),

	#[error("Backend error: {0}")]
	Backend(String),
}

/// Platform user storage.
#[async_trait]
pub trait UserStore: Send + Sync {
	/// Create an account and return its assigned id.
	async fn create_user(&self, record: &UserRecord) -> Result<UserId, StoreError>;

	/// Update an existing account; the password is only written when
	/// `change_password` is set.
	async fn update_user(&self, record: &UserRecord, change_password: bool)
		-> Result<(), StoreError>;

	/// Load the base account record, without custom profile fields.
	async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

/// Custom profile field storage.
#[async_trait]
pub trait ProfileStore: Send + Sync {
	/// Persist custom field values, keyed by field shortname.
	async fn save_profile(
		&self,
		user_id: UserId,
		fields: &BTreeMap<String, String>,
	) -> Result<(), StoreError>;

	/// Load all custom field values of a user, keyed by field shortname.
	async fn load_profile(&self, user_id: UserId) -> Result<BTreeMap<String, String>, StoreError>;
}

/// Registry of custom profile field definitions.
#[async_trait]
pub trait ProfileFieldRegistry: Send + Sync {
	async fn get_field(&self, id: FieldId) -> Result<Option<ProfileField>, StoreError>;
}

/// Adapter over the external user set / enrollment subsystem.
#[async_trait]
pub trait AuthCollaborator: Send + Sync {
	/// The solution id stored on a user's profile, if any.
	async fn get_user_solution_id(&self, user_id: UserId) -> Result<Option<SolutionId>, StoreError>;

	/// The user set claiming `solution_id`, if any.
	async fn userset_solutionid_exists(
		&self,
		solution_id: &SolutionId,
	) -> Result<Option<UserSetRef>, StoreError>;

	/// Whether the user set's subscription window is open right now.
	async fn user_set_has_valid_subscription(
		&self,
		solution_id: &SolutionId,
		context_id: ContextId,
		name: &str,
	) -> Result<bool, StoreError>;

	/// Whether the user has a stored value for the solution id field.
	async fn user_solutionid_field_exists(&self, user_id: UserId) -> Result<bool, StoreError>;
}

/// Failure reported by the profile-update hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("profile update hook failed: {0}")]
pub struct HookError(pub String);

/// Cluster/profile-update notification fired after provisioning.
#[async_trait]
pub trait ProfileUpdateHook: Send + Sync {
	async fn notify(&self, user: &User) -> Result<(), HookError>;
}

/// Hook that does nothing; for hosts without cluster sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProfileHook;

#[async_trait]
impl ProfileUpdateHook for NoopProfileHook {
	async fn notify(&self, _user: &User) -> Result<(), HookError> {
		Ok(())
	}
}
