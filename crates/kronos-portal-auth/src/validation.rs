// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User validation.
//!
//! [`UserValidator::validate`] runs a fixed chain of checks and stops at the
//! first one that fails:
//!
//! 1. the candidate must be a non-empty record ([`ValidationResult::InvalidUser`])
//! 2. the solution id field must resolve (configuration error)
//! 3. required attributes must be present ([`ValidationResult::MissingData`])
//! 4. at login, the user must have an id ([`ValidationResult::InvalidUser`])
//!    and a stored solution id ([`ValidationResult::MissingSolutionField`])
//! 5. a user set must claim the solution id ([`ValidationResult::InvalidSolution`])
//! 6. its subscription must be open ([`ValidationResult::Expired`])
//!
//! Outcomes are returned, never raised. Only configuration and collaborator
//! failures surface as [`AuthError`].

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use kronos_portal_config::PluginConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::AuthError;
use crate::events::{emit, EventSink, ExpiryFields, PortalEvent};
use crate::ports::{AuthCollaborator, ProfileFieldRegistry};
use crate::resolver::{configured_solution_field, resolve_solution_field};
use crate::types::{FieldId, FieldShortname, SolutionId, UserSetRef};
use crate::user::{is_present, UserRecord};
use crate::userset::{find_userset_by_solution_id, stored_solution_id, subscription_is_valid};

/// Outcome of validating a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationResult {
	Success,
	InvalidUser,
	MissingData,
	MissingSolutionField,
	InvalidSolution,
	Expired,
}

impl ValidationResult {
	pub fn is_success(self) -> bool {
		self == ValidationResult::Success
	}

	/// Stable result code, e.g. `invaliduser`.
	pub fn as_str(self) -> &'static str {
		match self {
			ValidationResult::Success => "success",
			ValidationResult::InvalidUser => "invaliduser",
			ValidationResult::MissingData => "missingdata",
			ValidationResult::MissingSolutionField => "missingsolutionfield",
			ValidationResult::InvalidSolution => "invalidsolution",
			ValidationResult::Expired => "expired",
		}
	}
}

impl fmt::Display for ValidationResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What the candidate is being validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
	/// A new account: password required, solution id taken from the record.
	Create,
	/// An existing account logging in: id required, solution id read from storage.
	Login,
}

impl ValidationMode {
	pub fn from_is_create(is_create: bool) -> Self {
		if is_create {
			ValidationMode::Create
		} else {
			ValidationMode::Login
		}
	}

	pub fn is_create(self) -> bool {
		self == ValidationMode::Create
	}

	fn attempt(self) -> &'static str {
		match self {
			ValidationMode::Create => "Account creation",
			ValidationMode::Login => "Login attempt",
		}
	}
}

/// Validates candidates against configuration and the user set subsystem.
#[derive(Clone)]
pub struct UserValidator {
	config: Arc<PluginConfig>,
	fields: Arc<dyn ProfileFieldRegistry>,
	auth: Arc<dyn AuthCollaborator>,
	events: Arc<dyn EventSink>,
}

impl UserValidator {
	pub fn new(
		config: Arc<PluginConfig>,
		fields: Arc<dyn ProfileFieldRegistry>,
		auth: Arc<dyn AuthCollaborator>,
		events: Arc<dyn EventSink>,
	) -> Self {
		Self {
			config,
			fields,
			auth,
			events,
		}
	}

	/// Validate a raw JSON candidate. Anything but an object is `InvalidUser`.
	pub async fn validate_json(
		&self,
		value: Option<&serde_json::Value>,
		mode: ValidationMode,
	) -> Result<ValidationResult, AuthError> {
		let record = value.and_then(UserRecord::from_json);
		self.validate(record.as_ref(), mode).await
	}

	#[instrument(skip_all, fields(mode = ?mode, user_id = ?user.and_then(|u| u.id)))]
	pub async fn validate(
		&self,
		user: Option<&UserRecord>,
		mode: ValidationMode,
	) -> Result<ValidationResult, AuthError> {
		let Some(user) = user.filter(|u| !u.is_empty()) else {
			debug!("candidate is absent or empty");
			return Ok(ValidationResult::InvalidUser);
		};

		let shortname = match resolve_solution_field(&self.config, self.fields.as_ref()).await {
			Ok(shortname) => shortname,
			Err(e) => {
				if e.is_configuration() {
					emit(self.events.as_ref(), PortalEvent::invalid_configuration()).await;
				}
				return Err(e);
			}
		};

		if let Some(missing) = first_missing_field(user, &shortname, mode) {
			debug!(field = missing, "required attribute missing");
			return Ok(ValidationResult::MissingData);
		}

		let username = user.username.as_deref().unwrap_or_default();
		let field_id = configured_solution_field(&self.config);

		let solution_id = match mode {
			ValidationMode::Login => {
				let Some(user_id) = user.valid_id() else {
					return Ok(ValidationResult::InvalidUser);
				};
				if !self.auth.user_solutionid_field_exists(user_id).await? {
					emit(
						self.events.as_ref(),
						PortalEvent::user_profile_solutionid_not_found(user_id, field_id),
					)
					.await;
					return Ok(ValidationResult::MissingSolutionField);
				}
				stored_solution_id(self.auth.as_ref(), user_id).await?
			}
			ValidationMode::Create => user
				.profile_field(shortname.as_str())
				.map(SolutionId::new),
		};

		let userset = match &solution_id {
			Some(solution_id) => find_userset_by_solution_id(self.auth.as_ref(), solution_id).await?,
			None => None,
		};
		let (Some(solution_id), Some(userset)) = (solution_id.as_ref(), userset) else {
			emit(
				self.events.as_ref(),
				PortalEvent::userset_not_found(mode.attempt(), username, field_id, solution_id.as_ref()),
			)
			.await;
			return Ok(ValidationResult::InvalidSolution);
		};

		if !subscription_is_valid(self.auth.as_ref(), solution_id, &userset).await? {
			self.report_expired(mode, username, &userset).await;
			return Ok(ValidationResult::Expired);
		}

		debug!(userset = %userset.name, "user validated");
		Ok(ValidationResult::Success)
	}

	async fn report_expired(&self, mode: ValidationMode, username: &str, userset: &UserSetRef) {
		let fields = ExpiryFields {
			expiry: self.config.userset_expiry_field_id.map(FieldId::new),
			extension: self.config.userset_extension_field_id.map(FieldId::new),
		};
		emit(
			self.events.as_ref(),
			PortalEvent::userset_has_expired(mode.attempt(), username, userset, fields, Utc::now()),
		)
		.await;
	}
}

impl fmt::Debug for UserValidator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UserValidator")
			.field("config", &self.config)
			.field("events", &self.events.name())
			.finish_non_exhaustive()
	}
}

/// Name of the first required attribute that is absent or blank.
fn first_missing_field(
	user: &UserRecord,
	solution_field: &FieldShortname,
	mode: ValidationMode,
) -> Option<&'static str> {
	let required = [
		("username", user.username.as_deref()),
		("firstname", user.firstname.as_deref()),
		("lastname", user.lastname.as_deref()),
		("solution id field", user.profile_field(solution_field.as_str())),
		("email", user.email.as_deref()),
	];
	if let Some((name, _)) = required.into_iter().find(|(_, value)| !is_present(*value)) {
		return Some(name);
	}
	if mode.is_create() && !user.has_password() {
		return Some("password");
	}
	None
}
