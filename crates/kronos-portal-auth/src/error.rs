// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::ports::StoreError;
use crate::types::FieldId;

/// Errors raised while resolving configuration or querying collaborators.
///
/// Validation outcomes such as an expired user set are not errors; see
/// [`crate::ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("no solution id profile field is configured")]
	SolutionFieldNotConfigured,

	#[error("configured solution id profile field {0} does not exist")]
	SolutionFieldMissing(FieldId),

	#[error("collaborator error: {0}")]
	Collaborator(#[from] StoreError),
}

impl AuthError {
	/// True for errors caused by missing or broken plugin configuration.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			AuthError::SolutionFieldNotConfigured | AuthError::SolutionFieldMissing(_)
		)
	}
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn configuration_errors_are_classified() {
		assert!(AuthError::SolutionFieldNotConfigured.is_configuration());
		assert!(AuthError::SolutionFieldMissing(FieldId::new(3)).is_configuration());
		assert!(!AuthError::from(StoreError::Backend("down".to_string())).is_configuration());
	}

	#[test]
	fn messages_name_the_field() {
		let err = AuthError::SolutionFieldMissing(FieldId::new(1023));
		assert_eq!(
			err.to_string(),
			"configured solution id profile field 1023 does not exist"
		);
	}
}
