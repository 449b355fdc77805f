// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User set lookups and the validity/expiry predicates built on them.
//!
//! Each predicate comes in two flavours: `_by_user_id` reads the solution id
//! stored on the user's profile first, `_by_solution_id` takes the solution id
//! directly. The expiry predicates fail closed: a user without a solution id,
//! or a solution id no user set claims, counts as expired.

use tracing::{debug, instrument};

use crate::error::AuthError;
use crate::ports::AuthCollaborator;
use crate::types::{SolutionId, UserId, UserSetRef};

/// The user set claiming `solution_id`. Blank ids never match.
pub async fn find_userset_by_solution_id(
	auth: &dyn AuthCollaborator,
	solution_id: &SolutionId,
) -> Result<Option<UserSetRef>, AuthError> {
	if solution_id.is_blank() {
		return Ok(None);
	}
	Ok(auth.userset_solutionid_exists(solution_id).await?)
}

/// The user's stored solution id, when it is non-blank.
pub async fn stored_solution_id(
	auth: &dyn AuthCollaborator,
	user_id: UserId,
) -> Result<Option<SolutionId>, AuthError> {
	let solution_id = auth.get_user_solution_id(user_id).await?;
	Ok(solution_id.filter(|s| !s.is_blank()))
}

/// The user's stored solution id together with the user set it maps to.
pub async fn find_userset_by_user_id(
	auth: &dyn AuthCollaborator,
	user_id: UserId,
) -> Result<Option<(SolutionId, UserSetRef)>, AuthError> {
	let Some(solution_id) = stored_solution_id(auth, user_id).await? else {
		debug!(%user_id, "user has no stored solution id");
		return Ok(None);
	};
	let userset = find_userset_by_solution_id(auth, &solution_id).await?;
	Ok(userset.map(|userset| (solution_id, userset)))
}

/// Whether the user set's subscription window is currently open.
pub async fn subscription_is_valid(
	auth: &dyn AuthCollaborator,
	solution_id: &SolutionId,
	userset: &UserSetRef,
) -> Result<bool, AuthError> {
	Ok(auth
		.user_set_has_valid_subscription(solution_id, userset.context_id, &userset.name)
		.await?)
}

#[instrument(skip(auth))]
pub async fn is_userset_valid_by_user_id(
	auth: &dyn AuthCollaborator,
	user_id: UserId,
) -> Result<bool, AuthError> {
	Ok(find_userset_by_user_id(auth, user_id).await?.is_some())
}

#[instrument(skip_all, fields(solution_id = %solution_id))]
pub async fn is_userset_valid_by_solution_id(
	auth: &dyn AuthCollaborator,
	solution_id: &SolutionId,
) -> Result<bool, AuthError> {
	Ok(find_userset_by_solution_id(auth, solution_id)
		.await?
		.is_some())
}

#[instrument(skip(auth))]
pub async fn is_userset_expired_by_user_id(
	auth: &dyn AuthCollaborator,
	user_id: UserId,
) -> Result<bool, AuthError> {
	match find_userset_by_user_id(auth, user_id).await? {
		Some((solution_id, userset)) => {
			Ok(!subscription_is_valid(auth, &solution_id, &userset).await?)
		}
		None => Ok(true),
	}
}

#[instrument(skip_all, fields(solution_id = %solution_id))]
pub async fn is_userset_expired_by_solution_id(
	auth: &dyn AuthCollaborator,
	solution_id: &SolutionId,
) -> Result<bool, AuthError> {
	match find_userset_by_solution_id(auth, solution_id).await? {
		Some(userset) => Ok(!subscription_is_valid(auth, solution_id, &userset).await?),
		None => Ok(true),
	}
}
