// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication core for the Kronos portal.
//!
//! This crate resolves the profile field that stores a user's solution id,
//! validates candidates against the user set (enrollment) subsystem, and
//! reports notable failures as [`PortalEvent`]s.
//!
//! # Collaborators
//!
//! The platform is reached only through the traits in [`ports`]:
//! [`UserStore`], [`ProfileStore`], [`ProfileFieldRegistry`],
//! [`AuthCollaborator`] and [`ProfileUpdateHook`]. Events go to an
//! [`EventSink`]. Enable the `testing` feature for in-memory doubles.
//!
//! # Example
//!
//! ```ignore
//! use kronos_portal_auth::{UserValidator, ValidationMode, ValidationResult};
//!
//! let validator = UserValidator::new(config, registry, auth, events);
//! let result = validator.validate(Some(&candidate), ValidationMode::Login).await?;
//! if result != ValidationResult::Success {
//!     return deny(result);
//! }
//! ```

pub mod error;
pub mod events;
pub mod ports;
pub mod resolver;
pub mod secret;
pub mod types;
pub mod user;
pub mod userset;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{AuthError, Result};
pub use events::{
	emit, Crud, EduLevel, EventSink, EventSinkError, ExpiryFields, PortalEvent, PortalEventBuilder,
	PortalEventType, TracingEventSink,
};
pub use ports::{
	AuthCollaborator, HookError, NoopProfileHook, ProfileFieldRegistry, ProfileStore,
	ProfileUpdateHook, StoreError, UserStore,
};
pub use resolver::{configured_solution_field, resolve_solution_field};
pub use secret::SecretString;
pub use types::{
	ContextId, FieldId, FieldShortname, ProfileField, SolutionId, SubscriptionWindow, UserId,
	UserSetRef, SYSTEM_CONTEXT,
};
pub use user::{is_present, User, UserRecord, PROFILE_FIELD_PREFIX};
pub use userset::{
	find_userset_by_solution_id, find_userset_by_user_id, is_userset_expired_by_solution_id,
	is_userset_expired_by_user_id, is_userset_valid_by_solution_id, is_userset_valid_by_user_id,
	stored_solution_id, subscription_is_valid,
};
pub use validation::{UserValidator, ValidationMode, ValidationResult};
