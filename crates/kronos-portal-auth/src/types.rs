// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by the resolver, validator and provisioner.
//!
//! - **ID newtypes**: platform record ids ([`UserId`], [`FieldId`],
//!   [`ContextId`]) kept apart at the type level
//! - **String newtypes**: [`SolutionId`] and [`FieldShortname`]
//! - **User set facts**: [`UserSetRef`] and [`SubscriptionWindow`]

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(
			Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(i64);

		impl $name {
			/// Wrap a raw platform id.
			pub const fn new(id: i64) -> Self {
				Self(id)
			}

			/// Get the raw platform id.
			pub const fn get(self) -> i64 {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<i64> for $name {
			fn from(id: i64) -> Self {
				Self(id)
			}
		}

		impl From<$name> for i64 {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Identifier of a platform user account.");
define_id_type!(FieldId, "Identifier of a custom profile field definition.");
define_id_type!(ContextId, "Identifier of a platform context (user sets live in one).");

/// The platform's system context.
pub const SYSTEM_CONTEXT: ContextId = ContextId::new(1);

// =============================================================================
// String Newtypes
// =============================================================================

/// Value correlating a user with exactly one external user set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionId(String);

impl SolutionId {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Whitespace-only solution ids never match a user set.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Display for SolutionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SolutionId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for SolutionId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Shortname of a custom profile field, e.g. `customerid`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldShortname(String);

impl FieldShortname {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for FieldShortname {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for FieldShortname {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

// =============================================================================
// Profile Fields & User Sets
// =============================================================================

/// A custom profile field definition as held by the field registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileField {
	pub id: FieldId,
	pub shortname: FieldShortname,
	/// Human-readable label.
	pub name: String,
	/// Storage type, e.g. `text`.
	pub datatype: String,
}

/// The two facts that identify a user set: its context and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSetRef {
	pub context_id: ContextId,
	pub name: String,
}

impl UserSetRef {
	pub fn new(context_id: ContextId, name: impl Into<String>) -> Self {
		Self {
			context_id,
			name: name.into(),
		}
	}
}

/// Subscription window of a user set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionWindow {
	pub expires_at: DateTime<Utc>,
	pub extended_until: Option<DateTime<Utc>>,
}

impl SubscriptionWindow {
	pub fn new(expires_at: DateTime<Utc>, extended_until: Option<DateTime<Utc>>) -> Self {
		Self {
			expires_at,
			extended_until,
		}
	}

	/// An extension, when present, keeps the window open past its expiry.
	pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
		now <= self.expires_at || self.extended_until.is_some_and(|until| now <= until)
	}
}
