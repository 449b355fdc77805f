// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Password slot of a [`UserRecord`](crate::UserRecord).
//!
//! A [`SecretString`] prints and serializes as a placeholder and is zeroed on
//! drop. Only the user store reads the plain text, through
//! [`SecretString::expose`].
//!
//! ```
//! use kronos_portal_auth::SecretString;
//!
//! let password = SecretString::from("hunter2");
//! assert_eq!(format!("{password:?}"), "SecretString(\"[REDACTED]\")");
//! assert_eq!(password.expose(), "hunter2");
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// A plain-text password as supplied by the host.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
	pub fn new(password: String) -> Self {
		Self(password)
	}

	pub fn expose(&self) -> &str {
		&self.0
	}

	/// True when the password holds no non-whitespace characters.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&REDACTED).finish()
	}
}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_is_redacted() {
		let secret = SecretString::from("Passw0rd!");
		let debug = format!("{secret:?}");
		assert_eq!(debug, "SecretString(\"[REDACTED]\")");
		assert!(!debug.contains("Passw0rd"));
	}

	#[test]
	fn record_debug_hides_password() {
		let record = crate::UserRecord {
			password: Some(SecretString::from("Passw0rd!")),
			..Default::default()
		};
		assert!(!format!("{record:?}").contains("Passw0rd"));
	}

	#[test]
	fn serializes_redacted() {
		let secret = SecretString::from("Passw0rd!");
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, "\"[REDACTED]\"");
	}

	#[test]
	fn deserializes_plain_value() {
		let secret: SecretString = serde_json::from_str("\"Passw0rd!\"").unwrap();
		assert_eq!(secret.expose(), "Passw0rd!");
	}

	#[test]
	fn blank_detection() {
		assert!(SecretString::from("").is_blank());
		assert!(SecretString::from("  ").is_blank());
		assert!(!SecretString::from("x").is_blank());
	}
}
