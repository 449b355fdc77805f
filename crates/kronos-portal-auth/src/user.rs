// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User records.
//!
//! This module provides:
//! - [`User`] - a provisioned platform account with its custom profile fields
//! - [`UserRecord`] - the loose attribute bag used as provisioning input and
//!   as the candidate handed to the validator

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::secret::SecretString;
use crate::types::UserId;

/// Prefix the platform puts in front of custom field shortnames in flat user objects.
pub const PROFILE_FIELD_PREFIX: &str = "profile_field_";

/// A provisioned platform account.
///
/// # PII Handling
///
/// Names, email and location are user-provided PII and should not be logged.
/// Passwords are never part of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: UserId,
	pub username: String,
	pub idnumber: String,
	pub firstname: String,
	pub lastname: String,
	pub email: String,
	#[serde(default)]
	pub city: String,
	#[serde(default)]
	pub country: String,
	/// Authentication method tag, `kronosportal` for accounts created here.
	pub auth: String,
	pub confirmed: bool,
	/// External host the account belongs to.
	pub mnethostid: String,
	/// Custom profile field values keyed by shortname.
	#[serde(default)]
	pub profile: BTreeMap<String, String>,
}

impl User {
	pub fn profile_field(&self, shortname: &str) -> Option<&str> {
		self.profile.get(shortname).map(String::as_str)
	}

	/// The record form of this user, suitable for validation or merging.
	pub fn to_record(&self) -> UserRecord {
		UserRecord {
			id: Some(self.id),
			username: Some(self.username.clone()),
			idnumber: Some(self.idnumber.clone()),
			firstname: Some(self.firstname.clone()),
			lastname: Some(self.lastname.clone()),
			email: Some(self.email.clone()),
			city: Some(self.city.clone()),
			country: Some(self.country.clone()),
			password: None,
			auth: Some(self.auth.clone()),
			confirmed: Some(self.confirmed),
			mnethostid: Some(self.mnethostid.clone()),
			profile: self.profile.clone(),
			extra: BTreeMap::new(),
		}
	}
}

/// A loose user record: every attribute is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<UserId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub idnumber: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub firstname: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lastname: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<SecretString>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confirmed: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mnethostid: Option<String>,
	/// Custom profile field values keyed by shortname.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub profile: BTreeMap<String, String>,
	/// Non-null input attributes with no slot above, such as `lang` or an
	/// unusable `id`.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub extra: BTreeMap<String, Value>,
}

impl UserRecord {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a record from a flat platform user object.
	///
	/// Returns `None` when `value` is not a JSON object. Keys prefixed with
	/// [`PROFILE_FIELD_PREFIX`] become custom profile fields, `null` values
	/// are skipped, and anything else that fits no attribute lands in
	/// [`UserRecord::extra`]. Numbers are accepted wherever a string is.
	pub fn from_json(value: &Value) -> Option<Self> {
		let object = value.as_object()?;
		let mut record = Self::default();
		for (key, value) in object {
			record.apply(key, value);
		}
		Some(record)
	}

	/// Build a record from flat `(key, value)` string pairs.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut record = Self::default();
		for (key, value) in pairs {
			record.apply(key.as_ref(), &Value::String(value.into()));
		}
		record
	}

	fn apply(&mut self, key: &str, value: &Value) {
		if value.is_null() {
			return;
		}
		if !self.assign(key, value) {
			self.extra.insert(key.to_string(), value.clone());
		}
	}

	/// Store `value` in its typed slot; false when there is none or the
	/// value does not fit.
	fn assign(&mut self, key: &str, value: &Value) -> bool {
		if let Some(shortname) = key.strip_prefix(PROFILE_FIELD_PREFIX) {
			let Some(text) = scalar_text(value) else {
				return false;
			};
			self.profile.insert(shortname.to_string(), text);
			return true;
		}

		match key {
			"id" => {
				self.id = parse_id(value);
				self.id.is_some()
			}
			"confirmed" => {
				self.confirmed = parse_flag(value);
				self.confirmed.is_some()
			}
			"password" => {
				self.password = scalar_text(value).map(SecretString::new);
				self.password.is_some()
			}
			_ => {
				let slot = match key {
					"username" => &mut self.username,
					"idnumber" => &mut self.idnumber,
					"firstname" => &mut self.firstname,
					"lastname" => &mut self.lastname,
					"email" => &mut self.email,
					"city" => &mut self.city,
					"country" => &mut self.country,
					"auth" => &mut self.auth,
					"mnethostid" => &mut self.mnethostid,
					_ => return false,
				};
				*slot = scalar_text(value);
				slot.is_some()
			}
		}
	}

	/// The id, when it can name a stored account. Platform ids start at 1.
	pub fn valid_id(&self) -> Option<UserId> {
		self.id.filter(|id| id.get() > 0)
	}

	pub fn with_profile_field(mut self, shortname: impl Into<String>, value: impl Into<String>) -> Self {
		self.profile.insert(shortname.into(), value.into());
		self
	}

	pub fn profile_field(&self, shortname: &str) -> Option<&str> {
		self.profile.get(shortname).map(String::as_str)
	}

	/// True when the record carries no attribute at all.
	pub fn is_empty(&self) -> bool {
		self.id.is_none()
			&& self.username.is_none()
			&& self.idnumber.is_none()
			&& self.firstname.is_none()
			&& self.lastname.is_none()
			&& self.email.is_none()
			&& self.city.is_none()
			&& self.country.is_none()
			&& self.password.is_none()
			&& self.auth.is_none()
			&& self.confirmed.is_none()
			&& self.mnethostid.is_none()
			&& self.profile.is_empty()
			&& self.extra.is_empty()
	}

	/// True when a non-blank password is present.
	pub fn has_password(&self) -> bool {
		self.password.as_ref().is_some_and(|p| !p.is_blank())
	}
}

impl From<&User> for UserRecord {
	fn from(user: &User) -> Self {
		user.to_record()
	}
}

/// An attribute counts as present only when it holds non-whitespace text.
pub fn is_present(value: Option<&str>) -> bool {
	value.is_some_and(|v| !v.trim().is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
		_ => None,
	}
}

fn parse_id(value: &Value) -> Option<UserId> {
	let id = match value {
		Value::Number(n) => n.as_i64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	};
	id.filter(|id| *id > 0).map(UserId::new)
}

fn parse_flag(value: &Value) -> Option<bool> {
	match value {
		Value::Bool(b) => Some(*b),
		Value::Number(n) => n.as_i64().map(|n| n != 0),
		Value::String(s) => match s.trim() {
			"1" | "true" => Some(true),
			"0" | "false" => Some(false),
			_ => None,
		},
		_ => None,
	}
}
