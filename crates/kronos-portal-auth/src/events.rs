// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plugin events.
//!
//! Every notable login or provisioning failure is reported as a
//! [`PortalEvent`] and handed to an [`EventSink`] supplied by the host. Events
//! are read-only (`crud = "r"`), at participating level, in the system context.
//! Delivery is best-effort: [`emit`] logs sink failures and carries on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{ContextId, FieldId, SolutionId, UserId, UserSetRef, SYSTEM_CONTEXT};

/// Kinds of events the plugin reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalEventType {
	/// The cluster hook could not sync the account to its linked user.
	#[serde(rename = "elisuser_not_created")]
	ElisUserNotCreated,
	/// The solution id field is missing from the plugin configuration.
	#[serde(rename = "invalid_configuration")]
	InvalidConfiguration,
	/// A learning path referenced during account creation does not exist.
	#[serde(rename = "learningpath_not_exist")]
	LearningPathNotExist,
	/// The user has no value for the solution id field.
	#[serde(rename = "user_profile_solutionid_not_found")]
	UserProfileSolutionIdNotFound,
	/// The user set has no expiry date.
	#[serde(rename = "userset_expiry_not_found")]
	UserSetExpiryNotFound,
	/// The user set's subscription window has lapsed.
	#[serde(rename = "userset_has_expired")]
	UserSetHasExpired,
	/// No user set claims the solution id.
	#[serde(rename = "userset_not_found")]
	UserSetNotFound,
}

impl std::fmt::Display for PortalEventType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			PortalEventType::ElisUserNotCreated => "elisuser_not_created",
			PortalEventType::InvalidConfiguration => "invalid_configuration",
			PortalEventType::LearningPathNotExist => "learningpath_not_exist",
			PortalEventType::UserProfileSolutionIdNotFound => "user_profile_solutionid_not_found",
			PortalEventType::UserSetExpiryNotFound => "userset_expiry_not_found",
			PortalEventType::UserSetHasExpired => "userset_has_expired",
			PortalEventType::UserSetNotFound => "userset_not_found",
		};
		write!(f, "{s}")
	}
}

/// Kind of data access an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crud {
	#[serde(rename = "c")]
	Create,
	#[serde(rename = "r")]
	Read,
	#[serde(rename = "u")]
	Update,
	#[serde(rename = "d")]
	Delete,
}

/// Educational level of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EduLevel {
	Other,
	Participating,
	Teaching,
}

/// A single plugin event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalEvent {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub event_type: PortalEventType,
	pub crud: Crud,
	pub edu_level: EduLevel,
	pub context_id: ContextId,
	/// The user the event is about, when known by id.
	pub user_id: Option<UserId>,
	/// Event-specific payload.
	pub other: serde_json::Value,
}

/// Expiry/extension date field ids reported with user set events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryFields {
	pub expiry: Option<FieldId>,
	pub extension: Option<FieldId>,
}

impl PortalEvent {
	pub fn builder(event_type: PortalEventType) -> PortalEventBuilder {
		PortalEventBuilder::new(event_type)
	}

	pub fn elisuser_not_created(username: &str) -> Self {
		let message =
			format!("Unable to find ELIS user linked to Moodle user.  Moodle username {username}");
		Self::builder(PortalEventType::ElisUserNotCreated)
			.other(json!({ "username": username, "message": message }))
			.build()
	}

	pub fn invalid_configuration() -> Self {
		Self::builder(PortalEventType::InvalidConfiguration).build()
	}

	pub fn learningpath_not_exist(
		username: &str,
		learning_path: &str,
		solution_userset_name: &str,
	) -> Self {
		let message = format!("Unable to create user (username: {username}).");
		Self::builder(PortalEventType::LearningPathNotExist)
			.other(json!({
				"username": username,
				"message": message,
				"wfc_learning_path": learning_path,
				"solution_userset_name": solution_userset_name,
			}))
			.build()
	}

	pub fn user_profile_solutionid_not_found(user_id: UserId, field_id: Option<FieldId>) -> Self {
		let field = field_id.map(|f| f.to_string()).unwrap_or_default();
		let message = format!("Unable to find userid: {user_id} custom profile fieldid: {field}");
		Self::builder(PortalEventType::UserProfileSolutionIdNotFound)
			.user(user_id)
			.other(json!({
				"message": message,
				"user_moodle_custom_field_id": field_id,
			}))
			.build()
	}

	pub fn userset_expiry_not_found(
		username: &str,
		context_id: ContextId,
		fields: ExpiryFields,
	) -> Self {
		let message = format!("Login attempt by {username}in context (Context Instance ID: {context_id}.");
		Self::builder(PortalEventType::UserSetExpiryNotFound)
			.other(json!({
				"username": username,
				"message": message,
				"context_id": context_id,
				"user_set_expriy_date_field_id": fields.expiry,
				"user_set_extension_date_field_id": fields.extension,
			}))
			.build()
	}

	pub fn userset_has_expired(
		attempt: &str,
		username: &str,
		userset: &UserSetRef,
		fields: ExpiryFields,
		now: DateTime<Utc>,
	) -> Self {
		let message = format!(
			"{attempt} by {username}.  User Set {} (Contextid {}) has expired",
			userset.name, userset.context_id
		);
		Self::builder(PortalEventType::UserSetHasExpired)
			.other(json!({
				"username": username,
				"message": message,
				"context_id": userset.context_id,
				"user_set_name": userset.name,
				"user_set_expriy_date_field_id": fields.expiry,
				"user_set_extension_date_field_id": fields.extension,
				"current_time": now.timestamp(),
			}))
			.build()
	}

	pub fn userset_not_found(
		attempt: &str,
		username: &str,
		field_id: Option<FieldId>,
		solution_id: Option<&SolutionId>,
	) -> Self {
		let message = format!("{attempt} by {username}.");
		Self::builder(PortalEventType::UserSetNotFound)
			.other(json!({
				"username": username,
				"message": message,
				"user_set_solutionid_field_id": field_id,
				"user_solutionid_value": solution_id,
			}))
			.build()
	}
}

/// Builder for constructing events with a fluent API.
#[derive(Debug, Clone)]
pub struct PortalEventBuilder {
	event_type: PortalEventType,
	context_id: ContextId,
	user_id: Option<UserId>,
	other: serde_json::Value,
}

impl PortalEventBuilder {
	pub fn new(event_type: PortalEventType) -> Self {
		Self {
			event_type,
			context_id: SYSTEM_CONTEXT,
			user_id: None,
			other: serde_json::Value::Null,
		}
	}

	pub fn user(mut self, user_id: UserId) -> Self {
		self.user_id = Some(user_id);
		self
	}

	pub fn context(mut self, context_id: ContextId) -> Self {
		self.context_id = context_id;
		self
	}

	pub fn other(mut self, other: serde_json::Value) -> Self {
		self.other = other;
		self
	}

	pub fn build(self) -> PortalEvent {
		PortalEvent {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			crud: Crud::Read,
			edu_level: EduLevel::Participating,
			context_id: self.context_id,
			user_id: self.user_id,
			other: self.other,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum EventSinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),
}

/// Destination for plugin events, provided by the host.
#[async_trait]
pub trait EventSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, event: Arc<PortalEvent>) -> Result<(), EventSinkError>;
}

/// Sink that records events as structured `tracing` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, event: Arc<PortalEvent>) -> Result<(), EventSinkError> {
		info!(
			target: "kronos_portal::events",
			event_id = %event.id,
			event_type = %event.event_type,
			context_id = %event.context_id,
			user_id = ?event.user_id.map(UserId::get),
			other = %event.other,
			"portal event"
		);
		Ok(())
	}
}

/// Publish an event, logging instead of failing when the sink rejects it.
pub async fn emit(sink: &dyn EventSink, event: PortalEvent) {
	let event_type = event.event_type;
	if let Err(e) = sink.publish(Arc::new(event)).await {
		warn!(sink = sink.name(), %event_type, error = %e, "event sink publish failed");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	mod event_type {
		use super::*;

		#[test]
		fn display_matches_serialized_name() {
			let all = [
				PortalEventType::ElisUserNotCreated,
				PortalEventType::InvalidConfiguration,
				PortalEventType::LearningPathNotExist,
				PortalEventType::UserProfileSolutionIdNotFound,
				PortalEventType::UserSetExpiryNotFound,
				PortalEventType::UserSetHasExpired,
				PortalEventType::UserSetNotFound,
			];
			for event_type in all {
				let json = serde_json::to_string(&event_type).unwrap();
				assert_eq!(json, format!("\"{event_type}\""));
			}
		}

		#[test]
		fn deserializes_plugin_name() {
			let t: PortalEventType = serde_json::from_str("\"userset_has_expired\"").unwrap();
			assert_eq!(t, PortalEventType::UserSetHasExpired);
		}
	}

	mod catalogue {
		use super::*;

		fn assert_common(event: &PortalEvent) {
			assert_eq!(event.crud, Crud::Read);
			assert_eq!(event.edu_level, EduLevel::Participating);
			assert_eq!(event.context_id, SYSTEM_CONTEXT);
		}

		#[test]
		fn elisuser_not_created() {
			let event = PortalEvent::elisuser_not_created("test1");
			assert_common(&event);
			assert_eq!(event.other["username"], "test1");
			assert_eq!(
				event.other["message"],
				"Unable to find ELIS user linked to Moodle user.  Moodle username test1"
			);
		}

		#[test]
		fn invalid_configuration_has_no_payload() {
			let event = PortalEvent::invalid_configuration();
			assert_common(&event);
			assert_eq!(event.other, serde_json::Value::Null);
		}

		#[test]
		fn learningpath_not_exist() {
			let event = PortalEvent::learningpath_not_exist("test1", "learningpath", "solutionuserset");
			assert_common(&event);
			assert_eq!(event.other["message"], "Unable to create user (username: test1).");
			assert_eq!(event.other["wfc_learning_path"], "learningpath");
			assert_eq!(event.other["solution_userset_name"], "solutionuserset");
		}

		#[test]
		fn user_profile_solutionid_not_found() {
			let event =
				PortalEvent::user_profile_solutionid_not_found(UserId::new(9), Some(FieldId::new(73)));
			assert_common(&event);
			assert_eq!(event.user_id, Some(UserId::new(9)));
			assert_eq!(
				event.other["message"],
				"Unable to find userid: 9 custom profile fieldid: 73"
			);
			assert_eq!(event.other["user_moodle_custom_field_id"], 73);
		}

		#[test]
		fn userset_expiry_not_found() {
			let fields = ExpiryFields {
				expiry: Some(FieldId::new(199)),
				extension: Some(FieldId::new(86)),
			};
			let event = PortalEvent::userset_expiry_not_found("test1", SYSTEM_CONTEXT, fields);
			assert_common(&event);
			assert_eq!(event.other["context_id"], 1);
			assert_eq!(event.other["user_set_expriy_date_field_id"], 199);
			assert_eq!(event.other["user_set_extension_date_field_id"], 86);
		}

		#[test]
		fn userset_has_expired() {
			let now = Utc::now();
			let userset = UserSetRef::new(ContextId::new(1), "user set one");
			let event = PortalEvent::userset_has_expired(
				"Login attempt",
				"test1",
				&userset,
				ExpiryFields::default(),
				now,
			);
			assert_common(&event);
			assert_eq!(
				event.other["message"],
				"Login attempt by test1.  User Set user set one (Contextid 1) has expired"
			);
			assert_eq!(event.other["user_set_name"], "user set one");
			assert_eq!(event.other["current_time"], now.timestamp());
		}

		#[test]
		fn userset_not_found() {
			let solution = SolutionId::from("solution value");
			let event = PortalEvent::userset_not_found(
				"Login attempt",
				"test1",
				Some(FieldId::new(1023)),
				Some(&solution),
			);
			assert_common(&event);
			assert_eq!(event.other["message"], "Login attempt by test1.");
			assert_eq!(event.other["user_set_solutionid_field_id"], 1023);
			assert_eq!(event.other["user_solutionid_value"], "solution value");
		}
	}

	mod builder {
		use super::*;

		#[test]
		fn generates_unique_ids() {
			let a = PortalEventBuilder::new(PortalEventType::UserSetNotFound).build();
			let b = PortalEventBuilder::new(PortalEventType::UserSetNotFound).build();
			assert_ne!(a.id, b.id);
		}

		#[test]
		fn context_override() {
			let event = PortalEventBuilder::new(PortalEventType::UserSetNotFound)
				.context(ContextId::new(40))
				.build();
			assert_eq!(event.context_id, ContextId::new(40));
		}

		#[test]
		fn serializes_crud_as_letter() {
			let event = PortalEvent::invalid_configuration();
			let json = serde_json::to_value(&event).unwrap();
			assert_eq!(json["crud"], "r");
			assert_eq!(json["edu_level"], "participating");
			assert_eq!(json["event_type"], "invalid_configuration");
		}
	}

	mod sinks {
		use super::*;

		struct RejectingSink;

		#[async_trait]
		impl EventSink for RejectingSink {
			fn name(&self) -> &str {
				"rejecting"
			}

			async fn publish(&self, _event: Arc<PortalEvent>) -> Result<(), EventSinkError> {
				Err(EventSinkError::Permanent("closed".to_string()))
			}
		}

		#[tokio::test]
		async fn emit_swallows_sink_failures() {
			emit(&RejectingSink, PortalEvent::invalid_configuration()).await;
		}

		#[tokio::test]
		async fn tracing_sink_accepts_events() {
			let result = TracingEventSink
				.publish(Arc::new(PortalEvent::elisuser_not_created("test1")))
				.await;
			assert!(result.is_ok());
		}
	}
}
