// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborator doubles.
//!
//! [`InMemoryPlatform`] implements every store and collaborator port over one
//! shared state, so a test can provision a user through [`UserStore`] and
//! then validate it through [`AuthCollaborator`] against the same data.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::events::{EventSink, EventSinkError, PortalEvent, PortalEventType};
use crate::ports::{
	AuthCollaborator, HookError, ProfileFieldRegistry, ProfileStore, ProfileUpdateHook, StoreError,
	UserStore,
};
use crate::secret::SecretString;
use crate::types::{
	ContextId, FieldId, FieldShortname, ProfileField, SolutionId, SubscriptionWindow, UserId,
	UserSetRef,
};
use crate::user::{User, UserRecord};

struct StoredUserSet {
	solution_id: SolutionId,
	userset: UserSetRef,
	window: SubscriptionWindow,
}

#[derive(Default)]
struct PlatformState {
	fields: BTreeMap<FieldId, ProfileField>,
	solution_field: Option<FieldId>,
	users: BTreeMap<UserId, User>,
	passwords: BTreeMap<UserId, SecretString>,
	profile_data: BTreeMap<(UserId, FieldId), String>,
	usersets: Vec<StoredUserSet>,
	next_user_id: i64,
	next_field_id: i64,
	next_context_id: i64,
	profile_save_error: Option<StoreError>,
	userset_lookup_error: Option<StoreError>,
}

impl PlatformState {
	fn field_by_shortname(&self, shortname: &str) -> Option<FieldId> {
		self.fields
			.values()
			.find(|f| f.shortname.as_str() == shortname)
			.map(|f| f.id)
	}

	fn solution_value(&self, user_id: UserId) -> Option<&String> {
		let field = self.solution_field?;
		self.profile_data.get(&(user_id, field))
	}
}

/// Users, profile fields and user sets held in memory.
#[derive(Default)]
pub struct InMemoryPlatform {
	state: Mutex<PlatformState>,
}

impl InMemoryPlatform {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, PlatformState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Register a text profile field and return its id.
	pub fn add_profile_field(&self, shortname: &str) -> FieldId {
		let mut state = self.state();
		state.next_field_id += 1;
		let id = FieldId::new(state.next_field_id);
		state.fields.insert(
			id,
			ProfileField {
				id,
				shortname: FieldShortname::from(shortname),
				name: shortname.to_string(),
				datatype: "text".to_string(),
			},
		);
		id
	}

	/// The field the user set subsystem reads solution ids from.
	pub fn use_solution_field(&self, field: FieldId) {
		self.state().solution_field = Some(field);
	}

	/// Store a confirmed account with placeholder attributes.
	pub fn insert_user(&self, username: &str) -> UserId {
		let mut state = self.state();
		state.next_user_id += 1;
		let id = UserId::new(state.next_user_id);
		state.users.insert(
			id,
			User {
				id,
				username: username.to_string(),
				idnumber: username.to_string(),
				firstname: "first".to_string(),
				lastname: "last".to_string(),
				email: format!("{username}@example.com"),
				city: String::new(),
				country: String::new(),
				auth: "kronosportal".to_string(),
				confirmed: true,
				mnethostid: "local".to_string(),
				profile: BTreeMap::new(),
			},
		);
		id
	}

	pub fn set_profile_value(&self, user_id: UserId, field: FieldId, value: &str) {
		self.state()
			.profile_data
			.insert((user_id, field), value.to_string());
	}

	/// Add a user set claiming `solution_id` in a fresh context.
	pub fn add_userset(&self, solution_id: &str, name: &str, window: SubscriptionWindow) -> ContextId {
		let mut state = self.state();
		state.next_context_id += 1;
		let context_id = ContextId::new(100 + state.next_context_id);
		state.usersets.push(StoredUserSet {
			solution_id: SolutionId::from(solution_id),
			userset: UserSetRef::new(context_id, name),
			window,
		});
		context_id
	}

	pub fn password_of(&self, user_id: UserId) -> Option<String> {
		self.state()
			.passwords
			.get(&user_id)
			.map(|p| p.expose().to_string())
	}

	pub fn user_count(&self) -> usize {
		self.state().users.len()
	}

	/// Make every later `save_profile` fail with `error`; `None` clears it.
	pub fn fail_profile_saves(&self, error: Option<StoreError>) {
		self.state().profile_save_error = error;
	}

	/// Make every later user set lookup fail with `error`; `None` clears it.
	pub fn fail_userset_lookups(&self, error: Option<StoreError>) {
		self.state().userset_lookup_error = error;
	}
}

fn text(value: &Option<String>) -> String {
	value.clone().unwrap_or_default()
}

#[async_trait]
impl UserStore for InMemoryPlatform {
	async fn create_user(&self, record: &UserRecord) -> Result<UserId, StoreError> {
		let username = record
			.username
			.clone()
			.filter(|u| !u.trim().is_empty())
			.ok_or_else(|| StoreError::Invalid("username is required".to_string()))?;

		let mut state = self.state();
		if state.users.values().any(|u| u.username == username) {
			return Err(StoreError::Duplicate(format!("username {username}")));
		}

		state.next_user_id += 1;
		let id = UserId::new(state.next_user_id);
		state.users.insert(
			id,
			User {
				id,
				username,
				idnumber: text(&record.idnumber),
				firstname: text(&record.firstname),
				lastname: text(&record.lastname),
				email: text(&record.email),
				city: text(&record.city),
				country: text(&record.country),
				auth: text(&record.auth),
				confirmed: record.confirmed.unwrap_or(false),
				mnethostid: text(&record.mnethostid),
				profile: BTreeMap::new(),
			},
		);
		if let Some(password) = &record.password {
			state.passwords.insert(id, password.clone());
		}
		Ok(id)
	}

	async fn update_user(&self, record: &UserRecord, change_password: bool) -> Result<(), StoreError> {
		let id = record
			.id
			.ok_or_else(|| StoreError::Invalid("id is required".to_string()))?;

		let mut state = self.state();
		let user = state
			.users
			.get_mut(&id)
			.ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;

		let slots = [
			(&mut user.username, &record.username),
			(&mut user.idnumber, &record.idnumber),
			(&mut user.firstname, &record.firstname),
			(&mut user.lastname, &record.lastname),
			(&mut user.email, &record.email),
			(&mut user.city, &record.city),
			(&mut user.country, &record.country),
			(&mut user.auth, &record.auth),
			(&mut user.mnethostid, &record.mnethostid),
		];
		for (slot, value) in slots {
			if let Some(value) = value {
				slot.clone_from(value);
			}
		}
		if let Some(confirmed) = record.confirmed {
			user.confirmed = confirmed;
		}

		if change_password {
			if let Some(password) = &record.password {
				state.passwords.insert(id, password.clone());
			}
		}
		Ok(())
	}

	async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
		Ok(self.state().users.get(&id).cloned())
	}
}

#[async_trait]
impl ProfileStore for InMemoryPlatform {
	async fn save_profile(
		&self,
		user_id: UserId,
		fields: &BTreeMap<String, String>,
	) -> Result<(), StoreError> {
		let mut state = self.state();
		if let Some(error) = state.profile_save_error.clone() {
			return Err(error);
		}
		if !state.users.contains_key(&user_id) {
			return Err(StoreError::NotFound(format!("user {user_id}")));
		}
		for (shortname, value) in fields {
			// Values for undefined fields are dropped, as the platform does.
			if let Some(field) = state.field_by_shortname(shortname) {
				state.profile_data.insert((user_id, field), value.clone());
			}
		}
		Ok(())
	}

	async fn load_profile(&self, user_id: UserId) -> Result<BTreeMap<String, String>, StoreError> {
		let state = self.state();
		let profile = state
			.profile_data
			.iter()
			.filter(|((owner, _), _)| *owner == user_id)
			.filter_map(|((_, field), value)| {
				let shortname = state.fields.get(field)?.shortname.to_string();
				Some((shortname, value.clone()))
			})
			.collect();
		Ok(profile)
	}
}

#[async_trait]
impl ProfileFieldRegistry for InMemoryPlatform {
	async fn get_field(&self, id: FieldId) -> Result<Option<ProfileField>, StoreError> {
		Ok(self.state().fields.get(&id).cloned())
	}
}

#[async_trait]
impl AuthCollaborator for InMemoryPlatform {
	async fn get_user_solution_id(&self, user_id: UserId) -> Result<Option<SolutionId>, StoreError> {
		Ok(self
			.state()
			.solution_value(user_id)
			.map(|value| SolutionId::new(value.as_str())))
	}

	async fn userset_solutionid_exists(
		&self,
		solution_id: &SolutionId,
	) -> Result<Option<UserSetRef>, StoreError> {
		let state = self.state();
		if let Some(error) = state.userset_lookup_error.clone() {
			return Err(error);
		}
		Ok(state
			.usersets
			.iter()
			.find(|s| &s.solution_id == solution_id)
			.map(|s| s.userset.clone()))
	}

	async fn user_set_has_valid_subscription(
		&self,
		solution_id: &SolutionId,
		context_id: ContextId,
		name: &str,
	) -> Result<bool, StoreError> {
		let state = self.state();
		let window = state
			.usersets
			.iter()
			.find(|s| {
				&s.solution_id == solution_id
					&& s.userset.context_id == context_id
					&& s.userset.name == name
			})
			.map(|s| s.window);
		Ok(window.is_some_and(|w| w.is_active_at(Utc::now())))
	}

	async fn user_solutionid_field_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
		Ok(self
			.state()
			.solution_value(user_id)
			.is_some_and(|v| !v.trim().is_empty()))
	}
}

/// Event sink that keeps every published event.
#[derive(Default)]
pub struct RecordingEventSink {
	events: Mutex<Vec<Arc<PortalEvent>>>,
}

impl RecordingEventSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<Arc<PortalEvent>> {
		self.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn event_types(&self) -> Vec<PortalEventType> {
		self.events().iter().map(|e| e.event_type).collect()
	}
}

#[async_trait]
impl EventSink for RecordingEventSink {
	fn name(&self) -> &str {
		"recording"
	}

	async fn publish(&self, event: Arc<PortalEvent>) -> Result<(), EventSinkError> {
		self.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(event);
		Ok(())
	}
}

/// Hook that remembers every user it was notified about.
#[derive(Default)]
pub struct RecordingHook {
	notified: Mutex<Vec<User>>,
}

impl RecordingHook {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn notified(&self) -> Vec<User> {
		self.notified
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

#[async_trait]
impl ProfileUpdateHook for RecordingHook {
	async fn notify(&self, user: &User) -> Result<(), HookError> {
		self.notified
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(user.clone());
		Ok(())
	}
}

/// Hook that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingHook;

#[async_trait]
impl ProfileUpdateHook for FailingHook {
	async fn notify(&self, user: &User) -> Result<(), HookError> {
		Err(HookError(format!("no linked user for {}", user.username)))
	}
}
