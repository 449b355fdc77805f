// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use kronos_portal_auth::{
	emit, is_present, resolve_solution_field, EventSink, PortalEvent, ProfileFieldRegistry,
	ProfileStore, ProfileUpdateHook, StoreError, User, UserId, UserRecord, UserStore,
};
use kronos_portal_config::PluginConfig;

use crate::error::ProvisioningError;

/// Authentication method tag stamped on every account this crate creates.
pub const AUTH_METHOD: &str = "kronosportal";

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// Platform collaborators the provisioner writes through.
#[derive(Clone)]
pub struct ProvisioningPorts {
	pub users: Arc<dyn UserStore>,
	pub profiles: Arc<dyn ProfileStore>,
	pub fields: Arc<dyn ProfileFieldRegistry>,
	pub hook: Arc<dyn ProfileUpdateHook>,
	pub events: Arc<dyn EventSink>,
}

/// Creates and updates portal accounts.
///
/// Both operations stop at the first collaborator failure. Nothing is rolled
/// back: an account created before a failing profile save stays created.
#[derive(Clone)]
pub struct UserProvisioner {
	config: Arc<PluginConfig>,
	ports: ProvisioningPorts,
}

impl UserProvisioner {
	pub fn new(config: Arc<PluginConfig>, ports: ProvisioningPorts) -> Self {
		Self { config, ports }
	}

	/// Create an account from an attribute bag.
	///
	/// The account is always tagged with [`AUTH_METHOD`] and confirmed,
	/// whatever the bag says. `idnumber` falls back to the username and the host to the
	/// configured local host.
	#[tracing::instrument(skip_all)]
	pub async fn create(&self, attributes: &UserRecord) -> Result<User> {
		let record = self.normalize_new(attributes);

		let user_id = self
			.ports
			.users
			.create_user(&record)
			.await
			.map_err(ProvisioningError::UserCreation)?;

		self.save_profile(user_id, &record.profile).await?;
		let user = self
			.reload(user_id, ProvisioningError::UserCreation)
			.await?;

		tracing::info!(user_id = %user_id, auth = %user.auth, "created portal user");
		self.notify(&user).await;
		Ok(user)
	}

	/// Update an existing account from an attribute bag.
	///
	/// Only firstname, lastname, email, city, country, password and the
	/// solution id field are taken from the bag. A key missing from the bag
	/// leaves the stored value alone; the password is only changed when the
	/// bag carries a non-blank one.
	#[tracing::instrument(skip_all, fields(user_id = ?attributes.id))]
	pub async fn update(&self, attributes: &UserRecord) -> Result<User> {
		let user_id = attributes
			.valid_id()
			.ok_or_else(|| ProvisioningError::InvalidUser("id is required for update".to_string()))?;

		let existing = self
			.ports
			.users
			.get_user(user_id)
			.await
			.map_err(ProvisioningError::UserUpdate)?
			.ok_or(ProvisioningError::UserNotFound(user_id))?;

		let shortname = resolve_solution_field(&self.config, self.ports.fields.as_ref()).await?;

		let mut merged = existing.to_record();
		merged.profile = self
			.ports
			.profiles
			.load_profile(user_id)
			.await
			.map_err(ProvisioningError::ProfileStorage)?;

		let overwrites = [
			(&mut merged.firstname, &attributes.firstname),
			(&mut merged.lastname, &attributes.lastname),
			(&mut merged.email, &attributes.email),
			(&mut merged.city, &attributes.city),
			(&mut merged.country, &attributes.country),
		];
		for (slot, value) in overwrites {
			if value.is_some() {
				slot.clone_from(value);
			}
		}
		merged.password = attributes.password.clone();
		if let Some(solution_id) = attributes.profile_field(shortname.as_str()) {
			merged
				.profile
				.insert(shortname.to_string(), solution_id.to_string());
		}

		let change_password = merged.has_password();
		self.ports
			.users
			.update_user(&merged, change_password)
			.await
			.map_err(ProvisioningError::UserUpdate)?;

		self.save_profile(user_id, &merged.profile).await?;
		let user = self.reload(user_id, ProvisioningError::UserUpdate).await?;

		tracing::info!(user_id = %user_id, change_password, "updated portal user");
		self.notify(&user).await;
		Ok(user)
	}

	fn normalize_new(&self, attributes: &UserRecord) -> UserRecord {
		let mut record = attributes.clone();
		record.id = None;
		record.auth = Some(AUTH_METHOD.to_string());
		record.confirmed = Some(true);
		if !is_present(record.idnumber.as_deref()) {
			record.idnumber = record.username.clone();
		}
		if !is_present(record.mnethostid.as_deref()) {
			record.mnethostid = Some(self.config.local_host.clone());
		}
		record
	}

	async fn save_profile(&self, user_id: UserId, fields: &BTreeMap<String, String>) -> Result<()> {
		self.ports
			.profiles
			.save_profile(user_id, fields)
			.await
			.map_err(ProvisioningError::ProfileStorage)
	}

	/// Load the base record and its custom fields.
	async fn reload(
		&self,
		user_id: UserId,
		on_store_error: fn(StoreError) -> ProvisioningError,
	) -> Result<User> {
		let mut user = self
			.ports
			.users
			.get_user(user_id)
			.await
			.map_err(on_store_error)?
			.ok_or(ProvisioningError::UserNotFound(user_id))?;
		user.profile = self
			.ports
			.profiles
			.load_profile(user_id)
			.await
			.map_err(ProvisioningError::ProfileStorage)?;
		Ok(user)
	}

	async fn notify(&self, user: &User) {
		if let Err(e) = self.ports.hook.notify(user).await {
			tracing::warn!(user_id = %user.id, error = %e, "profile update hook failed");
			emit(
				self.ports.events.as_ref(),
				PortalEvent::elisuser_not_created(&user.username),
			)
			.await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use kronos_portal_auth::testing::{
		FailingHook, InMemoryPlatform, RecordingEventSink, RecordingHook,
	};
	use kronos_portal_auth::{PortalEventType, SecretString};
	use proptest::prelude::*;

	struct Fixture {
		platform: Arc<InMemoryPlatform>,
		events: Arc<RecordingEventSink>,
		provisioner: UserProvisioner,
	}

	fn fixture_with_hook(hook: Arc<dyn ProfileUpdateHook>) -> Fixture {
		let platform = Arc::new(InMemoryPlatform::new());
		let field = platform.add_profile_field("customerid");
		platform.use_solution_field(field);
		platform.add_profile_field("learningpath");
		let events = Arc::new(RecordingEventSink::new());
		let ports = ProvisioningPorts {
			users: platform.clone(),
			profiles: platform.clone(),
			fields: platform.clone(),
			hook,
			events: events.clone(),
		};
		let provisioner = UserProvisioner::new(
			Arc::new(PluginConfig::with_solution_field(field.get())),
			ports,
		);
		Fixture {
			platform,
			events,
			provisioner,
		}
	}

	fn fixture() -> Fixture {
		fixture_with_hook(Arc::new(RecordingHook::new()))
	}

	fn recorded() -> (Fixture, Arc<RecordingHook>) {
		let hook = Arc::new(RecordingHook::new());
		(fixture_with_hook(hook.clone()), hook)
	}

	fn attributes() -> UserRecord {
		UserRecord {
			username: Some("test1".to_string()),
			firstname: Some("firstname1".to_string()),
			lastname: Some("lastname1".to_string()),
			email: Some("test1@kronos.com".to_string()),
			password: Some(SecretString::from("Passw0rd!")),
			..Default::default()
		}
		.with_profile_field("customerid", "testcustomerid")
	}

	mod create {
		use super::*;

		#[tokio::test]
		async fn forces_auth_and_confirmation() {
			let f = fixture();
			let mut attrs = attributes();
			attrs.auth = Some("manual".to_string());
			attrs.confirmed = Some(false);

			let user = f.provisioner.create(&attrs).await.unwrap();
			assert_eq!(user.auth, AUTH_METHOD);
			assert!(user.confirmed);
		}

		#[tokio::test]
		async fn auth_tag_is_fixed_while_host_is_configurable() {
			let platform = Arc::new(InMemoryPlatform::new());
			let field = platform.add_profile_field("customerid");
			let config = PluginConfig {
				local_host: "edge".to_string(),
				..PluginConfig::with_solution_field(field.get())
			};
			let provisioner = UserProvisioner::new(
				Arc::new(config),
				ProvisioningPorts {
					users: platform.clone(),
					profiles: platform.clone(),
					fields: platform.clone(),
					hook: Arc::new(RecordingHook::new()),
					events: Arc::new(RecordingEventSink::new()),
				},
			);

			let user = provisioner.create(&attributes()).await.unwrap();
			assert_eq!(user.auth, "kronosportal");
			assert_eq!(user.mnethostid, "edge");
		}

		#[tokio::test]
		async fn defaults_idnumber_and_host() {
			let f = fixture();
			let user = f.provisioner.create(&attributes()).await.unwrap();
			assert_eq!(user.idnumber, "test1");
			assert_eq!(user.mnethostid, "local");
		}

		#[tokio::test]
		async fn keeps_explicit_idnumber() {
			let f = fixture();
			let mut attrs = attributes();
			attrs.idnumber = Some("EMP-7".to_string());
			let user = f.provisioner.create(&attrs).await.unwrap();
			assert_eq!(user.idnumber, "EMP-7");
		}

		#[tokio::test]
		async fn persists_and_returns_custom_fields() {
			let f = fixture();
			let attrs = attributes().with_profile_field("learningpath", "path-1");
			let user = f.provisioner.create(&attrs).await.unwrap();

			assert_eq!(user.profile_field("customerid"), Some("testcustomerid"));
			assert_eq!(user.profile_field("learningpath"), Some("path-1"));
			assert_eq!(f.platform.password_of(user.id).as_deref(), Some("Passw0rd!"));
		}

		#[tokio::test]
		async fn notifies_hook() {
			let (f, hook) = recorded();
			let user = f.provisioner.create(&attributes()).await.unwrap();
			let notified = hook.notified();
			assert_eq!(notified.len(), 1);
			assert_eq!(notified[0].id, user.id);
		}

		#[tokio::test]
		async fn store_failure_is_creation_error() {
			let f = fixture();
			f.provisioner.create(&attributes()).await.unwrap();
			let err = f.provisioner.create(&attributes()).await.unwrap_err();
			assert!(matches!(
				err,
				ProvisioningError::UserCreation(StoreError::Duplicate(_))
			));
		}

		#[tokio::test]
		async fn profile_failure_leaves_account_in_place() {
			let f = fixture();
			f.platform
				.fail_profile_saves(Some(StoreError::Backend("disk full".to_string())));

			let err = f.provisioner.create(&attributes()).await.unwrap_err();
			assert!(matches!(err, ProvisioningError::ProfileStorage(_)));
			assert_eq!(f.platform.user_count(), 1);
		}

		#[tokio::test]
		async fn hook_failure_is_reported_not_raised() {
			let f = fixture_with_hook(Arc::new(FailingHook));
			let user = f.provisioner.create(&attributes()).await.unwrap();
			assert_eq!(user.username, "test1");

			let events = f.events.events();
			assert_eq!(events.len(), 1);
			assert_eq!(events[0].event_type, PortalEventType::ElisUserNotCreated);
			assert_eq!(events[0].other["username"], "test1");
		}
	}

	mod update {
		use super::*;

		async fn created(f: &Fixture) -> User {
			f.provisioner.create(&attributes()).await.unwrap()
		}

		#[tokio::test]
		async fn requires_id() {
			let f = fixture();
			let err = f.provisioner.update(&attributes()).await.unwrap_err();
			assert!(matches!(err, ProvisioningError::InvalidUser(_)));
		}

		#[tokio::test]
		async fn zero_or_negative_id_is_invalid() {
			let f = fixture();
			for raw in [0, -1, i64::MIN] {
				let attrs = UserRecord {
					id: Some(UserId::new(raw)),
					lastname: Some("x".to_string()),
					..Default::default()
				};
				let err = f.provisioner.update(&attrs).await.unwrap_err();
				assert!(
					matches!(err, ProvisioningError::InvalidUser(_)),
					"id {raw} gave {err:?}"
				);
			}
		}

		#[tokio::test]
		async fn zero_id_from_json_is_invalid() {
			let f = fixture();
			let attrs =
				UserRecord::from_json(&serde_json::json!({"id": 0, "lastname": "x"})).unwrap();
			let err = f.provisioner.update(&attrs).await.unwrap_err();
			assert!(matches!(err, ProvisioningError::InvalidUser(_)));
		}

		#[tokio::test]
		async fn unknown_id_is_not_found() {
			let f = fixture();
			let attrs = UserRecord {
				id: Some(UserId::new(404)),
				..attributes()
			};
			let err = f.provisioner.update(&attrs).await.unwrap_err();
			assert!(matches!(err, ProvisioningError::UserNotFound(id) if id == UserId::new(404)));
		}

		#[tokio::test]
		async fn overwrites_listed_attributes() {
			let f = fixture();
			let user = created(&f).await;
			let attrs = UserRecord {
				id: Some(user.id),
				firstname: Some("renamed".to_string()),
				city: Some("Ottawa".to_string()),
				..Default::default()
			}
			.with_profile_field("customerid", "othercustomer");

			let updated = f.provisioner.update(&attrs).await.unwrap();
			assert_eq!(updated.firstname, "renamed");
			assert_eq!(updated.city, "Ottawa");
			assert_eq!(updated.lastname, "lastname1");
			assert_eq!(updated.email, "test1@kronos.com");
			assert_eq!(updated.profile_field("customerid"), Some("othercustomer"));
		}

		#[tokio::test]
		async fn ignores_unlisted_attributes() {
			let f = fixture();
			let user = created(&f).await;
			let attrs = UserRecord {
				id: Some(user.id),
				username: Some("hijacked".to_string()),
				..Default::default()
			}
			.with_profile_field("learningpath", "path-2");

			let updated = f.provisioner.update(&attrs).await.unwrap();
			assert_eq!(updated.username, "test1");
			assert_eq!(updated.profile_field("learningpath"), None);
		}

		#[tokio::test]
		async fn absent_password_leaves_it_untouched() {
			let f = fixture();
			let user = created(&f).await;
			let attrs = UserRecord {
				id: Some(user.id),
				email: Some("new@kronos.com".to_string()),
				..Default::default()
			};

			f.provisioner.update(&attrs).await.unwrap();
			assert_eq!(f.platform.password_of(user.id).as_deref(), Some("Passw0rd!"));
		}

		#[tokio::test]
		async fn blank_password_leaves_it_untouched() {
			let f = fixture();
			let user = created(&f).await;
			let attrs = UserRecord {
				id: Some(user.id),
				password: Some(SecretString::from("   ")),
				..Default::default()
			};

			f.provisioner.update(&attrs).await.unwrap();
			assert_eq!(f.platform.password_of(user.id).as_deref(), Some("Passw0rd!"));
		}

		#[tokio::test]
		async fn new_password_is_written() {
			let f = fixture();
			let user = created(&f).await;
			let attrs = UserRecord {
				id: Some(user.id),
				password: Some(SecretString::from("N3wPassw0rd!")),
				..Default::default()
			};

			f.provisioner.update(&attrs).await.unwrap();
			assert_eq!(
				f.platform.password_of(user.id).as_deref(),
				Some("N3wPassw0rd!")
			);
		}

		#[tokio::test]
		async fn unconfigured_solution_field_is_auth_error() {
			let f = fixture();
			let user = created(&f).await;
			let provisioner = UserProvisioner::new(
				Arc::new(PluginConfig::default()),
				f.provisioner.ports.clone(),
			);
			let attrs = UserRecord {
				id: Some(user.id),
				..Default::default()
			};

			let err = provisioner.update(&attrs).await.unwrap_err();
			assert!(matches!(err, ProvisioningError::Auth(e) if e.is_configuration()));
		}

		#[tokio::test]
		async fn notifies_hook_again() {
			let (f, hook) = recorded();
			let user = created(&f).await;
			f.provisioner
				.update(&UserRecord {
					id: Some(user.id),
					..Default::default()
				})
				.await
				.unwrap();
			assert_eq!(hook.notified().len(), 2);
		}

		#[tokio::test]
		async fn solution_field_change_is_visible_to_collaborator() {
			use kronos_portal_auth::AuthCollaborator;

			let f = fixture();
			let user = created(&f).await;
			let attrs = UserRecord {
				id: Some(user.id),
				..Default::default()
			}
			.with_profile_field("customerid", "moved");

			f.provisioner.update(&attrs).await.unwrap();
			let stored = f.platform.get_user_solution_id(user.id).await.unwrap();
			assert_eq!(stored.as_ref().map(|s| s.as_str()), Some("moved"));
		}
	}

	proptest! {
		#[test]
		fn update_without_id_is_always_invalid(
			firstname in "[a-zA-Z]{0,12}",
			email in "[a-z]{1,8}@[a-z]{1,8}\\.com",
		) {
			let f = fixture();
			let attrs = UserRecord {
				firstname: Some(firstname),
				email: Some(email),
				..Default::default()
			};
			let result = tokio_test::block_on(f.provisioner.update(&attrs));
			prop_assert!(matches!(result, Err(ProvisioningError::InvalidUser(_))));
		}
	}
}
