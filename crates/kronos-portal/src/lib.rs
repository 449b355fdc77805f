// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kronos portal authentication adapter.
//!
//! [`KronosPortal`] ties together account provisioning
//! ([`kronos_portal_provisioning`]), solution id resolution and login
//! validation ([`kronos_portal_auth`]) over host-supplied [`Collaborators`].
//!
//! # Usage
//!
//! ```ignore
//! use kronos_portal::{telemetry, KronosPortal, ValidationMode};
//!
//! let config = kronos_portal_config::load_config()?;
//! telemetry::init_tracing(&config.logging)?;
//! let portal = KronosPortal::from_config(config, collaborators);
//!
//! let user = portal.create_user(&attributes).await?;
//! let result = portal.validate_user(Some(&user.to_record()), ValidationMode::Login).await?;
//! ```

mod error;
mod portal;
pub mod telemetry;

pub use error::{PortalError, Result};
pub use portal::{Collaborators, KronosPortal};

pub use kronos_portal_auth::{
	AuthError, FieldShortname, PortalEvent, PortalEventType, SolutionId, User, UserId, UserRecord,
	ValidationMode, ValidationResult,
};
pub use kronos_portal_config::{PluginConfig, PortalConfig};
pub use kronos_portal_provisioning::ProvisioningError;
