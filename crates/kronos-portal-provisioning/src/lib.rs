// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User provisioning for the Kronos portal.
//!
//! Provides the single code path for creating and updating portal accounts:
//! - accounts are tagged with the configured auth method and confirmed
//! - custom profile fields are persisted alongside the base record
//! - the profile-update hook runs after every write, best-effort

mod error;
mod service;

pub use error::ProvisioningError;
pub use service::{ProvisioningPorts, Result, UserProvisioner, AUTH_METHOD};
