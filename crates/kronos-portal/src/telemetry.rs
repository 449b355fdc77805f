// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup for hosts that do not install their own.

use kronos_portal_config::LoggingConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
	#[error("invalid log filter: {0}")]
	Filter(#[from] ParseError),

	#[error("tracing subscriber already installed: {0}")]
	Init(#[from] TryInitError),
}

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => Ok(EnvFilter::try_new(&config.level)?),
	}
}

/// Install a global subscriber writing to stdout, as JSON when configured.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
	let filter = env_filter(config)?;
	let registry = tracing_subscriber::registry().with(filter);

	if config.json {
		registry
			.with(tracing_subscriber::fmt::layer().json())
			.try_init()?;
	} else {
		registry.with(tracing_subscriber::fmt::layer()).try_init()?;
	}

	tracing::debug!(filter = %config.level, json = config.json, "tracing initialised");
	Ok(())
}
