// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod logging;
mod plugin;

pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use plugin::{PluginConfig, PluginConfigLayer, DEFAULT_LOCAL_HOST};
