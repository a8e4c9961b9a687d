// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for Warden.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Policy documents listing group grants
//! - Tracing subscriber setup driven by the logging section
//!
//! # Usage
//!
//! ```ignore
//! use warden_config::{init_logging, load_config};
//!
//! let config = load_config()?;
//! init_logging(&config.logging)?;
//! let groups = config.load_policy()?;
//! ```

pub mod error;
pub mod layer;
pub mod logging;
pub mod policy;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WardenConfigLayer;
pub use logging::{env_filter, init_logging};
pub use policy::{load_policy, parse_policy};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use warden_ability::GroupGrants;

/// Fully resolved Warden configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WardenConfig {
	pub rules: RulesConfig,
	pub logging: LoggingConfig,
	pub policy: PolicyConfig,
}

impl WardenConfig {
	/// Group grants from the configured policy document, or none.
	pub fn load_policy(&self) -> Result<Vec<GroupGrants>, ConfigError> {
		match &self.policy.path {
			Some(path) => load_policy(path),
			None => Ok(Vec::new()),
		}
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_*`)
/// 2. Config file (`/etc/warden/warden.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from(sources)
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource)];
	load_from(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<PathBuf>,
) -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from(sources)
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<WardenConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WardenConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: WardenConfigLayer) -> Result<WardenConfig, ConfigError> {
	let config = WardenConfig {
		rules: layer.rules.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		policy: layer.policy.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		strict_by_default = config.rules.strict_by_default,
		log_level = %config.logging.level,
		log_json = config.logging.json,
		policy_configured = config.policy.path.is_some(),
		"Warden configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &WardenConfig) -> Result<(), ConfigError> {
	let rules = &config.rules;
	let names = [
		("rules.sort_input_name", Some(&rules.sort_input_name)),
		("rules.filter_input_name", Some(&rules.filter_input_name)),
		(
			"rules.pagination_input_name",
			rules.pagination_input_name.as_ref(),
		),
	];
	for (key, name) in names {
		if name.is_some_and(|n| n.trim().is_empty()) {
			return Err(ConfigError::InvalidValue {
				key: key.to_string(),
				message: "must not be empty".to_string(),
			});
		}
	}
	if rules.sort_input_name == rules.filter_input_name
		|| rules.pagination_input_name.as_ref() == Some(&rules.sort_input_name)
		|| rules.pagination_input_name.as_ref() == Some(&rules.filter_input_name)
	{
		return Err(ConfigError::Validation(
			"sort, filter and pagination input names must be distinct".to_string(),
		));
	}

	EnvFilter::try_new(&config.logging.level).map_err(|e| ConfigError::InvalidValue {
		key: "logging.level".to_string(),
		message: e.to_string(),
	})?;

	Ok(())
}
