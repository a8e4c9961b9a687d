// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Defaults applied to every rule descriptor.

use serde::{Deserialize, Serialize};
use warden_rules::{RuleOptions, DEFAULT_FILTER_INPUT, DEFAULT_SORT_INPUT};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RulesConfigLayer {
	pub strict_by_default: Option<bool>,
	pub sort_input_name: Option<String>,
	pub filter_input_name: Option<String>,
	pub pagination_input_name: Option<String>,
}

impl RulesConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.strict_by_default.is_some() {
			self.strict_by_default = other.strict_by_default;
		}
		if other.sort_input_name.is_some() {
			self.sort_input_name = other.sort_input_name;
		}
		if other.filter_input_name.is_some() {
			self.filter_input_name = other.filter_input_name;
		}
		if other.pagination_input_name.is_some() {
			self.pagination_input_name = other.pagination_input_name;
		}
	}

	pub fn finalize(self) -> RulesConfig {
		RulesConfig {
			strict_by_default: self.strict_by_default.unwrap_or(false),
			sort_input_name: self
				.sort_input_name
				.unwrap_or_else(|| DEFAULT_SORT_INPUT.to_string()),
			filter_input_name: self
				.filter_input_name
				.unwrap_or_else(|| DEFAULT_FILTER_INPUT.to_string()),
			pagination_input_name: self.pagination_input_name,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RulesConfig {
	pub strict_by_default: bool,
	pub sort_input_name: String,
	pub filter_input_name: String,
	/// `None` reads pagination from the top-level arguments.
	pub pagination_input_name: Option<String>,
}

impl Default for RulesConfig {
	fn default() -> Self {
		RulesConfigLayer::default().finalize()
	}
}

impl RulesConfig {
	/// Options for a new rule descriptor.
	pub fn rule_options(&self) -> RuleOptions {
		RuleOptions {
			strict: self.strict_by_default,
			sort_input_name: self.sort_input_name.clone(),
			filter_input_name: self.filter_input_name.clone(),
			pagination_input_name: self.pagination_input_name.clone(),
			..RuleOptions::default()
		}
	}
}

impl From<&RulesConfig> for RuleOptions {
	fn from(config: &RulesConfig) -> Self {
		config.rule_options()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_match_rule_options() {
		assert_eq!(RulesConfig::default().rule_options(), RuleOptions::default());
	}

	#[test]
	fn test_custom_names_flow_into_options() {
		let config = RulesConfigLayer {
			strict_by_default: Some(true),
			sort_input_name: Some("sort".to_string()),
			filter_input_name: None,
			pagination_input_name: Some("page".to_string()),
		}
		.finalize();
		let options = RuleOptions::from(&config);
		assert!(options.strict);
		assert_eq!(options.sort_input_name, "sort");
		assert_eq!(options.filter_input_name, "where");
		assert_eq!(options.pagination_input_name.as_deref(), Some("page"));
		assert!(!options.defer);
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let layer: RulesConfigLayer = toml::from_str("strict_by_default = true").unwrap();
		assert_eq!(layer.strict_by_default, Some(true));
		assert!(layer.sort_input_name.is_none());
	}
}
