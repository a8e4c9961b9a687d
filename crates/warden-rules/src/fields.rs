// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Which fields of a subject must be authorized.
//!
//! Transports that know the requested selection up front use
//! [`SelectionSet`], which allows field checks before the producer runs.
//! Transports that don't use [`ResultKeys`], which derives the fields from the
//! produced value's own keys; nothing can be checked before data exists.

use serde_json::Value;
use std::fmt::Debug;

/// Strategy for discovering the fields an operation exposes.
pub trait FieldRequirementResolver: Send + Sync + Debug {
	/// Fields known before the producer runs, minus `exclude`; `None` when
	/// the field set depends on the result.
	fn before(&self, exclude: &[String]) -> Option<Vec<String>>;

	/// Fields to authorize on a produced instance, minus `exclude`.
	fn after(&self, instance: &Value, exclude: &[String]) -> Vec<String>;
}

/// A selection known before the operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
	fields: Vec<String>,
}

impl SelectionSet {
	/// Duplicates are dropped; first occurrence order is kept.
	pub fn new<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut unique: Vec<String> = Vec::new();
		for field in fields {
			let field = field.into();
			if !unique.contains(&field) {
				unique.push(field);
			}
		}
		Self { fields: unique }
	}

	pub fn fields(&self) -> &[String] {
		&self.fields
	}

	fn without(&self, exclude: &[String]) -> Vec<String> {
		self
			.fields
			.iter()
			.filter(|f| !exclude.contains(f))
			.cloned()
			.collect()
	}
}

impl FieldRequirementResolver for SelectionSet {
	fn before(&self, exclude: &[String]) -> Option<Vec<String>> {
		Some(self.without(exclude))
	}

	fn after(&self, _instance: &Value, exclude: &[String]) -> Vec<String> {
		self.without(exclude)
	}
}

/// Fields discovered from the produced value's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultKeys;

impl FieldRequirementResolver for ResultKeys {
	fn before(&self, _exclude: &[String]) -> Option<Vec<String>> {
		None
	}

	fn after(&self, instance: &Value, exclude: &[String]) -> Vec<String> {
		match instance {
			Value::Object(map) => map
				.keys()
				.filter(|k| !exclude.contains(k))
				.cloned()
				.collect(),
			_ => Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn exclude(fields: &[&str]) -> Vec<String> {
		fields.iter().map(|f| f.to_string()).collect()
	}

	#[test]
	fn selection_is_known_before_the_producer() {
		let selection = SelectionSet::new(["id", "title", "secret"]);
		assert_eq!(
			selection.before(&exclude(&["secret"])),
			Some(vec!["id".to_string(), "title".to_string()])
		);
	}

	#[test]
	fn selection_ignores_result_shape() {
		let selection = SelectionSet::new(["id", "title"]);
		let fields = selection.after(&json!({ "id": 1, "other": 2 }), &[]);
		assert_eq!(fields, vec!["id".to_string(), "title".to_string()]);
	}

	#[test]
	fn selection_drops_duplicates() {
		let selection = SelectionSet::new(["id", "id", "title"]);
		assert_eq!(selection.fields(), ["id".to_string(), "title".to_string()]);
	}

	#[test]
	fn result_keys_are_unknown_before_the_producer() {
		assert_eq!(ResultKeys.before(&[]), None);
	}

	#[test]
	fn result_keys_follow_the_instance() {
		let fields = ResultKeys.after(
			&json!({ "id": 1, "secret": "x", "internal": true }),
			&exclude(&["internal"]),
		);
		assert_eq!(fields, vec!["id".to_string(), "secret".to_string()]);
	}

	#[test]
	fn result_keys_of_scalar_are_empty() {
		assert!(ResultKeys.after(&json!(42), &[]).is_empty());
	}
}
