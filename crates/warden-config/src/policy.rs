// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grant documents.
//!
//! A policy document lists groups and the grants each contributes, in
//! evaluation order:
//!
//! ```text
//! [[groups]]
//! group = "editors"
//!
//! [[groups.grants]]
//! action = "update"
//! subject = "Post"
//! fields = ["title", "body"]
//! conditions = { op = "equals", field = "author_id", value = { actor = "id" } }
//!
//! [[groups.grants]]
//! action = "read"
//! subject = "Post"
//! fields = ["secret"]
//! inverted = true
//! reason = "internal notes"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use warden_ability::GroupGrants;

use crate::error::ConfigError;

#[derive(Debug, Default, Deserialize)]
struct PolicyDocument {
	#[serde(default)]
	groups: Vec<GroupGrants>,
}

/// Reads and validates a policy document.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_policy(path: impl AsRef<Path>) -> Result<Vec<GroupGrants>, ConfigError> {
	let path = path.as_ref();
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
		path: path.to_path_buf(),
		source: e,
	})?;
	parse_policy(&content, path)
}

/// Parses a policy document; `origin` is only used in error messages.
pub fn parse_policy(content: &str, origin: &Path) -> Result<Vec<GroupGrants>, ConfigError> {
	let document: PolicyDocument = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
		path: origin.to_path_buf(),
		source: e,
	})?;

	let mut seen = HashSet::new();
	for group in &document.groups {
		if group.group.trim().is_empty() {
			return Err(policy_error(origin, "group name must not be empty"));
		}
		if !seen.insert(group.group.as_str()) {
			return Err(policy_error(
				origin,
				format!("group '{}' is defined more than once", group.group),
			));
		}
		if let Some(index) = group
			.grants
			.iter()
			.position(|g| g.fields.as_ref().is_some_and(|f| f.is_empty()))
		{
			return Err(policy_error(
				origin,
				format!(
					"grant {index} of group '{}' has an empty field list",
					group.group
				),
			));
		}
	}

	debug!(
		groups = document.groups.len(),
		grants = document.groups.iter().map(|g| g.grants.len()).sum::<usize>(),
		"policy loaded"
	);
	Ok(document.groups)
}

fn policy_error(path: &Path, message: impl Into<String>) -> ConfigError {
	ConfigError::Policy {
		path: PathBuf::from(path),
		message: message.into(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;
	use warden_ability::{AbilitySet, Action, Actor};

	const EDITORS: &str = r#"
[[groups]]
group = "readers"

[[groups.grants]]
action = "read"
subject = "Post"

[[groups.grants]]
action = "read"
subject = "Post"
fields = ["secret"]
inverted = true
reason = "internal notes"

[[groups]]
group = "editors"

[[groups.grants]]
action = "update"
subject = "Post"
fields = ["title"]
conditions = { op = "equals", field = "author_id", value = { actor = "id" } }
"#;

	fn origin() -> &'static Path {
		Path::new("policy.toml")
	}

	#[test]
	fn parses_groups_in_order() {
		let groups = parse_policy(EDITORS, origin()).unwrap();
		let names: Vec<_> = groups.iter().map(|g| g.group.as_str()).collect();
		assert_eq!(names, ["readers", "editors"]);
		assert_eq!(groups[0].grants.len(), 2);
		assert!(groups[0].grants[1].inverted);
	}

	#[test]
	fn parsed_grants_compile_for_actor() {
		let groups = parse_policy(EDITORS, origin()).unwrap();
		let abilities = AbilitySet::compile(&Actor::new("u1"), &groups).unwrap();

		let own = serde_json::json!({ "id": 1, "author_id": "u1" });
		let other = serde_json::json!({ "id": 2, "author_id": "u2" });
		assert!(abilities.can(Action::Update, "Post", Some(&own), Some("title")));
		assert!(abilities.cannot(Action::Update, "Post", Some(&other), Some("title")));
		assert_eq!(
			abilities
				.check(Action::Read, "Post", Some(&own), Some("secret"))
				.reason(),
			Some("internal notes")
		);
	}

	#[test]
	fn empty_document_has_no_groups() {
		assert!(parse_policy("", origin()).unwrap().is_empty());
	}

	#[test]
	fn duplicate_groups_are_rejected() {
		let doc = "[[groups]]\ngroup = \"a\"\n[[groups]]\ngroup = \"a\"\n";
		assert!(matches!(
			parse_policy(doc, origin()),
			Err(ConfigError::Policy { .. })
		));
	}

	#[test]
	fn empty_field_list_is_rejected() {
		let doc = r#"
[[groups]]
group = "a"

[[groups.grants]]
action = "read"
subject = "Post"
fields = []
"#;
		let err = parse_policy(doc, origin()).unwrap_err();
		assert!(err.to_string().contains("empty field list"));
	}

	#[test]
	fn unknown_action_is_a_parse_error() {
		let doc = r#"
[[groups]]
group = "a"

[[groups.grants]]
action = "publish"
subject = "Post"
"#;
		assert!(matches!(
			parse_policy(doc, origin()),
			Err(ConfigError::TomlParse { .. })
		));
	}

	#[test]
	fn load_policy_reads_file() {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(EDITORS.as_bytes()).unwrap();
		assert_eq!(load_policy(file.path()).unwrap().len(), 2);
	}

	#[test]
	fn load_policy_missing_file_is_error() {
		assert!(matches!(
			load_policy("/nonexistent/policy.toml"),
			Err(ConfigError::FileRead { .. })
		));
	}
}
