// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Actions and subject patterns named by grants.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Operations a grant can permit or forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Create,
	Read,
	Update,
	Delete,
	Sort,
	Filter,
	/// Wildcard: a `Manage` grant matches every requested action.
	Manage,
}

impl Action {
	/// Returns all actions.
	pub fn all() -> &'static [Action] {
		&[
			Action::Create,
			Action::Read,
			Action::Update,
			Action::Delete,
			Action::Sort,
			Action::Filter,
			Action::Manage,
		]
	}

	/// Returns true if a grant for `self` covers a request for `requested`.
	pub fn covers(&self, requested: Action) -> bool {
		*self == Action::Manage || *self == requested
	}

	/// Sort and Filter grants are decided on type and field only.
	pub fn ignores_instance(&self) -> bool {
		matches!(self, Action::Sort | Action::Filter)
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Action::Create => write!(f, "create"),
			Action::Read => write!(f, "read"),
			Action::Update => write!(f, "update"),
			Action::Delete => write!(f, "delete"),
			Action::Sort => write!(f, "sort"),
			Action::Filter => write!(f, "filter"),
			Action::Manage => write!(f, "manage"),
		}
	}
}

/// The keyword matching every subject type.
pub const ALL_SUBJECTS: &str = "all";

/// Subject types a grant applies to.
///
/// Serialized as a plain string: `"all"` or the subject type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectPattern {
	All,
	Named(String),
}

impl SubjectPattern {
	pub fn named(subject_type: impl Into<String>) -> Self {
		let subject_type = subject_type.into();
		if subject_type == ALL_SUBJECTS {
			SubjectPattern::All
		} else {
			SubjectPattern::Named(subject_type)
		}
	}

	pub fn matches(&self, subject_type: &str) -> bool {
		match self {
			SubjectPattern::All => true,
			SubjectPattern::Named(name) => name == subject_type,
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			SubjectPattern::All => ALL_SUBJECTS,
			SubjectPattern::Named(name) => name,
		}
	}
}

impl From<&str> for SubjectPattern {
	fn from(value: &str) -> Self {
		SubjectPattern::named(value)
	}
}

impl From<String> for SubjectPattern {
	fn from(value: String) -> Self {
		SubjectPattern::named(value)
	}
}

impl fmt::Display for SubjectPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for SubjectPattern {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for SubjectPattern {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Ok(SubjectPattern::named(raw))
	}
}
