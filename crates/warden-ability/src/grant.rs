// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grants, actors and group memberships.
//!
//! A [`Grant`] is one declarative rule: an action on a subject pattern,
//! optionally restricted to fields and to instances satisfying a
//! [`Condition`]. Inverted grants forbid instead of permit and may carry a
//! `reason` that is surfaced to the caller on denial.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::action::{Action, SubjectPattern};
use crate::condition::{lookup, Condition};

/// One permission rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
	pub action: Action,
	pub subject: SubjectPattern,
	/// `None` covers every field.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fields: Option<BTreeSet<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub conditions: Option<Condition>,
	#[serde(default)]
	pub inverted: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

impl Grant {
	/// Permits `action` on `subject`.
	pub fn allow(action: Action, subject: impl Into<SubjectPattern>) -> Self {
		Self {
			action,
			subject: subject.into(),
			fields: None,
			conditions: None,
			inverted: false,
			reason: None,
		}
	}

	/// Forbids `action` on `subject`.
	pub fn forbid(action: Action, subject: impl Into<SubjectPattern>) -> Self {
		Self {
			inverted: true,
			..Self::allow(action, subject)
		}
	}

	/// Builder: restrict to the given fields.
	pub fn on_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	/// Builder: restrict to instances matching `condition`.
	pub fn when(mut self, condition: Condition) -> Self {
		self.conditions = Some(condition);
		self
	}

	/// Builder: attach a denial reason.
	pub fn because(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	/// Returns true if the grant names this action and subject type.
	pub fn applies_to(&self, action: Action, subject_type: &str) -> bool {
		self.action.covers(action) && self.subject.matches(subject_type)
	}

	/// Field matching.
	///
	/// Without a queried field, a field-restricted grant matches only if it
	/// permits: partial access to a type is still access to the type, but a
	/// partial prohibition is not a prohibition of the whole type.
	pub fn matches_field(&self, field: Option<&str>) -> bool {
		let Some(fields) = &self.fields else {
			return true;
		};
		let Some(field) = field else {
			return !self.inverted;
		};
		fields.iter().any(|pattern| field_matches(pattern, field))
	}

	/// Condition matching.
	///
	/// Without an instance the question is whether *some* instance could be
	/// allowed, so conditional permits match and conditional prohibitions do not.
	pub fn matches_instance(&self, instance: Option<&Value>) -> bool {
		let Some(condition) = &self.conditions else {
			return true;
		};
		match instance {
			Some(instance) => condition.evaluate(instance),
			None => !self.inverted,
		}
	}
}

/// `address.*` matches `address` and every field below it.
fn field_matches(pattern: &str, field: &str) -> bool {
	match pattern.strip_suffix(".*") {
		Some(prefix) => {
			field == prefix
				|| field
					.strip_prefix(prefix)
					.is_some_and(|rest| rest.starts_with('.'))
		}
		None => pattern == field,
	}
}

/// The authenticated caller whose grants are evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
	id: String,
	properties: Value,
}

impl Actor {
	pub fn new(id: impl Into<String>) -> Self {
		let id = id.into();
		let mut properties = Map::new();
		properties.insert("id".to_string(), Value::String(id.clone()));
		Self {
			id,
			properties: Value::Object(properties),
		}
	}

	/// Builder: add a property usable by `Operand::Actor` references.
	pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
		if let Value::Object(map) = &mut self.properties {
			map.insert(key.into(), value);
		}
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	/// Resolves a dotted path against the actor's properties (`id` included).
	pub fn attribute(&self, path: &str) -> Option<&Value> {
		lookup(&self.properties, path)
	}
}

/// The grants contributed by one group the actor belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupGrants {
	pub group: String,
	#[serde(default)]
	pub grants: Vec<Grant>,
}

impl GroupGrants {
	pub fn new(group: impl Into<String>, grants: Vec<Grant>) -> Self {
		Self {
			group: group.into(),
			grants,
		}
	}
}
