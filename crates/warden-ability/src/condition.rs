// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Instance conditions attached to grants.
//!
//! A [`Condition`] is a small predicate tree evaluated against an instance's
//! properties (a JSON object). Leaves compare a dotted field path against an
//! [`Operand`]:
//!
//! ```text
//! And ─┬─ Equals  author.id  == actor.id
//!      └─ Not ── In  status  ∈ ["archived", "deleted"]
//! ```
//!
//! Operands naming the actor (`Operand::Actor`) are substituted when the
//! ability set is compiled, so evaluation itself never fails: a missing path
//! compares as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::AbilityError;
use crate::grant::Actor;

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
	/// A literal JSON value.
	Value(Value),
	/// Another field of the same instance.
	Field(String),
	/// An attribute of the actor, resolved at compile time.
	Actor(String),
}

impl Operand {
	fn resolve<'a>(&'a self, instance: &'a Value) -> &'a Value {
		match self {
			Operand::Value(value) => value,
			Operand::Field(path) => lookup(instance, path).unwrap_or(&Value::Null),
			Operand::Actor(_) => &Value::Null,
		}
	}

	fn bind_actor(self, actor: &Actor) -> Result<Operand, AbilityError> {
		match self {
			Operand::Actor(path) => actor
				.attribute(&path)
				.cloned()
				.map(Operand::Value)
				.ok_or(AbilityError::UnresolvedActorReference { path }),
			other => Ok(other),
		}
	}
}

impl From<Value> for Operand {
	fn from(value: Value) -> Self {
		Operand::Value(value)
	}
}

/// Ordering comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
	Ne,
	Gt,
	Gte,
	Lt,
	Lte,
}

/// Predicate over an instance's properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
	Equals { field: String, value: Operand },
	In { field: String, values: Operand },
	Compare { field: String, cmp: CompareOp, value: Operand },
	And { conditions: Vec<Condition> },
	Or { conditions: Vec<Condition> },
	Not { condition: Box<Condition> },
}

impl Condition {
	pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Condition::Equals {
			field: field.into(),
			value: Operand::Value(value.into()),
		}
	}

	/// `field == actor.<path>`, bound when the ability set is compiled.
	pub fn equals_actor(field: impl Into<String>, path: impl Into<String>) -> Self {
		Condition::Equals {
			field: field.into(),
			value: Operand::Actor(path.into()),
		}
	}

	pub fn equals_field(field: impl Into<String>, other: impl Into<String>) -> Self {
		Condition::Equals {
			field: field.into(),
			value: Operand::Field(other.into()),
		}
	}

	pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Condition::In {
			field: field.into(),
			values: Operand::Value(Value::Array(values.into_iter().map(Into::into).collect())),
		}
	}

	pub fn compare(field: impl Into<String>, cmp: CompareOp, value: impl Into<Value>) -> Self {
		Condition::Compare {
			field: field.into(),
			cmp,
			value: Operand::Value(value.into()),
		}
	}

	pub fn and(conditions: Vec<Condition>) -> Self {
		Condition::And { conditions }
	}

	pub fn or(conditions: Vec<Condition>) -> Self {
		Condition::Or { conditions }
	}

	pub fn negate(condition: Condition) -> Self {
		Condition::Not {
			condition: Box::new(condition),
		}
	}

	/// Evaluates the predicate against an instance.
	pub fn evaluate(&self, instance: &Value) -> bool {
		match self {
			Condition::Equals { field, value } => {
				let actual = lookup(instance, field).unwrap_or(&Value::Null);
				matches_value(actual, value.resolve(instance))
			}
			Condition::In { field, values } => {
				let actual = lookup(instance, field).unwrap_or(&Value::Null);
				match values.resolve(instance) {
					Value::Array(candidates) => candidates.iter().any(|c| matches_value(actual, c)),
					_ => false,
				}
			}
			Condition::Compare { field, cmp, value } => {
				let actual = lookup(instance, field).unwrap_or(&Value::Null);
				let expected = value.resolve(instance);
				match cmp {
					CompareOp::Ne => !matches_value(actual, expected),
					CompareOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
					CompareOp::Gte => matches!(
						compare(actual, expected),
						Some(Ordering::Greater | Ordering::Equal)
					),
					CompareOp::Lt => compare(actual, expected) == Some(Ordering::Less),
					CompareOp::Lte => matches!(
						compare(actual, expected),
						Some(Ordering::Less | Ordering::Equal)
					),
				}
			}
			Condition::And { conditions } => conditions.iter().all(|c| c.evaluate(instance)),
			Condition::Or { conditions } => conditions.iter().any(|c| c.evaluate(instance)),
			Condition::Not { condition } => !condition.evaluate(instance),
		}
	}

	/// Replaces every [`Operand::Actor`] with the actor's attribute value.
	pub fn bind_actor(self, actor: &Actor) -> Result<Condition, AbilityError> {
		Ok(match self {
			Condition::Equals { field, value } => Condition::Equals {
				field,
				value: value.bind_actor(actor)?,
			},
			Condition::In { field, values } => Condition::In {
				field,
				values: values.bind_actor(actor)?,
			},
			Condition::Compare { field, cmp, value } => Condition::Compare {
				field,
				cmp,
				value: value.bind_actor(actor)?,
			},
			Condition::And { conditions } => Condition::And {
				conditions: bind_all(conditions, actor)?,
			},
			Condition::Or { conditions } => Condition::Or {
				conditions: bind_all(conditions, actor)?,
			},
			Condition::Not { condition } => Condition::Not {
				condition: Box::new(condition.bind_actor(actor)?),
			},
		})
	}
}

fn bind_all(conditions: Vec<Condition>, actor: &Actor) -> Result<Vec<Condition>, AbilityError> {
	conditions.into_iter().map(|c| c.bind_actor(actor)).collect()
}

/// Resolves a dotted path (`author.id`, `tags.0`) inside a JSON value.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
	path.split('.').try_fold(value, |current, segment| match current {
		Value::Object(map) => map.get(segment),
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	})
}

/// Equality with numeric normalization; an array field matches if any element does.
fn matches_value(actual: &Value, expected: &Value) -> bool {
	if let (Value::Array(items), false) = (actual, expected.is_array()) {
		return items.iter().any(|item| scalar_eq(item, expected));
	}
	scalar_eq(actual, expected)
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
	match (a.as_f64(), b.as_f64()) {
		(Some(x), Some(y)) => x == y,
		_ => a == b,
	}
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
	match (actual, expected) {
		(Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
		(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
		(Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn post() -> Value {
		json!({
			"id": 7,
			"status": "published",
			"score": 4.5,
			"author": { "id": "u1", "team": "red" },
			"reviewer_id": "u1",
			"tags": ["rust", "authz"],
		})
	}

	mod lookup_paths {
		use super::*;

		#[test]
		fn resolves_nested_objects() {
			assert_eq!(lookup(&post(), "author.id"), Some(&json!("u1")));
		}

		#[test]
		fn resolves_array_indices() {
			assert_eq!(lookup(&post(), "tags.1"), Some(&json!("authz")));
		}

		#[test]
		fn missing_segment_is_none() {
			assert_eq!(lookup(&post(), "author.email"), None);
			assert_eq!(lookup(&post(), "status.length"), None);
		}
	}

	mod evaluation {
		use super::*;

		#[test]
		fn equals_on_nested_path() {
			assert!(Condition::equals("author.id", "u1").evaluate(&post()));
			assert!(!Condition::equals("author.id", "u2").evaluate(&post()));
		}

		#[test]
		fn equals_normalizes_numbers() {
			assert!(Condition::equals("id", 7.0).evaluate(&post()));
		}

		#[test]
		fn equals_against_array_field_checks_membership() {
			assert!(Condition::equals("tags", "rust").evaluate(&post()));
			assert!(!Condition::equals("tags", "go").evaluate(&post()));
		}

		#[test]
		fn missing_field_equals_null() {
			assert!(Condition::equals("deleted_at", Value::Null).evaluate(&post()));
		}

		#[test]
		fn in_list() {
			assert!(Condition::one_of("status", ["draft", "published"]).evaluate(&post()));
			assert!(!Condition::one_of("status", ["archived"]).evaluate(&post()));
		}

		#[test]
		fn in_non_array_operand_is_false() {
			let condition = Condition::In {
				field: "status".into(),
				values: Operand::Value(json!("published")),
			};
			assert!(!condition.evaluate(&post()));
		}

		#[test]
		fn ordering_comparisons() {
			assert!(Condition::compare("score", CompareOp::Gt, 4).evaluate(&post()));
			assert!(Condition::compare("score", CompareOp::Lte, 4.5).evaluate(&post()));
			assert!(!Condition::compare("score", CompareOp::Lt, 4.5).evaluate(&post()));
			assert!(Condition::compare("status", CompareOp::Ne, "draft").evaluate(&post()));
		}

		#[test]
		fn ordering_across_types_is_false() {
			assert!(!Condition::compare("status", CompareOp::Gt, 1).evaluate(&post()));
			assert!(!Condition::compare("missing", CompareOp::Lt, 1).evaluate(&post()));
		}

		#[test]
		fn field_reference_compares_two_fields() {
			assert!(Condition::equals_field("reviewer_id", "author.id").evaluate(&post()));
			assert!(!Condition::equals_field("status", "author.id").evaluate(&post()));
		}

		#[test]
		fn boolean_combinators() {
			let published_by_u1 = Condition::and(vec![
				Condition::equals("status", "published"),
				Condition::equals("author.id", "u1"),
			]);
			assert!(published_by_u1.evaluate(&post()));
			assert!(Condition::or(vec![
				Condition::equals("status", "draft"),
				Condition::equals("author.team", "red"),
			])
			.evaluate(&post()));
			assert!(!Condition::negate(published_by_u1).evaluate(&post()));
		}

		#[test]
		fn empty_combinators() {
			assert!(Condition::and(vec![]).evaluate(&post()));
			assert!(!Condition::or(vec![]).evaluate(&post()));
		}
	}

	mod actor_binding {
		use super::*;

		#[test]
		fn binds_actor_attribute() {
			let actor = Actor::new("u1").with_attribute("team", json!("red"));
			let bound = Condition::and(vec![
				Condition::equals_actor("author.id", "id"),
				Condition::equals_actor("author.team", "team"),
			])
			.bind_actor(&actor)
			.unwrap();
			assert!(bound.evaluate(&post()));
		}

		#[test]
		fn unresolved_actor_path_is_an_error() {
			let actor = Actor::new("u1");
			let err = Condition::negate(Condition::equals_actor("org_id", "org.id"))
				.bind_actor(&actor)
				.unwrap_err();
			assert!(matches!(
				err,
				AbilityError::UnresolvedActorReference { ref path } if path == "org.id"
			));
		}

		#[test]
		fn unbound_actor_operand_never_matches_a_value() {
			let condition = Condition::equals_actor("author.id", "id");
			assert!(!condition.evaluate(&post()));
		}
	}

	#[test]
	fn serde_shape_is_tagged() {
		let condition = Condition::and(vec![Condition::equals("status", "published")]);
		let json = serde_json::to_value(&condition).unwrap();
		assert_eq!(
			json,
			json!({
				"op": "and",
				"conditions": [
					{ "op": "equals", "field": "status", "value": { "value": "published" } }
				]
			})
		);
	}
}
