// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-operation rule handlers.
//!
//! Each handler contributes two steps to the dispatcher's state machine:
//!
//! ```text
//! Init ──pre_check──▶ PreChecked ──producer──▶ ProducerInvoked ──post_check──▶ PostChecked ──▶ Done
//!   │                                                │
//!   └────────────── any failed check ───────────────┴──▶ Denied (absorbing)
//! ```
//!
//! Handlers never return errors for denials; they record a [`Denial`] on the
//! context and the dispatcher short-circuits.

mod count;
mod create;
mod delete;
mod read_many;
mod read_one;
mod update;

pub use count::CountHandler;
pub use create::CreateHandler;
pub use delete::DeleteHandler;
pub use read_many::ReadManyHandler;
pub use read_one::ReadOneHandler;
pub use update::UpdateHandler;

use serde_json::Value;
use tracing::{debug, trace};
use warden_ability::{Action, Decision};

use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::{json_kind, Result, RuleError};

/// Strategy for one operation type.
pub trait RuleHandler: Send + Sync {
	fn kind(&self) -> RuleKind;

	/// Checks that run before the producer. Failures are recorded on `ctx`.
	fn pre_check(&self, ctx: &OperationContext, rule: &RuleDescriptor, input: &RuleInput)
		-> Result<()>;

	/// Checks against the produced value; returns the value to hand back.
	fn post_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		input: &RuleInput,
		produced: Value,
	) -> Result<Option<Value>>;
}

/// Records `decision` as a denial when it is one; returns whether it allowed.
pub(crate) fn require(
	ctx: &OperationContext,
	decision: Decision,
	denial: fn(Option<String>) -> Denial,
) -> bool {
	match decision {
		Decision::Allowed => true,
		Decision::Denied { reason } => {
			ctx.deny(denial(reason));
			false
		}
	}
}

/// Field-level read checks that can run before the producer.
///
/// Strict rules only, and only when the resolver knows the selection.
/// Non-strict rules redact unreadable fields after the producer runs.
pub(crate) fn pre_check_read_fields(ctx: &OperationContext, rule: &RuleDescriptor) {
	if rule.options.defer || !rule.options.strict {
		return;
	}
	let Some(fields) = ctx.resolver().before(&rule.options.exclude_fields) else {
		return;
	};
	for field in &fields {
		let decision = ctx.abilities().check(
			Action::Read,
			&rule.subject_type,
			None,
			Some(field.as_str()),
		);
		if !decision.is_allowed() {
			debug!(subject_type = %rule.subject_type, %field, "strict field pre-check failed");
			require(ctx, decision, Denial::before_producer);
			return;
		}
	}
}

/// Read authorization of one produced instance, in place.
///
/// Instance-level failure denies. Field-level failure denies under `strict`
/// and otherwise redacts the field to `null`.
pub(crate) fn authorize_instance(
	ctx: &OperationContext,
	rule: &RuleDescriptor,
	instance: &mut Value,
	denial: fn(Option<String>) -> Denial,
) -> bool {
	let abilities = ctx.abilities();
	let subject_type = rule.subject_type.as_str();

	let decision = abilities.check(Action::Read, subject_type, Some(&*instance), None);
	if !require(ctx, decision, denial) {
		debug!(subject_type, "instance not readable");
		return false;
	}

	let fields = ctx.resolver().after(instance, &rule.options.exclude_fields);
	let mut redacted = Vec::new();
	for field in fields {
		let decision = abilities.check(
			Action::Read,
			subject_type,
			Some(&*instance),
			Some(field.as_str()),
		);
		if decision.is_allowed() {
			continue;
		}
		if rule.options.strict {
			debug!(subject_type, %field, "strict field check failed");
			return require(ctx, decision, denial);
		}
		redacted.push(field);
	}

	for field in &redacted {
		redact(instance, field);
	}
	if !redacted.is_empty() {
		trace!(subject_type, redacted = redacted.len(), "redacted fields");
	}
	true
}

/// The single-instance read pipeline shared by ReadOne and the write handlers.
pub(crate) fn read_post_check(
	ctx: &OperationContext,
	rule: &RuleDescriptor,
	mut produced: Value,
	denial: fn(Option<String>) -> Denial,
) -> Option<Value> {
	if produced.is_null() {
		ctx.allow();
		return None;
	}
	if !authorize_instance(ctx, rule, &mut produced, denial) {
		return None;
	}
	ctx.allow();
	Some(produced)
}

/// Replaces the value at a dotted path with `null` if it is present.
pub(crate) fn redact(instance: &mut Value, field: &str) {
	let mut segments = field.split('.').peekable();
	let mut current = instance;
	while let Some(segment) = segments.next() {
		let Value::Object(map) = current else {
			return;
		};
		let Some(next) = map.get_mut(segment) else {
			return;
		};
		if segments.peek().is_none() {
			*next = Value::Null;
			return;
		}
		current = next;
	}
}

/// Keys of an object-valued write payload.
pub(crate) fn payload_fields(rule: &RuleDescriptor, data: Option<&Value>) -> Result<Vec<String>> {
	match data {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(Value::Object(map)) => Ok(map.keys().cloned().collect()),
		Some(other) => Err(RuleError::invalid_argument(
			"data",
			format!("{} payload must be an object, got {}", rule.kind, json_kind(other)),
		)),
	}
}

#[cfg(test)]
pub(crate) mod test_support {
	use warden_ability::{AbilitySet, Actor, Grant};

	use crate::context::OperationContext;
	use crate::fields::FieldRequirementResolver;

	pub fn context(grants: Vec<Grant>) -> OperationContext {
		OperationContext::new(Actor::new("u1"), AbilitySet::new(grants))
	}

	pub fn context_with(
		grants: Vec<Grant>,
		resolver: impl FieldRequirementResolver + 'static,
	) -> OperationContext {
		context(grants).with_resolver(resolver)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn redact_top_level_field() {
		let mut value = json!({ "id": 1, "secret": "x" });
		redact(&mut value, "secret");
		assert_eq!(value, json!({ "id": 1, "secret": null }));
	}

	#[test]
	fn redact_nested_field() {
		let mut value = json!({ "address": { "city": "Paris", "zip": "75001" } });
		redact(&mut value, "address.zip");
		assert_eq!(value, json!({ "address": { "city": "Paris", "zip": null } }));
	}

	#[test]
	fn redact_missing_field_leaves_value_untouched() {
		let mut value = json!({ "id": 1 });
		redact(&mut value, "secret");
		redact(&mut value, "id.inner");
		assert_eq!(value, json!({ "id": 1 }));
	}

	#[test]
	fn payload_fields_require_object() {
		let rule = RuleDescriptor::new(RuleKind::Create, "Post");
		assert_eq!(
			payload_fields(&rule, Some(&json!({ "title": "t", "body": "b" }))).unwrap(),
			vec!["body".to_string(), "title".to_string()]
		);
		assert!(payload_fields(&rule, None).unwrap().is_empty());
		assert!(payload_fields(&rule, Some(&json!([1]))).is_err());
	}
}
