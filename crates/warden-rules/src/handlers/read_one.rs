// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use warden_ability::Action;

use super::{pre_check_read_fields, read_post_check, require, RuleHandler};
use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::Result;

/// Reads a single instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOneHandler;

impl RuleHandler for ReadOneHandler {
	fn kind(&self) -> RuleKind {
		RuleKind::ReadOne
	}

	fn pre_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		_input: &RuleInput,
	) -> Result<()> {
		if !rule.options.defer {
			let decision = ctx
				.abilities()
				.check(Action::Read, &rule.subject_type, None, None);
			if !require(ctx, decision, Denial::before_producer) {
				return Ok(());
			}
		}
		pre_check_read_fields(ctx, rule);
		Ok(())
	}

	fn post_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		_input: &RuleInput,
		produced: Value,
	) -> Result<Option<Value>> {
		Ok(read_post_check(ctx, rule, produced, Denial::after_producer))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::Outcome;
	use crate::fields::SelectionSet;
	use crate::handlers::test_support::{context, context_with};
	use serde_json::json;
	use warden_ability::{Condition, Grant};

	fn rule() -> RuleDescriptor {
		RuleDescriptor::new(RuleKind::ReadOne, "Post")
	}

	#[test]
	fn pre_check_denies_without_read_grant() {
		let ctx = context(vec![Grant::allow(Action::Create, "Post")]);
		ReadOneHandler.pre_check(&ctx, &rule(), &RuleInput::new()).unwrap();
		assert!(ctx.is_denied());
	}

	#[test]
	fn deferred_pre_check_skips_type_level_read() {
		let ctx = context(vec![]);
		ReadOneHandler
			.pre_check(&ctx, &rule().deferred(), &RuleInput::new())
			.unwrap();
		assert!(!ctx.is_denied());
	}

	#[test]
	fn deferred_post_check_still_authorizes_instance() {
		let ctx = context(vec![
			Grant::allow(Action::Read, "Post").when(Condition::equals("published", true))
		]);
		let result = ReadOneHandler
			.post_check(
				&ctx,
				&rule().deferred(),
				&RuleInput::new(),
				json!({ "id": 1, "published": false }),
			)
			.unwrap();
		assert_eq!(result, None);
		assert!(ctx.is_denied());
	}

	#[test]
	fn strict_selection_pre_check_denies_forbidden_field() {
		let ctx = context_with(
			vec![
				Grant::allow(Action::Read, "Post"),
				Grant::forbid(Action::Read, "Post").on_fields(["secret"]),
			],
			SelectionSet::new(["id", "secret"]),
		);
		ReadOneHandler
			.pre_check(&ctx, &rule().strict(true), &RuleInput::new())
			.unwrap();
		assert!(ctx.is_denied());
	}

	#[test]
	fn lenient_selection_pre_check_leaves_forbidden_field_to_redaction() {
		let ctx = context_with(
			vec![
				Grant::allow(Action::Read, "Post"),
				Grant::forbid(Action::Read, "Post").on_fields(["secret"]),
			],
			SelectionSet::new(["id", "secret"]),
		);
		let rule = rule();
		ReadOneHandler
			.pre_check(&ctx, &rule, &RuleInput::new())
			.unwrap();
		assert!(!ctx.is_denied());
		assert_eq!(ctx.outcome(), Outcome::Unknown);

		let result = ReadOneHandler
			.post_check(&ctx, &rule, &RuleInput::new(), json!({ "id": 1, "secret": "x" }))
			.unwrap();
		assert_eq!(result, Some(json!({ "id": 1, "secret": null })));
	}

	#[test]
	fn excluded_fields_are_neither_checked_nor_redacted() {
		let ctx = context(vec![
			Grant::allow(Action::Read, "Post"),
			Grant::forbid(Action::Read, "Post").on_fields(["secret"]),
		]);
		let result = ReadOneHandler
			.post_check(
				&ctx,
				&rule().strict(true).excluding(["secret"]),
				&RuleInput::new(),
				json!({ "id": 1, "secret": "x" }),
			)
			.unwrap();
		assert_eq!(result, Some(json!({ "id": 1, "secret": "x" })));
		assert_eq!(ctx.outcome(), Outcome::Allowed);
	}

	#[test]
	fn null_result_is_allowed() {
		let ctx = context(vec![Grant::allow(Action::Read, "Post")]);
		let result = ReadOneHandler
			.post_check(&ctx, &rule(), &RuleInput::new(), Value::Null)
			.unwrap();
		assert_eq!(result, None);
		assert_eq!(ctx.outcome(), Outcome::Allowed);
	}
}
