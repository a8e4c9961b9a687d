// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use warden_ability::Action;

use super::{require, RuleHandler};
use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::Result;

/// Counts instances. Counts expose no field data, so only the type-level
/// read check applies, regardless of `defer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountHandler;

impl RuleHandler for CountHandler {
	fn kind(&self) -> RuleKind {
		RuleKind::Count
	}

	fn pre_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		_input: &RuleInput,
	) -> Result<()> {
		let decision = ctx
			.abilities()
			.check(Action::Read, &rule.subject_type, None, None);
		require(ctx, decision, Denial::before_producer);
		Ok(())
	}

	fn post_check(
		&self,
		ctx: &OperationContext,
		_rule: &RuleDescriptor,
		_input: &RuleInput,
		produced: Value,
	) -> Result<Option<Value>> {
		ctx.allow();
		Ok(Some(produced))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handlers::test_support::context;
	use serde_json::json;
	use warden_ability::Grant;

	#[test]
	fn count_ignores_field_restrictions() {
		let ctx = context(vec![
			Grant::allow(Action::Read, "Post"),
			Grant::forbid(Action::Read, "Post").on_fields(["secret"]),
		]);
		let rule = RuleDescriptor::new(RuleKind::Count, "Post");
		CountHandler.pre_check(&ctx, &rule, &RuleInput::new()).unwrap();
		let result = CountHandler
			.post_check(&ctx, &rule, &RuleInput::new(), json!(2))
			.unwrap();
		assert_eq!(result, Some(json!(2)));
	}

	#[test]
	fn deferred_count_still_checks_read() {
		let ctx = context(vec![]);
		let rule = RuleDescriptor::new(RuleKind::Count, "Post").deferred();
		CountHandler.pre_check(&ctx, &rule, &RuleInput::new()).unwrap();
		assert!(ctx.is_denied());
	}
}
