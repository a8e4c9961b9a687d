// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use tracing::debug;
use warden_ability::Action;

use super::{read_post_check, require, RuleHandler};
use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::Result;

/// Deletes an instance. Deletion is all-or-nothing: no field checks before
/// the producer runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteHandler;

impl RuleHandler for DeleteHandler {
	fn kind(&self) -> RuleKind {
		RuleKind::Delete
	}

	fn pre_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		_input: &RuleInput,
	) -> Result<()> {
		let decision = ctx
			.abilities()
			.check(Action::Delete, &rule.subject_type, None, None);
		require(ctx, decision, Denial::before_producer);
		Ok(())
	}

	fn post_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		_input: &RuleInput,
		produced: Value,
	) -> Result<Option<Value>> {
		if produced.is_null() {
			ctx.allow();
			return Ok(None);
		}

		let decision = ctx
			.abilities()
			.check(Action::Delete, &rule.subject_type, Some(&produced), None);
		if !require(ctx, decision, Denial::after_commit) {
			debug!(subject_type = %rule.subject_type, "deleted instance not deletable by actor");
			return Ok(None);
		}

		Ok(read_post_check(ctx, rule, produced, Denial::after_commit))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::Outcome;
	use crate::handlers::test_support::context;
	use serde_json::json;
	use warden_ability::{Condition, Grant};

	fn rule() -> RuleDescriptor {
		RuleDescriptor::new(RuleKind::Delete, "Post")
	}

	fn grants() -> Vec<Grant> {
		vec![
			Grant::allow(Action::Read, "Post"),
			Grant::allow(Action::Delete, "Post").when(Condition::equals("author_id", "u1")),
		]
	}

	#[test]
	fn pre_check_is_type_level() {
		let ctx = context(grants());
		DeleteHandler.pre_check(&ctx, &rule(), &RuleInput::new()).unwrap();
		assert!(!ctx.is_denied());
	}

	#[test]
	fn deleting_someone_elses_instance_requests_rollback() {
		let ctx = context(grants());
		let result = DeleteHandler
			.post_check(&ctx, &rule(), &RuleInput::new(), json!({ "id": 1, "author_id": "u2" }))
			.unwrap();
		assert_eq!(result, None);
		assert!(ctx.is_denied());
		assert!(ctx.requires_rollback());
	}

	#[test]
	fn returns_deleted_instance_through_read_pipeline() {
		let mut grants = grants();
		grants.push(Grant::forbid(Action::Read, "Post").on_fields(["author_id"]));
		let ctx = context(grants);
		let result = DeleteHandler
			.post_check(&ctx, &rule(), &RuleInput::new(), json!({ "id": 1, "author_id": "u1" }))
			.unwrap();
		assert_eq!(result, Some(json!({ "id": 1, "author_id": null })));
		assert_eq!(ctx.outcome(), Outcome::Allowed);
	}
}
