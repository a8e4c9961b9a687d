// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use warden_ability::Action;

use super::{payload_fields, read_post_check, require, RuleHandler};
use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::Result;

/// Creates an instance from the write payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateHandler;

impl RuleHandler for CreateHandler {
	fn kind(&self) -> RuleKind {
		RuleKind::Create
	}

	fn pre_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		input: &RuleInput,
	) -> Result<()> {
		let fields = payload_fields(rule, input.data.as_ref())?;
		let abilities = ctx.abilities();
		let subject_type = rule.subject_type.as_str();

		if !require(
			ctx,
			abilities.check(Action::Create, subject_type, None, None),
			Denial::before_producer,
		) {
			return Ok(());
		}
		for field in &fields {
			let decision =
				abilities.check(Action::Create, subject_type, None, Some(field.as_str()));
			if !require(ctx, decision, Denial::before_producer) {
				break;
			}
		}
		Ok(())
	}

	/// The write has been applied; a denial here asks for a rollback.
	fn post_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		_input: &RuleInput,
		produced: Value,
	) -> Result<Option<Value>> {
		Ok(read_post_check(ctx, rule, produced, Denial::after_commit))
	}
}
