// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use warden_ability::Action;

use super::{payload_fields, read_post_check, require, RuleHandler};
use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::{Result, RuleError};

/// Applies a write payload to an existing instance.
///
/// Writability is checked against the pre-mutation instance supplied in
/// [`RuleInput::current`], which is required. Readability of the changed
/// fields is not checked before the write; the post-mutation state goes
/// through the read pipeline and a denial there asks for a rollback.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateHandler;

impl RuleHandler for UpdateHandler {
	fn kind(&self) -> RuleKind {
		RuleKind::Update
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
		let current = match input.current.as_ref() {
			Some(current) if !current.is_null() => current,
			_ => {
				return Err(RuleError::invalid_argument(
					"current",
					"update requires the pre-mutation instance",
				))
			}
		};

		if !require(
			ctx,
			abilities.check(Action::Update, subject_type, Some(current), None),
			Denial::before_producer,
		) {
			return Ok(());
		}
		for field in &fields {
			let decision =
				abilities.check(Action::Update, subject_type, Some(current), Some(field.as_str()));
			if !require(ctx, decision, Denial::before_producer) {
				break;
			}
		}
		Ok(())
	}

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
