// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use tracing::trace;
use warden_ability::Action;

use super::{authorize_instance, pre_check_read_fields, require, RuleHandler};
use crate::context::{Denial, OperationContext};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::{Result, RuleError};
use crate::query::QueryArgs;
use crate::validator::SortFilterPaginationValidator;

/// Reads a list of instances, with ordering, filtering and pagination.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadManyHandler;

impl RuleHandler for ReadManyHandler {
	fn kind(&self) -> RuleKind {
		RuleKind::ReadMany
	}

	fn pre_check(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		input: &RuleInput,
	) -> Result<()> {
		let abilities = ctx.abilities();
		if !rule.options.defer {
			let decision = abilities.check(Action::Read, &rule.subject_type, None, None);
			if !require(ctx, decision, Denial::before_producer) {
				return Ok(());
			}
		}

		let args = QueryArgs::extract(&input.arguments, &rule.options)?;
		let decision = SortFilterPaginationValidator::new(abilities, &rule.subject_type).validate(&args);
		if !require(ctx, decision, Denial::before_producer) {
			return Ok(());
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
		let mut items = match produced {
			Value::Null => {
				ctx.allow();
				return Ok(None);
			}
			Value::Array(items) => items,
			other => return Err(RuleError::unexpected_value(self.kind(), "an array", &other)),
		};

		for item in items.iter_mut() {
			if !authorize_instance(ctx, rule, item, Denial::after_producer) {
				return Ok(None);
			}
		}

		trace!(count = items.len(), "read_many authorized");
		ctx.allow();
		Ok(Some(Value::Array(items)))
	}
}
