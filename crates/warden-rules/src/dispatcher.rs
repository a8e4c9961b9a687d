// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Drives a rule handler around a producer callback.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{instrument, trace};

use crate::context::{OperationContext, Stage};
use crate::descriptor::{RuleDescriptor, RuleInput, RuleKind};
use crate::error::{Result, RuleError};
use crate::handlers::{
	CountHandler, CreateHandler, DeleteHandler, ReadManyHandler, ReadOneHandler, RuleHandler,
	UpdateHandler,
};

/// Routes each rule to the handler registered for its kind.
#[derive(Clone)]
pub struct RuleDispatcher {
	handlers: HashMap<RuleKind, Arc<dyn RuleHandler>>,
}

impl std::fmt::Debug for RuleDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut kinds: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
		kinds.sort();
		f.debug_struct("RuleDispatcher").field("handlers", &kinds).finish()
	}
}

impl Default for RuleDispatcher {
	fn default() -> Self {
		let mut dispatcher = Self::empty();
		dispatcher.insert(Arc::new(ReadOneHandler));
		dispatcher.insert(Arc::new(ReadManyHandler));
		dispatcher.insert(Arc::new(CreateHandler));
		dispatcher.insert(Arc::new(UpdateHandler));
		dispatcher.insert(Arc::new(DeleteHandler));
		dispatcher.insert(Arc::new(CountHandler));
		dispatcher
	}
}

impl RuleDispatcher {
	/// A dispatcher with the built-in handlers.
	pub fn new() -> Self {
		Self::default()
	}

	/// A dispatcher with no handlers at all.
	pub fn empty() -> Self {
		Self {
			handlers: HashMap::new(),
		}
	}

	/// Replaces the handler for a built-in rule kind.
	pub fn register(&mut self, handler: impl RuleHandler + 'static) -> Result<()> {
		if let RuleKind::Custom(name) = handler.kind() {
			return Err(RuleError::UnsupportedRule(name));
		}
		self.insert(Arc::new(handler));
		Ok(())
	}

	pub fn handler(&self, kind: &RuleKind) -> Option<&dyn RuleHandler> {
		self.handlers.get(kind).map(AsRef::as_ref)
	}

	fn insert(&mut self, handler: Arc<dyn RuleHandler>) {
		self.handlers.insert(handler.kind(), handler);
	}

	/// Runs `rule` around `producer`.
	///
	/// Returns `Ok(None)` when the operation was denied (see
	/// [`OperationContext::verdict`]) or produced nothing. The producer is
	/// never invoked once a pre-check has failed, and its errors are returned
	/// unchanged. A write whose producer leaves the call tree denied flags it
	/// for rollback.
	#[instrument(
		skip_all,
		fields(rule = %rule.kind, subject_type = %rule.subject_type)
	)]
	pub async fn dispatch<F, Fut, E>(
		&self,
		ctx: &OperationContext,
		rule: &RuleDescriptor,
		input: &RuleInput,
		producer: F,
	) -> std::result::Result<Option<Value>, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = std::result::Result<Value, E>>,
		E: From<RuleError>,
	{
		if let RuleKind::Custom(name) = &rule.kind {
			return Err(RuleError::UnsupportedRule(name.clone()).into());
		}
		let handler = self
			.handlers
			.get(&rule.kind)
			.ok_or_else(|| RuleError::MissingHandler(rule.kind.clone()))?;

		if ctx.is_denied() {
			trace!(stage = ?Stage::Denied, "already denied, skipping");
			return Ok(None);
		}

		handler.pre_check(ctx, rule, input)?;
		if ctx.is_denied() {
			trace!(stage = ?Stage::Denied, "pre-check denied");
			return Ok(None);
		}
		trace!(stage = ?Stage::PreChecked, "invoking producer");

		let produced = producer().await?;
		trace!(stage = ?Stage::ProducerInvoked, "producer returned");

		if ctx.is_denied() {
			if rule.kind.is_mutation() {
				ctx.mark_rollback();
			}
			trace!(stage = ?Stage::Denied, "denied during producer");
			return Ok(None);
		}

		let result = handler.post_check(ctx, rule, input, produced)?;
		if ctx.is_denied() {
			trace!(stage = ?Stage::Denied, "post-check denied");
			return Ok(None);
		}
		trace!(stage = ?Stage::PostChecked, returned = result.is_some(), "done");
		Ok(result)
	}
}
