// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-operation authorization state.
//!
//! An [`OperationContext`] is created for one top-level operation call and
//! passed by reference to every handler in that call tree. Nested handler
//! invocations use [`OperationContext::nested`], which shares the same denial
//! cell: a denial anywhere is visible everywhere, and once denied the outcome
//! never returns to `Allowed`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use warden_ability::{AbilitySet, Actor};

use crate::error::Forbidden;
use crate::fields::{FieldRequirementResolver, ResultKeys};

/// Authorization outcome of an operation call tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
	#[default]
	Unknown,
	Allowed,
	Denied,
}

/// Handler lifecycle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Init,
	PreChecked,
	Denied,
	ProducerInvoked,
	PostChecked,
	Done,
}

/// The first denial recorded in a call tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
	/// Stage the handler was in when the failing check ran.
	pub stage: Stage,
	pub reason: Option<String>,
	/// The producer already wrote; the transaction owner must roll back.
	pub rollback: bool,
}

impl Denial {
	/// A pre-check failure; the producer never ran.
	pub fn before_producer(reason: Option<String>) -> Self {
		Self {
			stage: Stage::PreChecked,
			reason,
			rollback: false,
		}
	}

	/// A post-check failure after a read.
	pub fn after_producer(reason: Option<String>) -> Self {
		Self {
			stage: Stage::ProducerInvoked,
			reason,
			rollback: false,
		}
	}

	/// A post-check failure after a write that has already been applied.
	pub fn after_commit(reason: Option<String>) -> Self {
		Self {
			stage: Stage::ProducerInvoked,
			reason,
			rollback: true,
		}
	}
}

#[derive(Debug, Default)]
struct CellState {
	outcome: Outcome,
	denial: Option<Denial>,
	/// Set by any post-write denial, not only the first one recorded.
	rollback: bool,
}

#[derive(Debug, Default)]
struct DenialCell {
	state: Mutex<CellState>,
}

impl DenialCell {
	fn lock(&self) -> MutexGuard<'_, CellState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

/// Actor, abilities and the shared denial cell for one operation.
#[derive(Clone)]
pub struct OperationContext {
	actor: Arc<Actor>,
	abilities: AbilitySet,
	resolver: Arc<dyn FieldRequirementResolver>,
	cell: Arc<DenialCell>,
}

impl fmt::Debug for OperationContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OperationContext")
			.field("actor", &self.actor.id())
			.field("grants", &self.abilities.grants().len())
			.field("resolver", &self.resolver)
			.field("outcome", &self.outcome())
			.finish()
	}
}

impl OperationContext {
	/// Creates a context whose requested fields are discovered from results.
	pub fn new(actor: Actor, abilities: AbilitySet) -> Self {
		Self {
			actor: Arc::new(actor),
			abilities,
			resolver: Arc::new(ResultKeys),
			cell: Arc::new(DenialCell::default()),
		}
	}

	/// Builder: use a specific field requirement strategy.
	pub fn with_resolver(mut self, resolver: impl FieldRequirementResolver + 'static) -> Self {
		self.resolver = Arc::new(resolver);
		self
	}

	/// A child context for a nested handler call, sharing the denial cell.
	pub fn nested(&self, resolver: impl FieldRequirementResolver + 'static) -> Self {
		Self {
			actor: Arc::clone(&self.actor),
			abilities: self.abilities.clone(),
			resolver: Arc::new(resolver),
			cell: Arc::clone(&self.cell),
		}
	}

	pub fn actor(&self) -> &Actor {
		&self.actor
	}

	pub fn abilities(&self) -> &AbilitySet {
		&self.abilities
	}

	pub fn resolver(&self) -> &dyn FieldRequirementResolver {
		self.resolver.as_ref()
	}

	pub fn outcome(&self) -> Outcome {
		self.cell.lock().outcome
	}

	pub fn is_denied(&self) -> bool {
		self.outcome() == Outcome::Denied
	}

	/// The first denial recorded in this call tree.
	pub fn denial(&self) -> Option<Denial> {
		self.cell.lock().denial.clone()
	}

	/// True if a write was denied after it was applied, anywhere in the
	/// call tree.
	pub fn requires_rollback(&self) -> bool {
		self.cell.lock().rollback
	}

	/// Flags the call tree for rollback; a write has been applied and the
	/// tree is denied.
	pub fn mark_rollback(&self) {
		let mut state = self.cell.lock();
		if !state.rollback {
			debug!(actor_id = %self.actor.id(), "rollback required");
		}
		state.rollback = true;
	}

	/// Marks the tree allowed unless it is already denied.
	pub fn allow(&self) {
		let mut state = self.cell.lock();
		if state.outcome != Outcome::Denied {
			state.outcome = Outcome::Allowed;
		}
	}

	/// Records a denial. Only the first denial is kept; returns whether this
	/// call recorded it. A rollback request is honoured either way.
	pub fn deny(&self, denial: Denial) -> bool {
		let mut state = self.cell.lock();
		state.outcome = Outcome::Denied;
		state.rollback |= denial.rollback;
		if state.denial.is_some() {
			return false;
		}
		debug!(
			actor_id = %self.actor.id(),
			stage = ?denial.stage,
			rollback = denial.rollback,
			"operation denied"
		);
		state.denial = Some(denial);
		true
	}

	/// Translates the outcome into the uniform forbidden error.
	pub fn verdict(&self) -> Result<(), Forbidden> {
		let state = self.cell.lock();
		match (&state.outcome, &state.denial) {
			(Outcome::Denied, denial) => Err(Forbidden {
				reason: denial.as_ref().and_then(|d| d.reason.clone()),
			}),
			_ => Ok(()),
		}
	}
}
