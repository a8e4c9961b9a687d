// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ability evaluation.
//!
//! [`AbilitySet::check`] answers "may this actor perform `action` on
//! `subject_type` (optionally a specific instance, optionally one field)?".
//!
//! # Evaluation
//!
//! 1. Keep grants whose action covers the request (`Manage` covers all) and
//!    whose subject is `all` or the requested type.
//! 2. Keep grants whose field list and conditions match the query.
//! 3. The **last** remaining grant in declaration order decides: an inverted
//!    grant denies (with its reason), any other grant allows.
//! 4. No remaining grant denies.
//!
//! `Sort` and `Filter` are decided without looking at the instance.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, trace};

use crate::action::Action;
use crate::error::{AbilityError, Result};
use crate::grant::{Actor, Grant, GroupGrants};

/// Outcome of a single ability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
	Allowed,
	Denied {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		reason: Option<String>,
	},
}

impl Decision {
	/// A denial with no attached reason.
	pub fn denied() -> Self {
		Decision::Denied { reason: None }
	}

	pub fn is_allowed(&self) -> bool {
		matches!(self, Decision::Allowed)
	}

	pub fn is_denied(&self) -> bool {
		!self.is_allowed()
	}

	/// The reason of an inverted grant that caused the denial, if any.
	pub fn reason(&self) -> Option<&str> {
		match self {
			Decision::Allowed => None,
			Decision::Denied { reason } => reason.as_deref(),
		}
	}
}

/// The compiled, ordered grants of one actor for one request.
///
/// Cloning is cheap; the grant list is shared and never mutated.
#[derive(Debug, Clone)]
pub struct AbilitySet {
	grants: Arc<[Grant]>,
}

impl Default for AbilitySet {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

impl AbilitySet {
	/// Wraps already-compiled grants, keeping their order.
	pub fn new(grants: Vec<Grant>) -> Self {
		Self {
			grants: grants.into(),
		}
	}

	/// Merges the actor's group grants in membership order and binds actor
	/// references in their conditions.
	#[instrument(
		level = "debug",
		skip(actor, memberships),
		fields(actor_id = %actor.id(), groups = memberships.len())
	)]
	pub fn compile(actor: &Actor, memberships: &[GroupGrants]) -> Result<Self> {
		let mut grants = Vec::new();
		for membership in memberships {
			for grant in &membership.grants {
				if grant.fields.as_ref().is_some_and(|f| f.is_empty()) {
					return Err(AbilityError::InvalidGrant {
						group: membership.group.clone(),
						message: format!(
							"{} grant on {} lists no fields",
							grant.action, grant.subject
						),
					});
				}
				let mut grant = grant.clone();
				grant.conditions = grant
					.conditions
					.map(|c| c.bind_actor(actor))
					.transpose()?;
				grants.push(grant);
			}
		}
		trace!(grants = grants.len(), "compiled ability set");
		Ok(Self::new(grants))
	}

	pub fn grants(&self) -> &[Grant] {
		&self.grants
	}

	pub fn is_empty(&self) -> bool {
		self.grants.is_empty()
	}

	/// Grants that could influence a decision for this action and subject type.
	pub fn relevant_grants<'a>(
		&'a self,
		action: Action,
		subject_type: &'a str,
	) -> impl Iterator<Item = &'a Grant> + 'a {
		self
			.grants
			.iter()
			.filter(move |g| g.applies_to(action, subject_type))
	}

	fn deciding_grant(
		&self,
		action: Action,
		subject_type: &str,
		instance: Option<&Value>,
		field: Option<&str>,
	) -> Option<&Grant> {
		self.grants.iter().rev().find(|g| {
			g.applies_to(action, subject_type)
				&& g.matches_field(field)
				&& g.matches_instance(instance)
		})
	}

	/// Evaluates a query and reports why it was denied, if it was.
	#[instrument(
		level = "trace",
		skip(self, instance),
		fields(has_instance = instance.is_some())
	)]
	pub fn check(
		&self,
		action: Action,
		subject_type: &str,
		instance: Option<&Value>,
		field: Option<&str>,
	) -> Decision {
		let instance = if action.ignores_instance() {
			None
		} else {
			instance
		};

		let decision = match self.deciding_grant(action, subject_type, instance, field) {
			Some(grant) if grant.inverted => Decision::Denied {
				reason: grant.reason.clone(),
			},
			Some(_) => Decision::Allowed,
			None => Decision::denied(),
		};

		trace!(allowed = decision.is_allowed(), "ability decision");
		decision
	}

	/// `true` if the query is allowed.
	pub fn can(
		&self,
		action: Action,
		subject_type: &str,
		instance: Option<&Value>,
		field: Option<&str>,
	) -> bool {
		self.check(action, subject_type, instance, field).is_allowed()
	}

	/// `true` if the query is denied.
	pub fn cannot(
		&self,
		action: Action,
		subject_type: &str,
		instance: Option<&Value>,
		field: Option<&str>,
	) -> bool {
		!self.can(action, subject_type, instance, field)
	}

	/// The subset of `candidates` the actor may access, in input order.
	pub fn permitted_fields<I, S>(
		&self,
		action: Action,
		subject_type: &str,
		instance: Option<&Value>,
		candidates: I,
	) -> Vec<String>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		candidates
			.into_iter()
			.filter(|field| self.can(action, subject_type, instance, Some(field.as_ref())))
			.map(|field| field.as_ref().to_string())
			.collect()
	}
}
