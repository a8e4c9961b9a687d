// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission checks for list-query arguments.
//!
//! Ordering and filtering reveal information about field values, so each
//! referenced field needs its own `Sort` or `Filter` grant. Grant conditions
//! are not consulted here: the check is per type and field only.

use tracing::debug;
use warden_ability::{AbilitySet, Action, Decision};

use crate::query::{join_path, FilterNode, OrderBy, Pagination, QueryArgs};

/// Field used to anchor cursor pagination.
pub const CURSOR_FIELD: &str = "id";

/// Validates ordering, filter and pagination arguments for one subject type.
#[derive(Debug, Clone, Copy)]
pub struct SortFilterPaginationValidator<'a> {
	abilities: &'a AbilitySet,
	subject_type: &'a str,
}

impl<'a> SortFilterPaginationValidator<'a> {
	pub fn new(abilities: &'a AbilitySet, subject_type: &'a str) -> Self {
		Self {
			abilities,
			subject_type,
		}
	}

	/// Every ordering field needs `Sort`.
	pub fn can_sort_by_fields(&self, order_by: &[OrderBy]) -> Decision {
		for entry in order_by {
			let decision = self.field(Action::Sort, &entry.field);
			if decision.is_denied() {
				return decision;
			}
		}
		Decision::Allowed
	}

	/// Every filtered field needs `Filter`; relation filters need it on the
	/// relation and on each nested path.
	pub fn can_filter_by_fields(&self, filter: &FilterNode) -> Decision {
		self.walk_filter("", filter)
	}

	fn walk_filter(&self, prefix: &str, node: &FilterNode) -> Decision {
		match node {
			FilterNode::And(nodes) | FilterNode::Or(nodes) => nodes
				.iter()
				.map(|n| self.walk_filter(prefix, n))
				.find(Decision::is_denied)
				.unwrap_or(Decision::Allowed),
			FilterNode::Not(inner) => self.walk_filter(prefix, inner),
			FilterNode::Compare { field, .. } => self.field(Action::Filter, &join_path(prefix, field)),
			FilterNode::Relation { field, filter, .. } => {
				let path = join_path(prefix, field);
				let decision = self.field(Action::Filter, &path);
				if decision.is_denied() {
					return decision;
				}
				self.walk_filter(&path, filter)
			}
		}
	}

	/// Cursor pagination needs `Sort` on the cursor field; offsets need nothing.
	pub fn can_paginate(&self, pagination: &Pagination) -> Decision {
		if pagination.uses_cursor() {
			self.field(Action::Sort, CURSOR_FIELD)
		} else {
			Decision::Allowed
		}
	}

	/// All three checks; the first denial wins.
	pub fn validate(&self, args: &QueryArgs) -> Decision {
		let sort = self.can_sort_by_fields(&args.order_by);
		if sort.is_denied() {
			return sort;
		}
		if let Some(filter) = &args.filter {
			let filter = self.can_filter_by_fields(filter);
			if filter.is_denied() {
				return filter;
			}
		}
		self.can_paginate(&args.pagination)
	}

	fn field(&self, action: Action, field: &str) -> Decision {
		let decision = self
			.abilities
			.check(action, self.subject_type, None, Some(field));
		if decision.is_denied() {
			debug!(
				subject_type = self.subject_type,
				%action,
				field,
				"query argument not permitted"
			);
		}
		decision
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::{FilterOp, RelationQuantifier, SortDirection};
	use warden_ability::{Condition, Grant};

	fn validator_for(abilities: &AbilitySet) -> SortFilterPaginationValidator<'_> {
		SortFilterPaginationValidator::new(abilities, "Post")
	}

	mod sorting {
		use super::*;

		#[test]
		fn requires_sort_grant_per_field() {
			let abilities = AbilitySet::new(vec![
				Grant::allow(Action::Read, "Post"),
				Grant::allow(Action::Sort, "Post").on_fields(["title"]),
			]);
			let validator = validator_for(&abilities);
			assert!(validator
				.can_sort_by_fields(&[OrderBy::new("title", SortDirection::Asc)])
				.is_allowed());
			assert!(validator
				.can_sort_by_fields(&[
					OrderBy::new("title", SortDirection::Asc),
					OrderBy::new("score", SortDirection::Desc),
				])
				.is_denied());
		}

		#[test]
		fn read_grant_does_not_imply_sort() {
			let abilities = AbilitySet::new(vec![Grant::allow(Action::Read, "Post")]);
			assert!(validator_for(&abilities)
				.can_sort_by_fields(&[OrderBy::new("id", SortDirection::Asc)])
				.is_denied());
		}

		#[test]
		fn no_ordering_is_allowed() {
			let abilities = AbilitySet::default();
			assert!(validator_for(&abilities).can_sort_by_fields(&[]).is_allowed());
		}

		#[test]
		fn conditional_sort_grant_is_not_evaluated() {
			let abilities = AbilitySet::new(vec![
				Grant::allow(Action::Sort, "Post").when(Condition::equals("public", true))
			]);
			assert!(validator_for(&abilities)
				.can_sort_by_fields(&[OrderBy::new("title", SortDirection::Asc)])
				.is_allowed());
		}
	}

	mod filtering {
		use super::*;

		#[test]
		fn walks_boolean_nodes() {
			let abilities =
				AbilitySet::new(vec![Grant::allow(Action::Filter, "Post").on_fields(["status"])]);
			let validator = validator_for(&abilities);
			let allowed = FilterNode::Or(vec![
				FilterNode::compare("status", FilterOp::Equals, "a"),
				FilterNode::Not(Box::new(FilterNode::compare("status", FilterOp::Equals, "b"))),
			]);
			assert!(validator.can_filter_by_fields(&allowed).is_allowed());

			let denied = FilterNode::And(vec![
				FilterNode::compare("status", FilterOp::Equals, "a"),
				FilterNode::Not(Box::new(FilterNode::compare("secret", FilterOp::Equals, "x"))),
			]);
			assert!(validator.can_filter_by_fields(&denied).is_denied());
		}

		#[test]
		fn relation_requires_relation_and_nested_paths() {
			let filter = FilterNode::Relation {
				field: "author".into(),
				quantifier: RelationQuantifier::Is,
				filter: Box::new(FilterNode::compare("email", FilterOp::Equals, "a@b.c")),
			};

			let relation_only =
				AbilitySet::new(vec![Grant::allow(Action::Filter, "Post").on_fields(["author"])]);
			assert!(validator_for(&relation_only)
				.can_filter_by_fields(&filter)
				.is_denied());

			let wildcard =
				AbilitySet::new(vec![Grant::allow(Action::Filter, "Post").on_fields(["author.*"])]);
			assert!(validator_for(&wildcard)
				.can_filter_by_fields(&filter)
				.is_allowed());
		}

		#[test]
		fn inverted_filter_grant_carries_reason() {
			let abilities = AbilitySet::new(vec![
				Grant::allow(Action::Filter, "Post"),
				Grant::forbid(Action::Filter, "Post")
					.on_fields(["salary"])
					.because("salary is confidential"),
			]);
			let decision = validator_for(&abilities)
				.can_filter_by_fields(&FilterNode::compare("salary", FilterOp::Gt, 100));
			assert_eq!(decision.reason(), Some("salary is confidential"));
		}
	}

	mod paginating {
		use super::*;
		use serde_json::json;

		#[test]
		fn cursor_requires_sort_on_id() {
			let read_only = AbilitySet::new(vec![Grant::allow(Action::Read, "Post")]);
			let pagination = Pagination {
				cursor: Some(json!({ "id": 5 })),
				..Default::default()
			};
			assert!(validator_for(&read_only).can_paginate(&pagination).is_denied());

			let sortable = AbilitySet::new(vec![Grant::allow(Action::Sort, "Post").on_fields(["id"])]);
			assert!(validator_for(&sortable).can_paginate(&pagination).is_allowed());
		}

		#[test]
		fn offset_pagination_needs_no_grant() {
			let read_only = AbilitySet::new(vec![Grant::allow(Action::Read, "Post")]);
			let pagination = Pagination {
				cursor: None,
				skip: Some(10),
				take: Some(10),
			};
			assert!(validator_for(&read_only).can_paginate(&pagination).is_allowed());
		}
	}

	#[test]
	fn validate_reports_first_failure() {
		let abilities = AbilitySet::new(vec![Grant::allow(Action::Sort, "Post")]);
		let args = QueryArgs {
			order_by: vec![OrderBy::new("title", SortDirection::Asc)],
			filter: Some(FilterNode::compare("title", FilterOp::Equals, "x")),
			pagination: Pagination::default(),
		};
		assert!(validator_for(&abilities).validate(&args).is_denied());
	}
}
