// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operation-level authorization for Warden.
//!
//! A [`RuleDispatcher`] wraps a producer (the callback that actually reads or
//! writes storage) with the checks for one operation type:
//!
//! - type-level and field-level checks before the producer runs
//! - instance-level checks and redaction on what it returned
//!
//! Denials are data. They are recorded on the [`OperationContext`] shared by
//! the whole call tree and the dispatcher returns `Ok(None)`; callers turn the
//! outcome into a uniform [`Forbidden`] with [`OperationContext::verdict`].
//! After a write, a denial also means the transaction must be rolled back
//! ([`OperationContext::requires_rollback`]).
//!
//! ```
//! use serde_json::{json, Value};
//! use warden_ability::{AbilitySet, Action, Actor, Grant};
//! use warden_rules::{OperationContext, RuleDescriptor, RuleDispatcher, RuleError, RuleInput, RuleKind};
//!
//! # tokio_test::block_on(async {
//! let abilities = AbilitySet::new(vec![
//!     Grant::allow(Action::Read, "Post"),
//!     Grant::forbid(Action::Read, "Post").on_fields(["secret"]),
//! ]);
//! let ctx = OperationContext::new(Actor::new("u1"), abilities);
//! let rule = RuleDescriptor::new(RuleKind::ReadOne, "Post");
//!
//! let post = RuleDispatcher::default()
//!     .dispatch(&ctx, &rule, &RuleInput::new(), || async {
//!         Ok::<Value, RuleError>(json!({ "id": 1, "secret": "x" }))
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(post, Some(json!({ "id": 1, "secret": null })));
//! assert!(ctx.verdict().is_ok());
//! # });
//! ```

pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod fields;
pub mod handlers;
pub mod query;
pub mod validator;

pub use context::{Denial, OperationContext, Outcome, Stage};
pub use descriptor::{
	RuleDescriptor, RuleInput, RuleKind, RuleOptions, DEFAULT_FILTER_INPUT, DEFAULT_SORT_INPUT,
};
pub use dispatcher::RuleDispatcher;
pub use error::{Forbidden, Result, RuleError};
pub use fields::{FieldRequirementResolver, ResultKeys, SelectionSet};
pub use handlers::RuleHandler;
pub use query::{
	FilterNode, FilterOp, OrderBy, Pagination, QueryArgs, RelationQuantifier, SortDirection,
};
pub use validator::{SortFilterPaginationValidator, CURSOR_FIELD};
