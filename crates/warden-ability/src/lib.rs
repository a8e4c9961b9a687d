// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability grants and ability evaluation for Warden.
//!
//! This crate answers one question: may an actor perform an action on a
//! subject type, a specific instance of it, or a single field? Grants are
//! declarative and ordered; the last matching grant wins and anything not
//! granted is denied.
//!
//! # Example
//!
//! ```
//! use warden_ability::{AbilitySet, Action, Actor, Condition, Grant, GroupGrants};
//! use serde_json::json;
//!
//! let actor = Actor::new("u1");
//! let editors = GroupGrants::new("editors", vec![
//!     Grant::allow(Action::Read, "Post"),
//!     Grant::forbid(Action::Read, "Post").on_fields(["secret"]),
//!     Grant::allow(Action::Update, "Post").when(Condition::equals_actor("author_id", "id")),
//! ]);
//! let abilities = AbilitySet::compile(&actor, &[editors]).unwrap();
//!
//! let post = json!({ "id": 1, "author_id": "u1", "secret": "x" });
//! assert!(abilities.can(Action::Read, "Post", Some(&post), Some("id")));
//! assert!(abilities.cannot(Action::Read, "Post", Some(&post), Some("secret")));
//! assert!(abilities.can(Action::Update, "Post", Some(&post), None));
//! ```

pub mod ability;
pub mod action;
pub mod condition;
pub mod error;
pub mod grant;

pub use ability::{AbilitySet, Decision};
pub use action::{Action, SubjectPattern, ALL_SUBJECTS};
pub use condition::{lookup, CompareOp, Condition, Operand};
pub use error::{AbilityError, Result};
pub use grant::{Actor, Grant, GroupGrants};
