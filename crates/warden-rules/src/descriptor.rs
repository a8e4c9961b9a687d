// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rule descriptors: what a call site asks the dispatcher to authorize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Default argument holding the ordering.
pub const DEFAULT_SORT_INPUT: &str = "orderBy";
/// Default argument holding the filter tree.
pub const DEFAULT_FILTER_INPUT: &str = "where";

/// Operation types with a dedicated rule handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
	ReadOne,
	ReadMany,
	Create,
	Update,
	Delete,
	Count,
	/// A call-site specific rule; never dispatchable.
	Custom(String),
}

impl RuleKind {
	/// Returns the built-in kinds.
	pub fn builtin() -> &'static [RuleKind] {
		const BUILTIN: &[RuleKind] = &[
			RuleKind::ReadOne,
			RuleKind::ReadMany,
			RuleKind::Create,
			RuleKind::Update,
			RuleKind::Delete,
			RuleKind::Count,
		];
		BUILTIN
	}

	/// Kinds whose producer writes.
	pub fn is_mutation(&self) -> bool {
		matches!(self, RuleKind::Create | RuleKind::Update | RuleKind::Delete)
	}
}

impl fmt::Display for RuleKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RuleKind::ReadOne => write!(f, "read_one"),
			RuleKind::ReadMany => write!(f, "read_many"),
			RuleKind::Create => write!(f, "create"),
			RuleKind::Update => write!(f, "update"),
			RuleKind::Delete => write!(f, "delete"),
			RuleKind::Count => write!(f, "count"),
			RuleKind::Custom(name) => write!(f, "custom:{name}"),
		}
	}
}

/// Per-call-site handler options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
	/// Deny the whole result on any field failure instead of redacting it.
	pub strict: bool,
	/// Postpone type-level read checks until the instance is known.
	pub defer: bool,
	/// Fields never authorized (or redacted) by this rule.
	pub exclude_fields: Vec<String>,
	pub sort_input_name: String,
	pub filter_input_name: String,
	/// `None` reads `cursor`/`skip`/`take` from the top-level arguments.
	pub pagination_input_name: Option<String>,
}

impl Default for RuleOptions {
	fn default() -> Self {
		Self {
			strict: false,
			defer: false,
			exclude_fields: Vec::new(),
			sort_input_name: DEFAULT_SORT_INPUT.to_string(),
			filter_input_name: DEFAULT_FILTER_INPUT.to_string(),
			pagination_input_name: None,
		}
	}
}

/// A rule attached to one call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
	pub kind: RuleKind,
	pub subject_type: String,
	#[serde(default)]
	pub options: RuleOptions,
}

impl RuleDescriptor {
	pub fn new(kind: RuleKind, subject_type: impl Into<String>) -> Self {
		Self {
			kind,
			subject_type: subject_type.into(),
			options: RuleOptions::default(),
		}
	}

	/// Builder: replace all options.
	pub fn with_options(mut self, options: RuleOptions) -> Self {
		self.options = options;
		self
	}

	/// Builder: set strict mode.
	pub fn strict(mut self, strict: bool) -> Self {
		self.options.strict = strict;
		self
	}

	/// Builder: defer type-level read checks.
	pub fn deferred(mut self) -> Self {
		self.options.defer = true;
		self
	}

	/// Builder: exclude fields from authorization.
	pub fn excluding<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options.exclude_fields = fields.into_iter().map(Into::into).collect();
		self
	}
}

/// The inputs of one operation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleInput {
	/// Raw operation arguments (ordering, filter, pagination live here).
	pub arguments: Map<String, Value>,
	/// Write payload for create and update.
	pub data: Option<Value>,
	/// Pre-mutation state of the instance being updated.
	pub current: Option<Value>,
}

impl RuleInput {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: set the raw arguments; non-object values are ignored.
	pub fn with_arguments(mut self, arguments: Value) -> Self {
		if let Value::Object(map) = arguments {
			self.arguments = map;
		}
		self
	}

	/// Builder: set the write payload.
	pub fn with_data(mut self, data: Value) -> Self {
		self.data = Some(data);
		self
	}

	/// Builder: set the pre-mutation instance.
	pub fn with_current(mut self, current: Value) -> Self {
		self.current = Some(current);
		self
	}
}
