// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for rule dispatch.
//!
//! [`RuleError`] covers programming and caller mistakes; it is never used to
//! express an authorization denial. Denials are recorded on the
//! [`OperationContext`](crate::OperationContext) and surfaced through
//! [`Forbidden`].

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::descriptor::RuleKind;

/// Result type for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Configuration and argument errors raised while dispatching a rule.
#[derive(Debug, Error)]
pub enum RuleError {
	#[error("unsupported rule type: {0}")]
	UnsupportedRule(String),

	#[error("no handler registered for rule type: {0}")]
	MissingHandler(RuleKind),

	#[error("invalid {argument} argument: {message}")]
	InvalidArgument { argument: String, message: String },

	#[error("{rule} producer returned {found}, expected {expected}")]
	UnexpectedValue {
		rule: RuleKind,
		expected: &'static str,
		found: &'static str,
	},
}

impl RuleError {
	pub(crate) fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
		RuleError::InvalidArgument {
			argument: argument.into(),
			message: message.into(),
		}
	}

	pub(crate) fn unexpected_value(rule: RuleKind, expected: &'static str, found: &Value) -> Self {
		RuleError::UnexpectedValue {
			rule,
			expected,
			found: json_kind(found),
		}
	}
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

/// Uniform denial returned to callers.
///
/// Never names the field or condition that failed; only the reason attached
/// to an inverted grant is carried through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forbidden {
	pub reason: Option<String>,
}

impl fmt::Display for Forbidden {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.reason {
			Some(reason) => write!(f, "forbidden: {reason}"),
			None => write!(f, "forbidden"),
		}
	}
}

impl std::error::Error for Forbidden {}
