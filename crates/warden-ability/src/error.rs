// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for ability compilation.

use thiserror::Error;

/// Result type for ability operations.
pub type Result<T> = std::result::Result<T, AbilityError>;

/// Errors raised while compiling grants. Denials are never errors.
#[derive(Debug, Error)]
pub enum AbilityError {
	#[error("grant condition references unknown actor attribute: {path}")]
	UnresolvedActorReference { path: String },

	#[error("invalid grant in group {group}: {message}")]
	InvalidGrant { group: String, message: String },
}
