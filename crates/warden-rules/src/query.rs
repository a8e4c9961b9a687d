// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Normalized list-query arguments.
//!
//! Transports hand over ordering, filtering and pagination in the nested
//! object form common to query APIs:
//!
//! ```text
//! orderBy: [{ "title": "asc" }, { "author": { "name": "desc" } }]
//! where:   { "OR": [{ "status": "published" }, { "score": { "gt": 3 } }],
//!            "author": { "is": { "team": "red" } } }
//! cursor / skip / take
//! ```
//!
//! [`QueryArgs::extract`] turns them into [`OrderBy`] entries, a
//! [`FilterNode`] tree and [`Pagination`], which is all the validator needs.
//! Nested relation paths are flattened to dotted field names
//! (`author.name`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::RuleOptions;
use crate::error::{json_kind, Result, RuleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
	Asc,
	Desc,
}

impl SortDirection {
	fn parse(argument: &str, raw: &str) -> Result<Self> {
		match raw.to_ascii_lowercase().as_str() {
			"asc" => Ok(SortDirection::Asc),
			"desc" => Ok(SortDirection::Desc),
			other => Err(RuleError::invalid_argument(
				argument,
				format!("unknown sort direction `{other}`"),
			)),
		}
	}
}

/// One ordering entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
	pub field: String,
	pub direction: SortDirection,
}

impl OrderBy {
	pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
		Self {
			field: field.into(),
			direction,
		}
	}
}

/// Leaf comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
	Equals,
	Not,
	In,
	NotIn,
	Lt,
	Lte,
	Gt,
	Gte,
	Contains,
	StartsWith,
	EndsWith,
}

impl FilterOp {
	fn from_key(key: &str) -> Option<Self> {
		Some(match key {
			"equals" => FilterOp::Equals,
			"not" => FilterOp::Not,
			"in" => FilterOp::In,
			"notIn" => FilterOp::NotIn,
			"lt" => FilterOp::Lt,
			"lte" => FilterOp::Lte,
			"gt" => FilterOp::Gt,
			"gte" => FilterOp::Gte,
			"contains" => FilterOp::Contains,
			"startsWith" => FilterOp::StartsWith,
			"endsWith" => FilterOp::EndsWith,
			_ => return None,
		})
	}
}

/// Keys that modify a leaf without naming a comparison.
const LEAF_MODIFIERS: &[&str] = &["mode"];

/// Quantifiers over a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationQuantifier {
	Some,
	Every,
	None,
	Is,
	IsNot,
}

impl RelationQuantifier {
	fn from_key(key: &str) -> Option<Self> {
		Some(match key {
			"some" => RelationQuantifier::Some,
			"every" => RelationQuantifier::Every,
			"none" => RelationQuantifier::None,
			"is" => RelationQuantifier::Is,
			"isNot" => RelationQuantifier::IsNot,
			_ => return None,
		})
	}
}

/// Boolean filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterNode {
	And(Vec<FilterNode>),
	Or(Vec<FilterNode>),
	Not(Box<FilterNode>),
	Compare {
		field: String,
		op: FilterOp,
		value: Value,
	},
	Relation {
		field: String,
		quantifier: RelationQuantifier,
		filter: Box<FilterNode>,
	},
}

impl FilterNode {
	pub fn compare(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
		FilterNode::Compare {
			field: field.into(),
			op,
			value: value.into(),
		}
	}

	/// Every field name referenced by the tree, relation paths flattened.
	pub fn fields(&self) -> Vec<String> {
		let mut fields = Vec::new();
		self.collect_fields("", &mut fields);
		fields
	}

	fn collect_fields(&self, prefix: &str, out: &mut Vec<String>) {
		match self {
			FilterNode::And(nodes) | FilterNode::Or(nodes) => {
				nodes.iter().for_each(|n| n.collect_fields(prefix, out))
			}
			FilterNode::Not(node) => node.collect_fields(prefix, out),
			FilterNode::Compare { field, .. } => out.push(join_path(prefix, field)),
			FilterNode::Relation { field, filter, .. } => {
				let path = join_path(prefix, field);
				filter.collect_fields(&path, out);
				out.push(path);
			}
		}
	}
}

pub(crate) fn join_path(prefix: &str, field: &str) -> String {
	if prefix.is_empty() {
		field.to_string()
	} else {
		format!("{prefix}.{field}")
	}
}

/// Cursor or offset pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
	pub cursor: Option<Value>,
	pub skip: Option<u64>,
	pub take: Option<i64>,
}

impl Pagination {
	pub fn uses_cursor(&self) -> bool {
		self.cursor.is_some()
	}
}

/// Ordering, filter and pagination of one list query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
	pub order_by: Vec<OrderBy>,
	pub filter: Option<FilterNode>,
	pub pagination: Pagination,
}

impl QueryArgs {
	/// Reads the query arguments under the names configured for the rule.
	pub fn extract(arguments: &Map<String, Value>, options: &RuleOptions) -> Result<Self> {
		let order_by = match arguments.get(&options.sort_input_name) {
			None | Some(Value::Null) => Vec::new(),
			Some(value) => parse_order_by(&options.sort_input_name, value)?,
		};

		let filter = match arguments.get(&options.filter_input_name) {
			None | Some(Value::Null) => None,
			Some(Value::Object(map)) => Some(parse_filter(&options.filter_input_name, map)?),
			Some(other) => {
				return Err(RuleError::invalid_argument(
					&options.filter_input_name,
					format!("expected an object, got {}", json_kind(other)),
				))
			}
		};

		let pagination = match &options.pagination_input_name {
			None => parse_pagination("pagination", arguments)?,
			Some(name) => match arguments.get(name) {
				None | Some(Value::Null) => Pagination::default(),
				Some(Value::Object(map)) => parse_pagination(name, map)?,
				Some(other) => {
					return Err(RuleError::invalid_argument(
						name,
						format!("expected an object, got {}", json_kind(other)),
					))
				}
			},
		};

		Ok(Self {
			order_by,
			filter,
			pagination,
		})
	}
}

fn parse_order_by(argument: &str, value: &Value) -> Result<Vec<OrderBy>> {
	let mut entries = Vec::new();
	match value {
		Value::Array(items) => {
			for item in items {
				match item {
					Value::Object(map) => parse_order_object(argument, "", map, &mut entries)?,
					other => {
						return Err(RuleError::invalid_argument(
							argument,
							format!("expected ordering objects, got {}", json_kind(other)),
						))
					}
				}
			}
		}
		Value::Object(map) => parse_order_object(argument, "", map, &mut entries)?,
		other => {
			return Err(RuleError::invalid_argument(
				argument,
				format!("expected an object or array, got {}", json_kind(other)),
			))
		}
	}
	Ok(entries)
}

fn parse_order_object(
	argument: &str,
	prefix: &str,
	map: &Map<String, Value>,
	out: &mut Vec<OrderBy>,
) -> Result<()> {
	for (field, value) in map {
		let path = join_path(prefix, field);
		match value {
			Value::String(direction) => {
				out.push(OrderBy::new(path, SortDirection::parse(argument, direction)?));
			}
			Value::Object(nested) => match nested.get("sort") {
				Some(Value::String(direction)) => {
					out.push(OrderBy::new(path, SortDirection::parse(argument, direction)?));
				}
				_ => parse_order_object(argument, &path, nested, out)?,
			},
			other => {
				return Err(RuleError::invalid_argument(
					argument,
					format!("`{path}` has {} instead of a direction", json_kind(other)),
				))
			}
		}
	}
	Ok(())
}

fn parse_filter(argument: &str, map: &Map<String, Value>) -> Result<FilterNode> {
	let mut nodes = Vec::with_capacity(map.len());
	for (key, value) in map {
		let node = match key.as_str() {
			"AND" => FilterNode::And(parse_filter_list(argument, value)?),
			"OR" => FilterNode::Or(parse_filter_list(argument, value)?),
			"NOT" => FilterNode::Not(Box::new(FilterNode::And(parse_filter_list(
				argument, value,
			)?))),
			field => parse_field_filter(argument, field, value)?,
		};
		nodes.push(node);
	}
	Ok(collapse(nodes))
}

fn parse_filter_list(argument: &str, value: &Value) -> Result<Vec<FilterNode>> {
	match value {
		Value::Array(items) => items
			.iter()
			.map(|item| match item {
				Value::Object(map) => parse_filter(argument, map),
				other => Err(RuleError::invalid_argument(
					argument,
					format!("expected filter objects, got {}", json_kind(other)),
				)),
			})
			.collect(),
		Value::Object(map) => Ok(vec![parse_filter(argument, map)?]),
		other => Err(RuleError::invalid_argument(
			argument,
			format!("expected a filter object or array, got {}", json_kind(other)),
		)),
	}
}

fn parse_field_filter(argument: &str, field: &str, value: &Value) -> Result<FilterNode> {
	let Value::Object(map) = value else {
		return Ok(FilterNode::compare(field, FilterOp::Equals, value.clone()));
	};

	if !map.is_empty() && map.keys().all(|k| RelationQuantifier::from_key(k).is_some()) {
		let mut nodes = Vec::with_capacity(map.len());
		for (key, inner) in map {
			let quantifier = RelationQuantifier::from_key(key).unwrap_or(RelationQuantifier::Is);
			let filter = match inner {
				Value::Object(inner) => parse_filter(argument, inner)?,
				Value::Null => FilterNode::And(Vec::new()),
				other => {
					return Err(RuleError::invalid_argument(
						argument,
						format!("`{field}.{key}` has {}", json_kind(other)),
					))
				}
			};
			nodes.push(FilterNode::Relation {
				field: field.to_string(),
				quantifier,
				filter: Box::new(filter),
			});
		}
		return Ok(collapse(nodes));
	}

	let is_leaf = map
		.keys()
		.all(|k| FilterOp::from_key(k).is_some() || LEAF_MODIFIERS.contains(&k.as_str()));
	if !map.is_empty() && is_leaf {
		if !map.keys().any(|k| FilterOp::from_key(k).is_some()) {
			return Err(RuleError::invalid_argument(
				argument,
				format!("`{field}` has modifiers but no comparison"),
			));
		}
		let mut nodes = Vec::with_capacity(map.len());
		for (key, operand) in map {
			let Some(op) = FilterOp::from_key(key) else {
				continue;
			};
			let node = match (op, operand) {
				(FilterOp::Not, Value::Object(_)) => {
					FilterNode::Not(Box::new(parse_field_filter(argument, field, operand)?))
				}
				_ => FilterNode::compare(field, op, operand.clone()),
			};
			nodes.push(node);
		}
		return Ok(collapse(nodes));
	}

	// To-one relation shorthand: `{ author: { name: "x" } }`.
	Ok(FilterNode::Relation {
		field: field.to_string(),
		quantifier: RelationQuantifier::Is,
		filter: Box::new(parse_filter(argument, map)?),
	})
}

fn collapse(mut nodes: Vec<FilterNode>) -> FilterNode {
	if nodes.len() == 1 {
		nodes.remove(0)
	} else {
		FilterNode::And(nodes)
	}
}

fn parse_pagination(argument: &str, map: &Map<String, Value>) -> Result<Pagination> {
	let cursor = match map.get("cursor") {
		None | Some(Value::Null) => None,
		Some(value) => Some(value.clone()),
	};
	let skip = match map.get("skip") {
		None | Some(Value::Null) => None,
		Some(value) => Some(value.as_u64().ok_or_else(|| {
			RuleError::invalid_argument(argument, "`skip` must be a non-negative integer")
		})?),
	};
	let take = match map.get("take") {
		None | Some(Value::Null) => None,
		Some(value) => Some(
			value
				.as_i64()
				.ok_or_else(|| RuleError::invalid_argument(argument, "`take` must be an integer"))?,
		),
	};
	Ok(Pagination { cursor, skip, take })
}
