//! In-process tabular provider.
//!
//! Serves lists held in memory, evaluating predicate trees against raw rows
//! and honoring view-field projection and order terms. Every call is
//! counted, which is what the pipeline tests lean on to prove the executor
//! skipped (or performed) a fetch.

use crate::core::{EngineError, EngineResult, ScalarValue, DATE_TIME_FORMAT};
use crate::document::{CompareOp, OrderSpec, PredicateNode, WireQuery};
use crate::provider::{Row, TabularProvider};
use chrono::NaiveDateTime;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;

struct MemoryList {
    version: String,
    rows: Vec<Row>,
}

/// In-memory list store with call counters.
#[derive(Default)]
pub struct MemoryProvider {
    lists: RefCell<HashMap<String, MemoryList>>,
    query_calls: Cell<usize>,
    version_calls: Cell<usize>,
    last_query: RefCell<Option<String>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list with its version token and backing rows.
    pub fn add_list(&self, name: impl Into<String>, version: impl Into<String>, rows: Vec<Row>) {
        self.lists.borrow_mut().insert(
            name.into(),
            MemoryList {
                version: version.into(),
                rows,
            },
        );
    }

    /// Number of `execute_query` calls served so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.get()
    }

    /// Number of `get_list_version` calls served so far.
    pub fn version_calls(&self) -> usize {
        self.version_calls.get()
    }

    /// Rendering of the most recent query, if any.
    pub fn last_query(&self) -> Option<String> {
        self.last_query.borrow().clone()
    }

    fn eval(node: &PredicateNode, row: &Row) -> EngineResult<bool> {
        match node {
            PredicateNode::And(l, r) => Ok(Self::eval(l, row)? && Self::eval(r, row)?),
            PredicateNode::Or(l, r) => Ok(Self::eval(l, row)? || Self::eval(r, row)?),
            PredicateNode::Constant(b) => Ok(*b),
            PredicateNode::PatchMarker { field, .. } => Err(EngineError::provider(format!(
                "unresolved patch marker on field '{field}' reached the provider"
            ))),
            PredicateNode::Comparison {
                op,
                field,
                value,
                by_lookup_id,
            } => {
                let Some(raw) = row.get(field.as_str()) else {
                    return Ok(false);
                };
                if *by_lookup_id {
                    return Self::eval_lookup_id(*op, raw, value);
                }
                let ordering = Self::compare_raw(raw, value)?;
                Ok(Self::apply_op(*op, ordering))
            }
        }
    }

    /// Lookup comparisons match against the id prefix of each `id#display`
    /// chunk; a multi-lookup raw value matches if any chunk does.
    fn eval_lookup_id(op: CompareOp, raw: &str, value: &ScalarValue) -> EngineResult<bool> {
        let want = value.as_int().ok_or_else(|| {
            EngineError::provider("lookup-id comparison against a non-integer value")
        })?;
        for chunk in raw.split(";#").filter(|c| !c.is_empty()) {
            let id_text = chunk.split('#').next().unwrap_or("");
            if let Ok(id) = id_text.parse::<i64>() {
                if Self::apply_op(op, id.cmp(&want)) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn compare_raw(raw: &str, value: &ScalarValue) -> EngineResult<Ordering> {
        let ordering = match value {
            ScalarValue::Int(want) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .map(|have| have.cmp(want)),
            ScalarValue::Float(want) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|have| have.partial_cmp(want)),
            ScalarValue::Bool(want) => {
                let have = matches!(raw, "1") || raw.eq_ignore_ascii_case("true");
                Some(have.cmp(want))
            }
            ScalarValue::Text(want) => Some(raw.cmp(want.as_str())),
            ScalarValue::DateTime(want) => NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
                .ok()
                .map(|have| have.cmp(want)),
        };
        ordering.ok_or_else(|| {
            EngineError::provider(format!("row value '{raw}' is not comparable to {value}"))
        })
    }

    fn apply_op(op: CompareOp, ordering: Ordering) -> bool {
        match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    fn sort_rows(rows: &mut [Row], order: &[OrderSpec]) {
        // Stable sort per term, last term first, gives the combined order.
        for spec in order.iter().rev() {
            rows.sort_by(|a, b| {
                let left = a.get(spec.field.as_str()).map(String::as_str).unwrap_or("");
                let right = b.get(spec.field.as_str()).map(String::as_str).unwrap_or("");
                let ord = match (left.parse::<f64>(), right.parse::<f64>()) {
                    (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
                    _ => left.cmp(right),
                };
                if spec.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
    }

    fn project(row: &Row, view_fields: &[String]) -> Row {
        if view_fields.is_empty() {
            return row.clone();
        }
        row.iter()
            .filter(|(k, _)| view_fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl TabularProvider for MemoryProvider {
    fn execute_query(&self, query: &WireQuery) -> EngineResult<Vec<Row>> {
        self.query_calls.set(self.query_calls.get() + 1);
        *self.last_query.borrow_mut() = Some(query.to_string());

        let lists = self.lists.borrow();
        let list = lists
            .get(query.list.as_str())
            .ok_or_else(|| EngineError::provider(format!("unknown list '{}'", query.list)))?;

        let mut matched = Vec::new();
        for row in &list.rows {
            let keep = match &query.filter {
                Some(filter) => Self::eval(filter, row)?,
                None => true,
            };
            if keep {
                matched.push(row.clone());
            }
        }
        Self::sort_rows(&mut matched, &query.order);
        Ok(matched
            .iter()
            .map(|row| Self::project(row, &query.view_fields))
            .collect())
    }

    fn get_list_version(&self, list: &str) -> EngineResult<String> {
        self.version_calls.set(self.version_calls.get() + 1);
        let lists = self.lists.borrow();
        lists
            .get(list)
            .map(|l| l.version.clone())
            .ok_or_else(|| EngineError::provider(format!("unknown list '{list}'")))
    }
}
