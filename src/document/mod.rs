//! The backend query document: the filter/order/projection/grouping tree the
//! external compiler hands to the executor, plus the provider-facing wire
//! form of one fetch.
//!
//! The predicate tree is an owned tagged-variant value. The patch and prune
//! passes consume a tree and return a new one; there are no parent
//! back-pointers and no in-place grafting.

use crate::core::ScalarValue;
use crate::metadata::Entity;
use std::fmt;

/// Comparison operator of a predicate leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "Eq",
            CompareOp::Ne => "Ne",
            CompareOp::Lt => "Lt",
            CompareOp::Le => "Le",
            CompareOp::Gt => "Gt",
            CompareOp::Ge => "Ge",
        };
        write!(f, "{s}")
    }
}

/// One node of the filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    And(Box<PredicateNode>, Box<PredicateNode>),
    Or(Box<PredicateNode>, Box<PredicateNode>),
    Comparison {
        op: CompareOp,
        field: String,
        value: ScalarValue,
        /// Compare a lookup field by foreign id rather than display value.
        by_lookup_id: bool,
    },
    /// Placeholder for an unresolved cross-list sub-predicate. The embedded
    /// filter applies to the referenced list; the patcher replaces the whole
    /// node before execution.
    PatchMarker {
        field: String,
        filter: Option<Box<PredicateNode>>,
    },
    Constant(bool),
}

impl PredicateNode {
    pub fn and(left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::Or(Box::new(left), Box::new(right))
    }

    pub fn compare(op: CompareOp, field: impl Into<String>, value: ScalarValue) -> Self {
        PredicateNode::Comparison {
            op,
            field: field.into(),
            value,
            by_lookup_id: false,
        }
    }

    pub fn eq(field: impl Into<String>, value: ScalarValue) -> Self {
        Self::compare(CompareOp::Eq, field, value)
    }

    /// Equality on a lookup field's foreign id.
    pub fn eq_lookup_id(field: impl Into<String>, id: i64) -> Self {
        PredicateNode::Comparison {
            op: CompareOp::Eq,
            field: field.into(),
            value: ScalarValue::Int(id),
            by_lookup_id: true,
        }
    }

    pub fn marker(field: impl Into<String>, filter: Option<PredicateNode>) -> Self {
        PredicateNode::PatchMarker {
            field: field.into(),
            filter: filter.map(Box::new),
        }
    }

    /// True if any patch marker remains in the tree.
    pub fn has_markers(&self) -> bool {
        match self {
            PredicateNode::And(l, r) | PredicateNode::Or(l, r) => {
                l.has_markers() || r.has_markers()
            }
            PredicateNode::PatchMarker { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateNode::And(l, r) => write!(f, "(And {l} {r})"),
            PredicateNode::Or(l, r) => write!(f, "(Or {l} {r})"),
            PredicateNode::Comparison {
                op,
                field,
                value,
                by_lookup_id,
            } => {
                if *by_lookup_id {
                    write!(f, "({op}[id] {field} {value})")
                } else {
                    write!(f, "({op} {field} {value})")
                }
            }
            PredicateNode::PatchMarker { field, filter } => match filter {
                Some(inner) => write!(f, "(Marker {field} {inner})"),
                None => write!(f, "(Marker {field})"),
            },
            PredicateNode::Constant(b) => write!(f, "(Const {b})"),
        }
    }
}

/// One ordering term of the wire query. The remote store applies these; this
/// core never sorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: String,
    pub descending: bool,
}

impl OrderSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Grouping request: a key selector resolved when the document is built,
/// the key's backend column, and whether only the key survives downstream.
pub struct Grouping<T> {
    /// Backend column holding the grouping key.
    pub key_field: &'static str,
    /// Typed key selector applied to materialized entities.
    pub selector: fn(&T) -> ScalarValue,
    /// Post-group key-only projection: skip entity construction and yield
    /// only the distinct-adjacent keys.
    pub key_only: bool,
}

impl<T> Clone for Grouping<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Grouping<T> {}

/// The compiled query document for one entity type.
///
/// Built once by the external compiler, rewritten by the patch and prune
/// passes, consumed by the executor. `Clone` exists because re-enumeration
/// re-runs the whole pipeline from a fresh copy.
pub struct QueryDocument<T: Entity> {
    pub filter: Option<PredicateNode>,
    pub order: Vec<OrderSpec>,
    /// Backend field names to fetch; `None` asks the executor to synthesize
    /// the full mapped projection.
    pub projection: Option<Vec<String>>,
    pub grouping: Option<Grouping<T>>,
}

impl<T: Entity> QueryDocument<T> {
    pub fn new() -> Self {
        Self {
            filter: None,
            order: Vec::new(),
            projection: None,
            grouping: None,
        }
    }

    pub fn with_filter(mut self, filter: PredicateNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order.push(order);
        self
    }

    pub fn with_projection(mut self, fields: Vec<String>) -> Self {
        self.projection = Some(fields);
        self
    }

    pub fn with_grouping(mut self, grouping: Grouping<T>) -> Self {
        self.grouping = Some(grouping);
        self
    }
}

impl<T: Entity> Default for QueryDocument<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Clone for QueryDocument<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            order: self.order.clone(),
            projection: self.projection.clone(),
            grouping: self.grouping,
        }
    }
}

/// Provider-facing form of one fetch: list, projection, finalized filter,
/// ordering. `Display` is the human-readable rendering handed to the
/// diagnostic sink before each remote call.
#[derive(Debug, Clone)]
pub struct WireQuery {
    pub list: String,
    pub view_fields: Vec<String>,
    pub filter: Option<PredicateNode>,
    pub order: Vec<OrderSpec>,
}

impl fmt::Display for WireQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query[list={}]", self.list)?;
        if let Some(filter) = &self.filter {
            write!(f, " Where={filter}")?;
        }
        write!(f, " ViewFields=[{}]", self.view_fields.join(", "))?;
        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|o| {
                    format!(
                        "{} {}",
                        o.field,
                        if o.descending { "desc" } else { "asc" }
                    )
                })
                .collect();
            write!(f, " Order=[{}]", terms.join(", "))?;
        }
        Ok(())
    }
}
