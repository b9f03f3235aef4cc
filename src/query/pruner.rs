//! Predicate pruning: fold constant-valued boolean subtrees, possibly
//! collapsing the whole filter to a single verdict.
//!
//! One bottom-up pass. Children are fully reduced before their parent is
//! examined, so a grafted subtree is already in normal form and the pass is
//! fixpoint-complete for the And/Or/Constant rule set. Subtrees are never
//! reordered; the patcher has already run every subquery, so no side effects
//! remain to disturb.

use crate::document::PredicateNode;

/// Tri-state outcome of pruning a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    True,
    False,
    Unknown,
}

impl From<bool> for Verdict {
    fn from(b: bool) -> Self {
        if b {
            Verdict::True
        } else {
            Verdict::False
        }
    }
}

/// Prune a predicate tree, returning the reduced tree and its verdict.
///
/// Callers drop the filter entirely on `True` and short-circuit to an empty
/// result on `False`; `Unknown` keeps the (possibly smaller) tree.
pub fn prune(node: PredicateNode) -> (PredicateNode, Verdict) {
    match node {
        PredicateNode::Constant(b) => (PredicateNode::Constant(b), Verdict::from(b)),
        PredicateNode::And(left, right) => {
            let (left, lv) = prune(*left);
            let (right, rv) = prune(*right);
            match (lv, rv) {
                (Verdict::False, _) | (_, Verdict::False) => {
                    (PredicateNode::Constant(false), Verdict::False)
                }
                (Verdict::True, Verdict::True) => (PredicateNode::Constant(true), Verdict::True),
                (Verdict::True, Verdict::Unknown) => (right, Verdict::Unknown),
                (Verdict::Unknown, Verdict::True) => (left, Verdict::Unknown),
                (Verdict::Unknown, Verdict::Unknown) => {
                    (PredicateNode::and(left, right), Verdict::Unknown)
                }
            }
        }
        PredicateNode::Or(left, right) => {
            let (left, lv) = prune(*left);
            let (right, rv) = prune(*right);
            match (lv, rv) {
                (Verdict::True, _) | (_, Verdict::True) => {
                    (PredicateNode::Constant(true), Verdict::True)
                }
                (Verdict::False, Verdict::False) => {
                    (PredicateNode::Constant(false), Verdict::False)
                }
                (Verdict::False, Verdict::Unknown) => (right, Verdict::Unknown),
                (Verdict::Unknown, Verdict::False) => (left, Verdict::Unknown),
                (Verdict::Unknown, Verdict::Unknown) => {
                    (PredicateNode::or(left, right), Verdict::Unknown)
                }
            }
        }
        other => (other, Verdict::Unknown),
    }
}
