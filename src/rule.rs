use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol_graph::ProtocolOracle;
use crate::term::Term;

/// An oriented rewrite rule. The orientation invariant, left side greater
/// than right side under shortlex, is established by `RewriteSystem` before
/// the rule is constructed.
///
/// Deleted rules stay in storage so that rule indices remain stable, but
/// they are never applied and never participate in overlap detection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    lhs: Term,
    rhs: Term,
    deleted: bool,
}

impl Rule {
    pub fn new(lhs: Term, rhs: Term) -> Rule {
        assert!(!lhs.is_empty() && !rhs.is_empty(), "rule sides must be non-empty");
        Rule {
            lhs,
            rhs,
            deleted: false,
        }
    }

    /// Test helper, parses "lhs => rhs".
    pub fn parse(s: &str) -> Rule {
        let (lhs, rhs) = match s.split_once(" => ") {
            Some(pair) => pair,
            None => panic!("failed to parse rule: '{}'", s),
        };
        Rule::new(Term::parse(lhs), Term::parse(rhs))
    }

    pub fn lhs(&self) -> &Term {
        &self.lhs
    }

    pub fn rhs(&self) -> &Term {
        &self.rhs
    }

    /// Rewrites the leftmost occurrence of our left-hand side in `term`.
    pub fn apply(&self, term: &mut Term) -> bool {
        assert!(!self.deleted, "applying deleted rule {}", self);
        term.rewrite_subterm(&self.lhs, &self.rhs)
    }

    /// Whether this rule's left-hand side can be reduced further by the
    /// other rule. A rule in that state is redundant and gets retired
    /// during inter-reduction.
    pub fn can_reduce_left_hand_side(&self, other: &Rule) -> bool {
        self.lhs.contains_subterm(&other.lhs)
    }

    /// The leftmost superposition of the two left-hand sides, if any.
    pub fn overlaps(&self, other: &Rule) -> Option<Term> {
        self.lhs.overlaps(&other.lhs)
    }

    /// Completion depth is measured on left-hand sides.
    pub fn depth(&self) -> usize {
        self.lhs.len()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn mark_deleted(&mut self) {
        assert!(!self.deleted, "rule {} deleted twice", self);
        self.deleted = true;
    }

    pub fn compare(&self, other: &Rule, protocols: &dyn ProtocolOracle) -> Ordering {
        self.lhs.compare(&other.lhs, protocols)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} => {}", self.lhs, self.rhs)?;
        if self.deleted {
            write!(f, " [deleted]")?;
        }
        Ok(())
    }
}
