use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use crate::protocol_graph::ProtocolOracle;
use crate::rule::Rule;
use crate::term::Term;

/// Outcome of the completion procedure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompletionResult {
    /// The worklist drained. The rule set is locally confluent, and since
    /// every rewrite decreases the term under a well-founded order, it is
    /// confluent: normal forms are unique.
    Success,

    /// The iteration budget ran out. The system is still usable for
    /// best-effort simplification, but normal forms may not be unique.
    MaxIterations,

    /// A critical pair produced a rule deeper than the cap, which usually
    /// means the signature's word problem needs a bigger budget or has no
    /// finite completion at all.
    MaxDepth,
}

/// The rule store and completion driver for one generic signature.
///
/// Rules are append-only and addressed by index; retired rules become
/// tombstones so worklist entries stay valid. The protocol oracle is
/// borrowed for the lifetime of the system. One system serves one
/// signature on one thread; callers wanting parallelism build independent
/// systems.
pub struct RewriteSystem<'a> {
    rules: Vec<Rule>,

    /// Unordered index pairs (i, j) with i <= j that have not been checked
    /// for overlaps yet. The self pair (k, k) is queued too, because a
    /// left-hand side can properly overlap itself.
    worklist: VecDeque<(usize, usize)>,

    protocols: &'a dyn ProtocolOracle,

    initialized: bool,

    /// Prints every added rule to stderr.
    pub debug_add: bool,

    /// Prints every rewrite step taken by simplify to stderr.
    pub debug_simplify: bool,
}

impl<'a> RewriteSystem<'a> {
    pub fn new(protocols: &'a dyn ProtocolOracle) -> RewriteSystem<'a> {
        RewriteSystem {
            rules: Vec::new(),
            worklist: VecDeque::new(),
            protocols,
            initialized: false,
            debug_add: false,
            debug_simplify: false,
        }
    }

    /// Seeds the system with the requirement rules from the translator,
    /// orienting each pair. Must be called exactly once, before any other
    /// operation.
    pub fn initialize(&mut self, rules: Vec<(Term, Term)>) {
        assert!(!self.initialized, "rewrite system initialized twice");
        self.initialized = true;
        for (lhs, rhs) in rules {
            self.add_rule(lhs, rhs);
        }
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn get_rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn iter_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Adds one rule, keeping the store normalized. Both sides are reduced
    /// first; a rule whose sides coincide is trivial and adds nothing.
    /// Otherwise the pair is oriented, appended, queued for overlap checks
    /// against every live rule, and any older rule whose left-hand side the
    /// newcomer can reduce is retired and its equation re-added in
    /// normalized form. Returns whether the rule set changed.
    pub fn add_rule(&mut self, mut lhs: Term, mut rhs: Term) -> bool {
        assert!(self.initialized, "rewrite system used before initialize");

        self.simplify(&mut lhs);
        self.simplify(&mut rhs);

        match lhs.compare(&rhs, self.protocols) {
            Ordering::Equal => return false,
            Ordering::Less => std::mem::swap(&mut lhs, &mut rhs),
            Ordering::Greater => {}
        }

        let new_index = self.rules.len();
        self.rules.push(Rule::new(lhs, rhs));
        if self.debug_add {
            eprintln!("# rule {}: {}", new_index, self.rules[new_index]);
        }

        for j in 0..new_index {
            if !self.rules[j].is_deleted() {
                self.worklist.push_back((j, new_index));
            }
        }
        self.worklist.push_back((new_index, new_index));

        // Inter-reduction. Retiring without re-adding would lose the
        // retired rule's equation, so each one goes back through add_rule,
        // which re-simplifies and re-orients it. The recursion terminates:
        // every re-added left-hand side is strictly smaller under shortlex.
        let mut requeue = Vec::new();
        for j in 0..new_index {
            if self.rules[j].is_deleted() {
                continue;
            }
            if self.rules[j].can_reduce_left_hand_side(&self.rules[new_index]) {
                self.rules[j].mark_deleted();
                requeue.push((self.rules[j].lhs().clone(), self.rules[j].rhs().clone()));
            }
        }
        for (lhs, rhs) in requeue {
            self.add_rule(lhs, rhs);
        }

        true
    }

    /// Reduces `term` to its normal form under the live rules, in place.
    /// Returns whether anything changed.
    ///
    /// Live rules are scanned in index order and only the leftmost match is
    /// rewritten, so the result is a pure function of the term and the live
    /// rule set. Termination follows from the reduction order: every step
    /// strictly decreases the term.
    pub fn simplify(&self, term: &mut Term) -> bool {
        assert!(self.initialized, "rewrite system used before initialize");

        let mut changed = false;
        loop {
            let mut fired = false;
            for (index, rule) in self.rules.iter().enumerate() {
                if rule.is_deleted() {
                    continue;
                }
                if self.debug_simplify {
                    let before = term.clone();
                    if rule.apply(term) {
                        eprintln!("# simplify: {} -> {} (rule {})", before, term, index);
                        fired = true;
                    }
                } else {
                    fired = rule.apply(term);
                }
                if fired {
                    changed = true;
                    break;
                }
            }
            if !fired {
                return changed;
            }
        }
    }

    /// All critical pairs arising from overlaps of rule `i` with rule `j`,
    /// with `j`'s match starting inside `i`'s left-hand side. For each
    /// superposition, the pair is the two one-step reducts: rule `i`
    /// applied at the start and rule `j` applied at the overlap position.
    fn critical_pairs(&self, i: usize, j: usize) -> Vec<(Term, Term)> {
        let lhs_i = self.rules[i].lhs();
        let lhs_j = self.rules[j].lhs();
        let mut pairs = Vec::new();
        for pos in 0..lhs_i.len() {
            if i == j && pos == 0 {
                // A rule contains itself trivially and both reducts are
                // its own right-hand side.
                continue;
            }
            let superposition = match lhs_i.overlap_at(lhs_j, pos) {
                Some(term) => term,
                None => continue,
            };
            let mut first = superposition.clone();
            first.replace_range(0, lhs_i.len(), self.rules[i].rhs());
            let mut second = superposition;
            second.replace_range(pos, lhs_j.len(), self.rules[j].rhs());
            pairs.push((first, second));
        }
        pairs
    }

    /// Closes the rule set under critical pairs, Knuth-Bendix style.
    ///
    /// Pairs of rules come off the worklist; every overlap of their
    /// left-hand sides yields a critical pair whose two sides must reduce
    /// to the same normal form. When they do not, the oriented difference
    /// becomes a new rule and new pairs enter the worklist. An empty
    /// worklist means every superposition joins.
    pub fn compute_confluent_completion(
        &mut self,
        max_iterations: usize,
        max_depth: usize,
    ) -> CompletionResult {
        assert!(self.initialized, "rewrite system used before initialize");

        let mut iterations = 0;
        while let Some((i, j)) = self.worklist.pop_front() {
            iterations += 1;
            if iterations > max_iterations {
                return CompletionResult::MaxIterations;
            }

            // Both orientations of the unordered pair matter: a suffix of
            // either left-hand side can start the other.
            let directions = if i == j {
                vec![(i, i)]
            } else {
                vec![(i, j), (j, i)]
            };
            for (first, second) in directions {
                if self.rules[first].is_deleted() || self.rules[second].is_deleted() {
                    continue;
                }
                for (left, right) in self.critical_pairs(first, second) {
                    if !self.add_rule(left, right) {
                        // Both reducts already share a normal form, so the
                        // system is locally confluent at this overlap.
                        continue;
                    }
                    if self
                        .rules
                        .iter()
                        .any(|rule| !rule.is_deleted() && rule.depth() > max_depth)
                    {
                        return CompletionResult::MaxDepth;
                    }
                }
            }
        }
        CompletionResult::Success
    }

    /// Writes every rule, live and deleted, in index order. Debug output,
    /// not a stable format.
    pub fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "rewrite system {{")?;
        for (index, rule) in self.rules.iter().enumerate() {
            writeln!(out, "  {}: {}", index, rule)?;
        }
        writeln!(out, "}}")
    }
}

impl fmt::Display for RewriteSystem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.dump(f)
    }
}
