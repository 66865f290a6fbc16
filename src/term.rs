use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::protocol_graph::ProtocolOracle;

/// A term is a sequence of atoms read left to right: the member path
/// `T.Element.Index` is a generic parameter atom followed by two associated
/// type atoms. Juxtaposition is the only operation; there are no algebraic
/// identities between atoms, so substring search is plain scanning.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Term {
    atoms: Vec<Atom>,
}

impl Term {
    /// An empty term, only useful as a builder. Terms that participate in
    /// rules always have at least one atom.
    pub fn new() -> Term {
        Term { atoms: Vec::new() }
    }

    pub fn from_atoms(atoms: Vec<Atom>) -> Term {
        Term { atoms }
    }

    pub fn atom(atom: Atom) -> Term {
        Term { atoms: vec![atom] }
    }

    pub fn add(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<Atom> {
        self.atoms.iter()
    }

    /// The position of the leftmost occurrence of `other` in this term.
    pub fn find_subterm(&self, other: &Term) -> Option<usize> {
        if other.is_empty() || other.len() > self.len() {
            return None;
        }
        (0..=self.len() - other.len())
            .find(|&start| self.atoms[start..start + other.len()] == other.atoms[..])
    }

    pub fn contains_subterm(&self, other: &Term) -> bool {
        self.find_subterm(other).is_some()
    }

    /// Replaces the leftmost occurrence of `lhs` with `rhs` in place.
    /// Returns whether anything matched; callers iterate to a fixed point.
    pub fn rewrite_subterm(&mut self, lhs: &Term, rhs: &Term) -> bool {
        match self.find_subterm(lhs) {
            Some(start) => {
                self.replace_range(start, lhs.len(), rhs);
                true
            }
            None => false,
        }
    }

    /// Splices `replacement` over the `len` atoms starting at `start`.
    pub(crate) fn replace_range(&mut self, start: usize, len: usize, replacement: &Term) {
        self.atoms
            .splice(start..start + len, replacement.atoms.iter().cloned());
    }

    /// Checks for an overlap with `other` starting at `pos`: either `other`
    /// fits entirely inside this term there, or it runs off the end and the
    /// tail of this term matches a prefix of `other`. On a match, returns
    /// the superposition, the shortest term containing this term at
    /// position zero and `other` at `pos`.
    pub(crate) fn overlap_at(&self, other: &Term, pos: usize) -> Option<Term> {
        let remaining = self.len() - pos;
        if other.len() <= remaining {
            if self.atoms[pos..pos + other.len()] == other.atoms[..] {
                return Some(self.clone());
            }
        } else if self.atoms[pos..] == other.atoms[..remaining] {
            let mut superposition = self.clone();
            for atom in &other.atoms[remaining..] {
                superposition.add(atom.clone());
            }
            return Some(superposition);
        }
        None
    }

    /// Whether this term and `other` admit a critical overlap: `other`
    /// occurs inside this term, or a non-empty suffix of this term is a
    /// non-empty prefix of `other`. Returns the leftmost superposition.
    pub fn overlaps(&self, other: &Term) -> Option<Term> {
        (0..self.len()).find_map(|pos| self.overlap_at(other, pos))
    }

    /// Shortlex: length first, then atom by atom. This is the reduction
    /// order for the whole engine. It is monotone under juxtaposition and
    /// well founded, so every rewrite strictly decreases a term and
    /// simplification terminates.
    pub fn compare(&self, other: &Term, protocols: &dyn ProtocolOracle) -> Ordering {
        let len_cmp = self.len().cmp(&other.len());
        if len_cmp != Ordering::Equal {
            return len_cmp;
        }
        for (a, b) in self.atoms.iter().zip(other.atoms.iter()) {
            let atom_cmp = a.compare(b, protocols);
            if atom_cmp != Ordering::Equal {
                return atom_cmp;
            }
        }
        Ordering::Equal
    }

    /// Parses the dotted `Display` syntax, panicking on malformed input.
    /// A test and command line helper, not a stable format.
    pub fn parse(s: &str) -> Term {
        let mut atoms = Vec::new();
        for part in s.trim().split('.') {
            atoms.push(Atom::new(part));
        }
        Term { atoms }
    }
}

impl Index<usize> for Term {
    type Output = Atom;

    fn index(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", atom)?;
        }
        Ok(())
    }
}
