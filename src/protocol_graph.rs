use std::collections::{HashMap, HashSet};

pub type ProtocolId = u16;

/// The rewrite engine never inspects protocol declarations directly.
/// Everything it needs is a total order for term comparison and a
/// refinement test, supplied through this interface.
pub trait ProtocolOracle {
    /// Position of the protocol in a total order, stable for the lifetime
    /// of the oracle.
    fn protocol_order(&self, proto: ProtocolId) -> u32;

    /// Whether `proto` is a non-strict refinement of `other`.
    /// Every protocol inherits from itself.
    fn inherits(&self, proto: ProtocolId, other: ProtocolId) -> bool;
}

/// A precomputed view of the protocols appearing in one generic signature.
/// Protocols are linearized in insertion order and the inheritance relation
/// is stored as its reflexive-transitive closure, so oracle queries are
/// lookups.
pub struct ProtocolGraph {
    /// Maps each protocol to its position in the linearization.
    positions: HashMap<ProtocolId, u32>,

    /// Protocols in linearization order.
    order: Vec<ProtocolId>,

    /// All protocols each protocol refines, including itself.
    inherited: HashMap<ProtocolId, HashSet<ProtocolId>>,
}

impl ProtocolGraph {
    pub fn new() -> ProtocolGraph {
        ProtocolGraph {
            positions: HashMap::new(),
            order: Vec::new(),
            inherited: HashMap::new(),
        }
    }

    /// Registers a protocol. Insertion order is the linearization order.
    pub fn add_protocol(&mut self, proto: ProtocolId) {
        if self.positions.contains_key(&proto) {
            panic!("protocol p{} registered twice", proto);
        }
        self.positions.insert(proto, self.order.len() as u32);
        self.order.push(proto);
        let mut closure = HashSet::new();
        closure.insert(proto);
        self.inherited.insert(proto, closure);
    }

    /// Records that `sub` directly refines `sup` and refreshes the closure.
    pub fn add_inheritance(&mut self, sub: ProtocolId, sup: ProtocolId) {
        assert!(self.positions.contains_key(&sub), "unknown protocol p{}", sub);
        assert!(self.positions.contains_key(&sup), "unknown protocol p{}", sup);
        self.inherited.get_mut(&sub).unwrap().insert(sup);

        // Propagate to a fixpoint. Signatures mention a handful of
        // protocols, so the quadratic sweep is fine.
        loop {
            let mut changed = false;
            for &proto in &self.order {
                let supers: Vec<ProtocolId> =
                    self.inherited[&proto].iter().copied().collect();
                for sup in supers {
                    let indirect: Vec<ProtocolId> =
                        self.inherited[&sup].iter().copied().collect();
                    let closure = self.inherited.get_mut(&proto).unwrap();
                    for p in indirect {
                        changed |= closure.insert(p);
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    pub fn contains(&self, proto: ProtocolId) -> bool {
        self.positions.contains_key(&proto)
    }

    pub fn num_protocols(&self) -> usize {
        self.order.len()
    }
}

impl ProtocolOracle for ProtocolGraph {
    fn protocol_order(&self, proto: ProtocolId) -> u32 {
        match self.positions.get(&proto) {
            Some(position) => *position,
            None => panic!("protocol p{} is not in the graph", proto),
        }
    }

    fn inherits(&self, proto: ProtocolId, other: ProtocolId) -> bool {
        match self.inherited.get(&proto) {
            Some(closure) => closure.contains(&other),
            None => panic!("protocol p{} is not in the graph", proto),
        }
    }
}
