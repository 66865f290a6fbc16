use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol_graph::{ProtocolId, ProtocolOracle};

/// A canonical generic parameter, identified by its position in the
/// enclosing generic context rather than by name.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GenericParam {
    pub depth: u16,
    pub index: u16,
}

impl GenericParam {
    pub fn new(depth: u16, index: u16) -> GenericParam {
        GenericParam { depth, index }
    }
}

impl fmt::Display for GenericParam {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "τ_{}_{}", self.depth, self.index)
    }
}

/// A layout constraint drawn from the closed set of known layouts.
/// The derived order is the fixed enumeration order used as a tiebreak
/// when comparing layout atoms.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum LayoutConstraint {
    AnyObject,
    NativeClass,
    Trivial,
    TrivialOfSize(u32),
}

impl LayoutConstraint {
    pub fn parse(s: &str) -> Option<LayoutConstraint> {
        match s {
            "AnyObject" => Some(LayoutConstraint::AnyObject),
            "NativeClass" => Some(LayoutConstraint::NativeClass),
            "Trivial" => Some(LayoutConstraint::Trivial),
            _ => {
                let size = s.strip_prefix("Trivial(")?.strip_suffix(')')?;
                size.parse().ok().map(LayoutConstraint::TrivialOfSize)
            }
        }
    }
}

impl fmt::Display for LayoutConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LayoutConstraint::AnyObject => write!(f, "AnyObject"),
            LayoutConstraint::NativeClass => write!(f, "NativeClass"),
            LayoutConstraint::Trivial => write!(f, "Trivial"),
            LayoutConstraint::TrivialOfSize(size) => write!(f, "Trivial({})", size),
        }
    }
}

/// Discriminant for the atom variants. The derived order is the comparison
/// rank: protocols sort first so that conformance prefixes are the cheapest
/// terms, which is what lets conformance requirements reduce.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AtomKind {
    Protocol,
    AssociatedType,
    GenericParam,
    Name,
    Layout,
}

/// One symbol of a term. An atom does not have any internal structure the
/// rewrite engine cares about beyond what the variant carries; terms are
/// flat sequences of these.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Atom {
    /// An unresolved member label, not yet associated with any protocol.
    Name(String),

    /// Conformance to a single protocol.
    Protocol(ProtocolId),

    /// A named associated type, shared by every protocol in the list.
    /// The translator guarantees the list also contains every protocol
    /// that inherits the defining one.
    AssociatedType {
        protocols: Vec<ProtocolId>,
        name: String,
    },

    /// A canonical generic parameter.
    GenericParam(GenericParam),

    /// A layout constraint from the known set.
    Layout(LayoutConstraint),
}

impl Atom {
    pub fn name(name: &str) -> Atom {
        Atom::Name(name.to_string())
    }

    pub fn protocol(proto: ProtocolId) -> Atom {
        Atom::Protocol(proto)
    }

    pub fn associated_type(protocols: Vec<ProtocolId>, name: &str) -> Atom {
        assert!(
            !protocols.is_empty(),
            "associated type atom '{}' needs at least one protocol",
            name
        );
        Atom::AssociatedType {
            protocols,
            name: name.to_string(),
        }
    }

    pub fn generic_param(depth: u16, index: u16) -> Atom {
        Atom::GenericParam(GenericParam::new(depth, index))
    }

    pub fn layout(layout: LayoutConstraint) -> Atom {
        Atom::Layout(layout)
    }

    pub fn kind(&self) -> AtomKind {
        match self {
            Atom::Name(_) => AtomKind::Name,
            Atom::Protocol(_) => AtomKind::Protocol,
            Atom::AssociatedType { .. } => AtomKind::AssociatedType,
            Atom::GenericParam(_) => AtomKind::GenericParam,
            Atom::Layout(_) => AtomKind::Layout,
        }
    }

    /// The identifier of a name or associated type atom.
    pub fn get_name(&self) -> &str {
        match self {
            Atom::Name(name) => name,
            Atom::AssociatedType { name, .. } => name,
            _ => panic!("get_name called on {:?}", self),
        }
    }

    /// The single protocol of a protocol atom.
    pub fn get_protocol(&self) -> ProtocolId {
        match self {
            Atom::Protocol(proto) => *proto,
            _ => panic!("get_protocol called on {:?}", self),
        }
    }

    /// The protocols of a protocol or associated type atom.
    pub fn get_protocols(&self) -> &[ProtocolId] {
        match self {
            Atom::Protocol(proto) => std::slice::from_ref(proto),
            Atom::AssociatedType { protocols, .. } => protocols,
            _ => panic!("get_protocols called on {:?}", self),
        }
    }

    pub fn get_generic_param(&self) -> GenericParam {
        match self {
            Atom::GenericParam(param) => *param,
            _ => panic!("get_generic_param called on {:?}", self),
        }
    }

    pub fn get_layout(&self) -> LayoutConstraint {
        match self {
            Atom::Layout(layout) => *layout,
            _ => panic!("get_layout called on {:?}", self),
        }
    }

    /// Total order on atoms, the tiebreak of the shortlex term order.
    /// Atoms of different kinds compare by kind; within a kind, protocol
    /// atoms follow the oracle order, associated types compare
    /// lexicographically by protocol list and then by identifier, and the
    /// remaining kinds have self-evident orders.
    pub fn compare(&self, other: &Atom, protocols: &dyn ProtocolOracle) -> Ordering {
        let kind_cmp = self.kind().cmp(&other.kind());
        if kind_cmp != Ordering::Equal {
            return kind_cmp;
        }

        match (self, other) {
            (Atom::Protocol(p), Atom::Protocol(q)) => {
                protocols.protocol_order(*p).cmp(&protocols.protocol_order(*q))
            }
            (
                Atom::AssociatedType {
                    protocols: ps,
                    name: a,
                },
                Atom::AssociatedType {
                    protocols: qs,
                    name: b,
                },
            ) => {
                for (p, q) in ps.iter().zip(qs.iter()) {
                    let cmp =
                        protocols.protocol_order(*p).cmp(&protocols.protocol_order(*q));
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                let len_cmp = ps.len().cmp(&qs.len());
                if len_cmp != Ordering::Equal {
                    return len_cmp;
                }
                a.cmp(b)
            }
            (Atom::GenericParam(a), Atom::GenericParam(b)) => a.cmp(b),
            (Atom::Name(a), Atom::Name(b)) => a.cmp(b),
            (Atom::Layout(a), Atom::Layout(b)) => a.cmp(b),
            _ => unreachable!("kinds already compared"),
        }
    }

    pub fn new(s: &str) -> Atom {
        match Atom::parse(s) {
            Some(atom) => atom,
            None => panic!("failed to parse atom: '{}'", s),
        }
    }

    /// Parses the `Display` syntax back into an atom: `[p0]` is a protocol,
    /// `[p0:Elem]` and `[p0&p1:Elem]` are associated types, `τ_0_0` is a
    /// generic parameter, bracketed layout names are layouts, and anything
    /// else is a bare name. Good enough for tests and the command line,
    /// not a stable format.
    pub fn parse(s: &str) -> Option<Atom> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(rest) = s.strip_prefix("τ_") {
            let mut parts = rest.split('_');
            let depth = parts.next()?.parse().ok()?;
            let index = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            return Some(Atom::generic_param(depth, index));
        }

        if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if let Some((protos, name)) = inner.split_once(':') {
                let mut ids = Vec::new();
                for part in protos.split('&') {
                    ids.push(part.strip_prefix('p')?.parse().ok()?);
                }
                return Some(Atom::associated_type(ids, name));
            }
            if let Some(id) = inner.strip_prefix('p') {
                if let Ok(id) = id.parse() {
                    return Some(Atom::Protocol(id));
                }
            }
            return LayoutConstraint::parse(inner).map(Atom::Layout);
        }

        Some(Atom::Name(s.to_string()))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Atom::Name(name) => write!(f, "{}", name),
            Atom::Protocol(proto) => write!(f, "[p{}]", proto),
            Atom::AssociatedType { protocols, name } => {
                write!(f, "[")?;
                for (i, proto) in protocols.iter().enumerate() {
                    if i > 0 {
                        write!(f, "&")?;
                    }
                    write!(f, "p{}", proto)?;
                }
                write!(f, ":{}]", name)
            }
            Atom::GenericParam(param) => write!(f, "{}", param),
            Atom::Layout(layout) => write!(f, "[{}]", layout),
        }
    }
}
