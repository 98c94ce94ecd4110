use core::slice;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Index of a node in its [`Circuit`](crate::Circuit)
///
/// Ids are only meaningful for the circuit that created them.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node id from an arena index
    pub(crate) fn from_index(i: usize) -> NodeId {
        NodeId(i as u32)
    }

    /// Obtain the arena index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A port slot: one node, or a bus of nodes sharing the same bit position
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Port {
    /// A single node
    Single(NodeId),
    /// Several nodes driven and read as one bit
    Bus(Vec<NodeId>),
}

impl Port {
    /// Nodes behind the port, as a list of one for a single node
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Port::Single(n) => slice::from_ref(n),
            Port::Bus(v) => v,
        }
    }

    /// Returns whether the port is a bus
    pub fn is_bus(&self) -> bool {
        matches!(self, Port::Bus(_))
    }
}

impl From<NodeId> for Port {
    fn from(n: NodeId) -> Port {
        Port::Single(n)
    }
}

impl From<Vec<NodeId>> for Port {
    fn from(v: Vec<NodeId>) -> Port {
        Port::Bus(v)
    }
}

impl From<&[NodeId]> for Port {
    fn from(v: &[NodeId]) -> Port {
        Port::Bus(v.to_vec())
    }
}

/// Function computed by a logic gate
///
/// The numeric encoding (0 to 5, in declaration order) is the one used by exported parts.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GateMode {
    /// Active when all inputs are active
    And,
    /// Active when any input is active
    Or,
    /// Active when an odd number of inputs are active
    Xor,
    /// Negated And
    Nand,
    /// Negated Or
    Nor,
    /// Negated Xor
    Xnor,
}

impl GateMode {
    /// All modes, in encoding order
    pub const ALL: [GateMode; 6] = [
        GateMode::And,
        GateMode::Or,
        GateMode::Xor,
        GateMode::Nand,
        GateMode::Nor,
        GateMode::Xnor,
    ];

    /// Numeric encoding of the mode
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name of the mode
    pub fn name(self) -> &'static str {
        match self {
            GateMode::And => "and",
            GateMode::Or => "or",
            GateMode::Xor => "xor",
            GateMode::Nand => "nand",
            GateMode::Nor => "nor",
            GateMode::Xnor => "xnor",
        }
    }

    /// Compute the output of the gate from its captured inputs
    ///
    /// A gate without any input is inactive, whatever its mode.
    pub fn evaluate(self, inputs: &[bool]) -> bool {
        if inputs.is_empty() {
            return false;
        }
        match self {
            GateMode::And => inputs.iter().all(|b| *b),
            GateMode::Or => inputs.iter().any(|b| *b),
            GateMode::Xor => inputs.iter().filter(|b| **b).count() % 2 == 1,
            GateMode::Nand => !GateMode::And.evaluate(inputs),
            GateMode::Nor => !GateMode::Or.evaluate(inputs),
            GateMode::Xnor => !GateMode::Xor.evaluate(inputs),
        }
    }
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().to_uppercase())
    }
}

impl FromStr for GateMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<GateMode, Error> {
        let lower = s.trim().to_lowercase();
        GateMode::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| Error::InvalidMode(s.to_string()))
    }
}

impl TryFrom<u8> for GateMode {
    type Error = Error;

    fn try_from(v: u8) -> Result<GateMode, Error> {
        GateMode::ALL
            .get(v as usize)
            .copied()
            .ok_or_else(|| Error::InvalidMode(v.to_string()))
    }
}

impl From<GateMode> for u8 {
    fn from(m: GateMode) -> u8 {
        m.as_u8()
    }
}

/// Kind of a node: structural container, or an exportable leaf
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum NodeKind {
    /// Aggregates the ports of other nodes; never exported
    Container,
    /// Logic gate
    Gate {
        /// Function of the gate
        mode: GateMode,
    },
    /// Delay element
    Timer {
        /// Delay, in frames, on top of the seconds
        ticks: u32,
        /// Delay, in seconds
        seconds: u32,
    },
}

impl NodeKind {
    /// Returns whether the node is a leaf (gate or timer)
    pub fn is_leaf(&self) -> bool {
        !matches!(self, NodeKind::Container)
    }
}

/// A node of the circuit graph
///
/// Leaves list themselves as their only input and output port, so that containers
/// can expose them directly.
#[derive(Debug, Clone)]
pub struct Node<P> {
    pub(crate) kind: NodeKind,
    pub(crate) input_ports: Vec<Port>,
    pub(crate) output_ports: Vec<Port>,
    pub(crate) forward_edges: Vec<NodeId>,
    pub(crate) backward_edges: Vec<NodeId>,
    pub(crate) pinned: bool,
    pub(crate) id: Option<u32>,
    pub(crate) payload: Option<P>,
}

impl<P> Node<P> {
    pub(crate) fn new(kind: NodeKind) -> Node<P> {
        Node {
            kind,
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            forward_edges: Vec::new(),
            backward_edges: Vec::new(),
            pinned: false,
            id: None,
            payload: None,
        }
    }

    /// Kind of the node
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns whether the node is a leaf (gate or timer)
    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Input port slots
    pub fn input_ports(&self) -> &[Port] {
        &self.input_ports
    }

    /// Output port slots
    pub fn output_ports(&self) -> &[Port] {
        &self.output_ports
    }

    /// Nodes this node feeds into
    pub fn forward_edges(&self) -> &[NodeId] {
        &self.forward_edges
    }

    /// Nodes feeding into this node
    pub fn backward_edges(&self) -> &[NodeId] {
        &self.backward_edges
    }

    /// Returns whether the node is a designated input or output
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Id assigned by the last compilation, if the node is part of the network
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    /// Payload attached for the exporter
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_table() {
        use GateMode::*;
        let patterns: [&[bool]; 4] = [
            &[false, false],
            &[true, false],
            &[false, true],
            &[true, true],
        ];
        let expected = [
            (And, [false, false, false, true]),
            (Or, [false, true, true, true]),
            (Xor, [false, true, true, false]),
            (Nand, [true, true, true, false]),
            (Nor, [true, false, false, false]),
            (Xnor, [true, false, false, true]),
        ];
        for (mode, values) in expected {
            for (p, v) in patterns.iter().zip(values) {
                assert_eq!(mode.evaluate(p), v, "{mode} on {p:?}");
            }
        }
    }

    #[test]
    fn test_xor_parity() {
        assert!(GateMode::Xor.evaluate(&[true, true, true]));
        assert!(!GateMode::Xor.evaluate(&[true, true, false]));
        assert!(!GateMode::Xnor.evaluate(&[true, false, false]));
    }

    #[test]
    fn test_no_input() {
        for mode in GateMode::ALL {
            assert!(!mode.evaluate(&[]));
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("and".parse::<GateMode>().unwrap(), GateMode::And);
        assert_eq!("XNOR".parse::<GateMode>().unwrap(), GateMode::Xnor);
        assert!(matches!(
            "nope".parse::<GateMode>(),
            Err(Error::InvalidMode(_))
        ));
        assert_eq!(GateMode::try_from(3).unwrap(), GateMode::Nand);
        assert!(GateMode::try_from(6).is_err());
        for mode in GateMode::ALL {
            assert_eq!(GateMode::try_from(mode.as_u8()).unwrap(), mode);
        }
    }

    #[test]
    fn test_ports() {
        let a = NodeId::from_index(0);
        let b = NodeId::from_index(1);
        assert_eq!(Port::from(a).nodes(), &[a]);
        assert_eq!(Port::from(vec![a, b]).nodes(), &[a, b]);
        assert!(Port::from(vec![a, b]).is_bus());
        assert_eq!(a.to_string(), "n0");
    }
}
