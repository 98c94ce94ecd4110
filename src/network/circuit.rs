use std::fmt;

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::network::node::{GateMode, Node, NodeId, NodeKind, Port};

/// Pending work of a connection
enum Step {
    /// Apply the connection contract between two nodes
    Connect(NodeId, NodeId),
    /// Record an edge between two leaves
    Link(NodeId, NodeId),
}

/// Arena of gates, timers and containers, wired before compilation
///
/// Nodes are addressed by [`NodeId`] and never removed. Ports and edges are stored as
/// id lists, so that leaves can list themselves as their own port.
/// The payload type is chosen by the exporter and never interpreted here.
#[derive(Debug, Clone)]
pub struct Circuit<P = ()> {
    nodes: Vec<Node<P>>,
}

impl<P> Default for Circuit<P> {
    fn default() -> Self {
        Circuit { nodes: Vec::new() }
    }
}

impl<P> Circuit<P> {
    /// Create a new circuit
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of nodes, containers included
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Get the node with the given id
    pub fn node(&self, n: NodeId) -> &Node<P> {
        &self.nodes[n.index()]
    }

    pub(crate) fn node_mut(&mut self, n: NodeId) -> &mut Node<P> {
        &mut self.nodes[n.index()]
    }

    /// Iterate over all node ids, in creation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nb_nodes()).map(NodeId::from_index)
    }

    /// Add a node, and make leaves their own single port
    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let n = NodeId::from_index(self.nodes.len());
        let mut node = Node::new(kind);
        if kind.is_leaf() {
            node.input_ports = vec![Port::Single(n)];
            node.output_ports = vec![Port::Single(n)];
        }
        self.nodes.push(node);
        n
    }

    /// Add a logic gate
    pub fn add_gate(&mut self, mode: GateMode) -> NodeId {
        self.add_node(NodeKind::Gate { mode })
    }

    /// Add a logic gate from the name of its mode
    ///
    /// Fails with [`Error::InvalidMode`] without creating anything if the name is unknown.
    pub fn add_gate_named(&mut self, mode: &str) -> Result<NodeId> {
        let mode = mode.parse::<GateMode>()?;
        Ok(self.add_gate(mode))
    }

    /// Add a timer
    pub fn add_timer(&mut self, ticks: u32, seconds: u32) -> NodeId {
        self.add_node(NodeKind::Timer { ticks, seconds })
    }

    /// Add a container exposing the given ports
    pub fn add_container(&mut self, inputs: Vec<Port>, outputs: Vec<Port>) -> NodeId {
        let n = self.add_node(NodeKind::Container);
        self.set_input_ports(n, inputs);
        self.set_output_ports(n, outputs);
        n
    }

    /// Replace the input ports of a container
    pub fn set_input_ports(&mut self, n: NodeId, ports: Vec<Port>) {
        assert!(!self.node(n).is_leaf(), "ports of a leaf are the leaf itself");
        self.node_mut(n).input_ports = ports;
    }

    /// Replace the output ports of a container
    pub fn set_output_ports(&mut self, n: NodeId, ports: Vec<Port>) {
        assert!(!self.node(n).is_leaf(), "ports of a leaf are the leaf itself");
        self.node_mut(n).output_ports = ports;
    }

    /// Mark a node as a designated input or output, exempt from dead-code elimination
    pub fn pin(&mut self, n: NodeId) {
        self.node_mut(n).pinned = true;
    }

    /// Pin every leaf exposed by the ports of a node, through nested containers
    pub fn pin_ports(&mut self, n: NodeId) {
        let node = self.node(n);
        let mut leaves = self.expand_leaves(&node.input_ports, true);
        leaves.extend(self.expand_leaves(&node.output_ports, false));
        for l in leaves {
            self.pin(l);
        }
    }

    /// Attach an exporter payload to a node
    pub fn set_payload(&mut self, n: NodeId, payload: P) {
        self.node_mut(n).payload = Some(payload);
    }

    /// Leaves behind the input ports of a node, one list per port slot
    pub fn input_leaves(&self, n: NodeId) -> Vec<Vec<NodeId>> {
        self.node(n)
            .input_ports
            .iter()
            .map(|p| self.expand_leaves(std::slice::from_ref(p), true))
            .collect()
    }

    /// Leaves behind the output ports of a node, one list per port slot
    pub fn output_leaves(&self, n: NodeId) -> Vec<Vec<NodeId>> {
        self.node(n)
            .output_ports
            .iter()
            .map(|p| self.expand_leaves(std::slice::from_ref(p), false))
            .collect()
    }

    /// Resolve ports to leaves, looking through the same side of nested containers
    fn expand_leaves(&self, ports: &[Port], inputs: bool) -> Vec<NodeId> {
        let mut ret = Vec::new();
        let mut seen = FxHashSet::default();
        let mut to_visit = ports
            .iter()
            .flat_map(|p| p.nodes().iter().copied())
            .collect_vec();
        to_visit.reverse();
        while let Some(n) = to_visit.pop() {
            if !seen.insert(n) {
                continue;
            }
            let node = self.node(n);
            if node.is_leaf() {
                ret.push(n);
                continue;
            }
            let nested = if inputs {
                &node.input_ports
            } else {
                &node.output_ports
            };
            for p in nested.iter().rev() {
                to_visit.extend(p.nodes().iter().rev());
            }
        }
        ret
    }

    /// Connect the output ports of a node to the input ports of another
    ///
    /// Port slots are matched by position. Every node behind a sender slot is linked to every
    /// node behind the matching receiver slot, buses included. Two leaves are linked directly;
    /// a container on either side is connected in turn with the same contract.
    ///
    /// Fails with [`Error::ArityMismatch`] if the number of slots differ and the mismatch
    /// is not allowed, in which case nothing is wired. When allowed, only the first
    /// `min(outputs, inputs)` slots are connected. Edges accumulate over repeated calls.
    pub fn connect(
        &mut self,
        sender: NodeId,
        receiver: NodeId,
        allow_arity_mismatch: bool,
    ) -> Result<()> {
        let mut expanded = FxHashSet::default();
        let mut pending = vec![Step::Connect(sender, receiver)];
        while let Some(step) = pending.pop() {
            match step {
                Step::Link(a, b) => self.link(a, b),
                Step::Connect(s, r) => {
                    if !expanded.insert((s, r)) {
                        continue;
                    }
                    let steps = self.connection_steps(s, r, allow_arity_mismatch)?;
                    pending.extend(steps.into_iter().rev());
                }
            }
        }
        Ok(())
    }

    /// Check the contract between two nodes and list the resulting work, in order
    fn connection_steps(
        &self,
        sender: NodeId,
        receiver: NodeId,
        allow_arity_mismatch: bool,
    ) -> Result<Vec<Step>> {
        let outputs = &self.node(sender).output_ports;
        let inputs = &self.node(receiver).input_ports;
        if outputs.is_empty() {
            return Err(Error::NoPorts { node: sender });
        }
        if inputs.is_empty() {
            return Err(Error::NoPorts { node: receiver });
        }
        if outputs.len() != inputs.len() && !allow_arity_mismatch {
            return Err(Error::ArityMismatch {
                sender,
                receiver,
                outputs: outputs.len(),
                inputs: inputs.len(),
            });
        }
        let mut steps = Vec::new();
        for (out, inp) in outputs.iter().zip(inputs.iter()) {
            for (&a, &b) in out.nodes().iter().cartesian_product(inp.nodes().iter()) {
                if self.node(a).is_leaf() && self.node(b).is_leaf() {
                    steps.push(Step::Link(a, b));
                } else if (a, b) != (sender, receiver) {
                    steps.push(Step::Connect(a, b));
                }
            }
        }
        Ok(steps)
    }

    /// Record a directed edge, on both ends
    pub(crate) fn link(&mut self, a: NodeId, b: NodeId) {
        self.node_mut(a).forward_edges.push(b);
        self.node_mut(b).backward_edges.push(a);
    }

    /// Check that forward and backward edges mirror each other
    pub fn check(&self) {
        for a in self.ids() {
            for &b in self.node(a).forward_edges() {
                let fwd = self.node(a).forward_edges().iter().filter(|n| **n == b).count();
                let bwd = self.node(b).backward_edges().iter().filter(|n| **n == a).count();
                assert_eq!(fwd, bwd, "Edge {a} -> {b} is not mirrored");
            }
            for &b in self.node(a).backward_edges() {
                assert!(
                    self.node(b).forward_edges().contains(&a),
                    "Edge {b} -> {a} is not mirrored"
                );
            }
        }
    }
}

impl<P> fmt::Display for Circuit<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit with {} nodes:", self.nb_nodes())?;
        for n in self.ids() {
            let node = self.node(n);
            let kind = match node.kind() {
                NodeKind::Container => "container".to_string(),
                NodeKind::Gate { mode } => mode.to_string(),
                NodeKind::Timer { ticks, seconds } => format!("timer {seconds}s {ticks}t"),
            };
            writeln!(
                f,
                "\t{}{} = {} -> [{}]",
                n,
                if node.is_pinned() { "*" } else { "" },
                kind,
                node.forward_edges().iter().join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_ports() {
        let mut c = Circuit::<()>::new();
        let g = c.add_gate(GateMode::And);
        let t = c.add_timer(3, 1);
        assert_eq!(c.node(g).input_ports(), &[Port::Single(g)]);
        assert_eq!(c.node(g).output_ports(), &[Port::Single(g)]);
        assert_eq!(c.node(t).output_ports(), &[Port::Single(t)]);
        assert_eq!(c.node(g).id(), None);
    }

    #[test]
    fn test_invalid_mode() {
        let mut c = Circuit::<()>::new();
        assert!(matches!(c.add_gate_named("maj"), Err(Error::InvalidMode(_))));
        assert_eq!(c.nb_nodes(), 0);
        let g = c.add_gate_named("Xor").unwrap();
        assert_eq!(c.node(g).kind(), NodeKind::Gate { mode: GateMode::Xor });
    }

    #[test]
    fn test_connect_gates() {
        let mut c = Circuit::<()>::new();
        let g1 = c.add_gate(GateMode::And);
        let g2 = c.add_gate(GateMode::Or);
        c.connect(g1, g2, false).unwrap();
        assert_eq!(c.node(g1).forward_edges(), &[g2]);
        assert_eq!(c.node(g2).backward_edges(), &[g1]);
        assert!(c.node(g1).backward_edges().is_empty());
        assert!(c.node(g2).forward_edges().is_empty());

        // Edges accumulate
        c.connect(g1, g2, false).unwrap();
        assert_eq!(c.node(g1).forward_edges(), &[g2, g2]);
        assert_eq!(c.node(g2).backward_edges(), &[g1, g1]);
        c.check();
    }

    #[test]
    fn test_self_loop() {
        let mut c = Circuit::<()>::new();
        let g = c.add_gate(GateMode::Xor);
        c.connect(g, g, false).unwrap();
        assert_eq!(c.node(g).forward_edges(), &[g]);
        assert_eq!(c.node(g).backward_edges(), &[g]);
    }

    #[test]
    fn test_arity_mismatch() {
        let mut c = Circuit::<()>::new();
        let a = c.add_gate(GateMode::And);
        let b = c.add_gate(GateMode::And);
        let x = c.add_gate(GateMode::Or);
        let comp = c.add_container(vec![a.into(), b.into()], vec![x.into()]);
        let src = c.add_gate(GateMode::And);

        let res = c.connect(src, comp, false);
        assert!(matches!(
            res,
            Err(Error::ArityMismatch {
                outputs: 1,
                inputs: 2,
                ..
            })
        ));
        for n in c.ids() {
            assert!(c.node(n).forward_edges().is_empty());
            assert!(c.node(n).backward_edges().is_empty());
        }

        // Only the first slot is wired when the mismatch is allowed
        c.connect(src, comp, true).unwrap();
        assert_eq!(c.node(src).forward_edges(), &[a]);
        assert!(c.node(b).backward_edges().is_empty());
        c.check();
    }

    #[test]
    fn test_no_ports() {
        let mut c = Circuit::<()>::new();
        let g = c.add_gate(GateMode::And);
        let empty = c.add_container(Vec::new(), Vec::new());
        assert!(matches!(
            c.connect(g, empty, true),
            Err(Error::NoPorts { node }) if node == empty
        ));
        assert!(matches!(
            c.connect(empty, g, true),
            Err(Error::NoPorts { node }) if node == empty
        ));
    }

    #[test]
    fn test_bus_ports() {
        let mut c = Circuit::<()>::new();
        let s0 = c.add_gate(GateMode::Or);
        let s1 = c.add_gate(GateMode::Or);
        let r0 = c.add_gate(GateMode::And);
        let r1 = c.add_gate(GateMode::And);
        let r2 = c.add_gate(GateMode::And);
        let sender = c.add_container(Vec::new(), vec![vec![s0, s1].into()]);
        let receiver = c.add_container(vec![vec![r0, r1].into(), r2.into()], Vec::new());
        c.connect(sender, receiver, true).unwrap();

        // Every bus line drives every receiving line of the same slot
        assert_eq!(c.node(s0).forward_edges(), &[r0, r1]);
        assert_eq!(c.node(s1).forward_edges(), &[r0, r1]);
        assert_eq!(c.node(r0).backward_edges(), &[s0, s1]);
        assert!(c.node(r2).backward_edges().is_empty());
        assert!(c.node(sender).forward_edges().is_empty());
        c.check();
    }

    #[test]
    fn test_nested_containers() {
        let mut c = Circuit::<()>::new();
        let g = c.add_gate(GateMode::And);
        let h = c.add_gate(GateMode::Nor);
        let inner = c.add_container(vec![h.into()], Vec::new());
        let outer = c.add_container(vec![inner.into()], Vec::new());
        c.connect(g, outer, false).unwrap();
        assert_eq!(c.node(g).forward_edges(), &[h]);
        assert_eq!(c.node(h).backward_edges(), &[g]);

        // A container listing itself does not loop
        let looped = c.add_container(Vec::new(), Vec::new());
        c.set_input_ports(looped, vec![vec![looped, h].into()]);
        c.connect(g, looped, false).unwrap();
        assert_eq!(c.node(g).forward_edges(), &[h, h]);
        c.check();
    }

    #[test]
    fn test_nested_mismatch() {
        let mut c = Circuit::<()>::new();
        let g = c.add_gate(GateMode::And);
        let h0 = c.add_gate(GateMode::And);
        let h1 = c.add_gate(GateMode::And);
        let h2 = c.add_gate(GateMode::And);
        let inner = c.add_container(vec![h1.into(), h2.into()], Vec::new());
        let outer = c.add_container(vec![vec![h0, inner].into()], Vec::new());
        // The nested container fails its own arity check after the first line is wired
        assert!(matches!(
            c.connect(g, outer, false),
            Err(Error::ArityMismatch { receiver, .. }) if receiver == inner
        ));
        assert_eq!(c.node(g).forward_edges(), &[h0]);
        c.check();
    }

    #[test]
    fn test_pin_ports() {
        let mut c = Circuit::<()>::new();
        let a = c.add_gate(GateMode::And);
        let b = c.add_gate(GateMode::And);
        let x = c.add_gate(GateMode::Or);
        let inner = c.add_container(vec![b.into()], Vec::new());
        let comp = c.add_container(vec![a.into(), inner.into()], vec![x.into()]);
        c.pin_ports(comp);
        assert!(c.node(a).is_pinned());
        assert!(c.node(b).is_pinned());
        assert!(c.node(x).is_pinned());
        assert!(!c.node(comp).is_pinned());
        assert_eq!(c.input_leaves(comp), vec![vec![a], vec![b]]);
        assert_eq!(c.output_leaves(comp), vec![vec![x]]);
    }
}
