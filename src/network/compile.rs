use std::fmt;

use fxhash::FxHashSet;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::network::circuit::Circuit;
use crate::network::node::{Node, NodeId};

/// Options of the compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileConfig {
    /// Traversal depth budget; deeper branches are left out of the network
    pub max_depth: usize,
    /// Remove leaves that cannot influence any pinned leaf
    pub remove_dead_ends: bool,
    /// Also remove feedback loops that never reach a pinned leaf
    pub prune_dead_loops: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            max_depth: 900,
            remove_dead_ends: true,
            prune_dead_loops: true,
        }
    }
}

/// A circuit with a designated root, resolved into an ordered list of leaves
///
/// After [`compile`](Network::compile), each leaf of the network holds an id equal to
/// its position in [`leaves`](Network::leaves). Ids are not stable across compilations.
///
/// The network keeps its own copy of the edges, restricted to the listed leaves. Compiling
/// never changes the wiring of the circuit, so that compiling again gives the same result.
#[derive(Debug)]
pub struct Network<P = ()> {
    circuit: Circuit<P>,
    root: NodeId,
    pub(crate) leaves: Vec<NodeId>,
    containers: Vec<NodeId>,
    diagnostics: Vec<Error>,
    /// Forward edges of each node, by arena index
    pub(crate) forward: Vec<Vec<NodeId>>,
    /// Backward edges of each node, by arena index
    pub(crate) backward: Vec<Vec<NodeId>>,
}

/// A node being explored, with the position of the next child to visit
struct Frame {
    children: Vec<NodeId>,
    next: usize,
}

impl<P> Network<P> {
    /// Create an uncompiled network rooted at the given node
    pub fn new(circuit: Circuit<P>, root: NodeId) -> Self {
        assert!(root.index() < circuit.nb_nodes(), "Invalid root {root}");
        Network {
            circuit,
            root,
            leaves: Vec::new(),
            containers: Vec::new(),
            diagnostics: Vec::new(),
            forward: Vec::new(),
            backward: Vec::new(),
        }
    }

    /// Root of the traversal
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Underlying circuit
    pub fn circuit(&self) -> &Circuit<P> {
        &self.circuit
    }

    pub(crate) fn circuit_mut(&mut self) -> &mut Circuit<P> {
        &mut self.circuit
    }

    /// Give back the circuit
    pub fn into_circuit(self) -> Circuit<P> {
        self.circuit
    }

    /// Get a node of the circuit
    pub fn node(&self, n: NodeId) -> &Node<P> {
        self.circuit.node(n)
    }

    /// Leaves of the network, ordered by id
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Containers met during the traversal
    pub fn containers(&self) -> &[NodeId] {
        &self.containers
    }

    /// Return the number of leaves in the network
    pub fn nb_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Get the leaf with the given id
    pub fn leaf_by_id(&self, id: u32) -> Option<NodeId> {
        self.leaves.get(id as usize).copied()
    }

    /// Nodes a leaf feeds into, within the compiled network
    pub fn forward_edges(&self, n: NodeId) -> &[NodeId] {
        self.forward.get(n.index()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Nodes feeding a leaf, within the compiled network
    pub fn backward_edges(&self, n: NodeId) -> &[NodeId] {
        self.backward.get(n.index()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Problems reported by the last compilation that did not stop it
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Resolve the circuit into the ordered leaf list and assign ids
    ///
    /// The traversal is a depth-first search from the root, following input ports, output
    /// ports, forward edges and backward edges, in this order. A branch reaching the depth
    /// budget is dropped and reported in [`diagnostics`](Network::diagnostics).
    /// Dead-code elimination runs afterwards if enabled.
    pub fn compile(&mut self, config: &CompileConfig) {
        self.reset();
        self.identify(config.max_depth);
        self.restrict_edges();
        let nb_identified = self.leaves.len();
        if config.remove_dead_ends {
            self.remove_dead_ends();
            if config.prune_dead_loops {
                self.prune_dead_loops();
            }
        }
        self.assign_ids();
        info!(
            "Compiled network: {} leaves ({} removed), {} containers, {} diagnostics",
            self.leaves.len(),
            nb_identified - self.leaves.len(),
            self.containers.len(),
            self.diagnostics.len()
        );
    }

    /// Clear the traversal state and the ids of a previous compilation, and copy the wiring
    fn reset(&mut self) {
        self.leaves.clear();
        self.containers.clear();
        self.diagnostics.clear();
        for n in self.circuit.ids().collect_vec() {
            self.circuit.node_mut(n).id = None;
        }
        let nodes = self.circuit.ids().map(|n| self.circuit.node(n)).collect_vec();
        self.forward = nodes.iter().map(|n| n.forward_edges().to_vec()).collect();
        self.backward = nodes.iter().map(|n| n.backward_edges().to_vec()).collect();
    }

    /// Nodes reachable from a node, in visiting order
    fn children(&self, n: NodeId) -> Vec<NodeId> {
        let node = self.circuit.node(n);
        node.input_ports()
            .iter()
            .chain(node.output_ports().iter())
            .flat_map(|p| p.nodes().iter().copied())
            .chain(self.forward_edges(n).iter().copied())
            .chain(self.backward_edges(n).iter().copied())
            .collect()
    }

    /// Keep only the edges between listed leaves
    ///
    /// Branches left out by the depth budget are excluded along with the edges leading to them.
    fn restrict_edges(&mut self) {
        let listed: FxHashSet<NodeId> = self.leaves.iter().copied().collect();
        let mut dropped = 0;
        for i in 0..self.forward.len() {
            let n = NodeId::from_index(i);
            if listed.contains(&n) {
                let before = self.forward[i].len();
                self.forward[i].retain(|m| listed.contains(m));
                self.backward[i].retain(|m| listed.contains(m));
                dropped += before - self.forward[i].len();
            } else {
                self.forward[i].clear();
                self.backward[i].clear();
            }
        }
        if dropped > 0 {
            debug!("Dropped {} edges to nodes left out of the network", dropped);
        }
    }

    /// Depth-first traversal from the root, sorting nodes into leaves and containers
    ///
    /// Uses an explicit stack with the same visiting order as the recursive formulation.
    fn identify(&mut self, max_depth: usize) {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<Frame> = Vec::new();
        let mut exhausted = 0usize;

        let mut enter = |net: &mut Self, n: NodeId, depth: usize, stack: &mut Vec<Frame>| {
            if seen.contains(&n) {
                return;
            }
            if depth >= max_depth {
                exhausted += 1;
                debug!("Depth budget exhausted at {}", n);
                net.diagnostics
                    .push(Error::RecursionBudgetExhausted { node: n, max_depth });
                return;
            }
            seen.insert(n);
            if net.circuit.node(n).is_leaf() {
                net.leaves.push(n);
            } else {
                net.containers.push(n);
            }
            let children = net.children(n);
            stack.push(Frame { children, next: 0 });
        };

        let root = self.root;
        enter(self, root, 1, &mut stack);
        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.children.len() {
                let child = frame.children[frame.next];
                frame.next += 1;
                let depth = stack.len() + 1;
                enter(self, child, depth, &mut stack);
            } else {
                stack.pop();
            }
        }

        if exhausted > 0 {
            warn!(
                "Depth budget of {} exhausted {} times; the corresponding branches are left out",
                max_depth, exhausted
            );
        }
    }

    /// Give each leaf its position as id
    fn assign_ids(&mut self) {
        for (i, n) in self.leaves.iter().enumerate() {
            self.circuit.node_mut(*n).id = Some(i as u32);
        }
    }

    /// Check consistency of the compiled network
    pub fn check(&self) {
        self.circuit.check();
        let mut present = FxHashSet::default();
        for (i, n) in self.leaves.iter().enumerate() {
            assert!(present.insert(*n), "{n} is listed twice");
            assert!(self.node(*n).is_leaf(), "{n} is not a leaf");
            assert_eq!(self.node(*n).id(), Some(i as u32), "Bad id for {n}");
        }
        for &a in &self.leaves {
            for &b in self.forward_edges(a) {
                assert!(present.contains(&b), "Edge {a} -> {b} leaves the network");
                let fwd = self.forward_edges(a).iter().filter(|n| **n == b).count();
                let bwd = self.backward_edges(b).iter().filter(|n| **n == a).count();
                assert_eq!(fwd, bwd, "Edge {a} -> {b} is not mirrored");
            }
            for &b in self.backward_edges(a) {
                assert!(present.contains(&b), "Edge {b} -> {a} leaves the network");
            }
        }
        for n in self.circuit.ids() {
            if !present.contains(&n) {
                assert_eq!(self.node(n).id(), None, "{n} has an id but is not listed");
            }
        }
    }
}

impl<P> fmt::Display for Network<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Network rooted at {} with {} leaves:",
            self.root,
            self.nb_leaves()
        )?;
        for (i, n) in self.leaves.iter().enumerate() {
            let node = self.node(*n);
            let targets = self
                .forward_edges(*n)
                .iter()
                .filter_map(|m| self.node(*m).id())
                .join(", ");
            writeln!(
                f,
                "\t{}{} ({}) -> [{}]",
                i,
                if node.is_pinned() { "*" } else { "" },
                n,
                targets
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::node::GateMode;

    fn no_elimination() -> CompileConfig {
        CompileConfig {
            remove_dead_ends: false,
            ..CompileConfig::default()
        }
    }

    #[test]
    fn test_traversal_order() {
        let mut c = Circuit::<()>::new();
        let g1 = c.add_gate(GateMode::And);
        let g2 = c.add_gate(GateMode::Or);
        let g3 = c.add_gate(GateMode::Xor);
        let g4 = c.add_gate(GateMode::And);
        c.connect(g1, g2, false).unwrap();
        c.connect(g2, g3, false).unwrap();
        c.connect(g4, g2, false).unwrap();
        let root = c.add_container(vec![g1.into()], vec![g3.into()]);

        let mut net = Network::new(c, root);
        net.compile(&no_elimination());
        // Input port first, then forward edges of g1, then g2's forward and backward edges
        assert_eq!(net.leaves(), &[g1, g2, g3, g4]);
        assert_eq!(net.containers(), &[root]);
        for (i, n) in net.leaves().iter().enumerate() {
            assert_eq!(net.node(*n).id(), Some(i as u32));
        }
        assert_eq!(net.node(root).id(), None);
        assert!(net.diagnostics().is_empty());
        net.check();
    }

    #[test]
    fn test_unreachable() {
        let mut c = Circuit::<()>::new();
        let g1 = c.add_gate(GateMode::And);
        let g2 = c.add_gate(GateMode::And);
        let lonely = c.add_gate(GateMode::Or);
        c.connect(g1, g2, false).unwrap();
        let mut net = Network::new(c, g1);
        net.compile(&no_elimination());
        assert_eq!(net.leaves(), &[g1, g2]);
        assert_eq!(net.node(lonely).id(), None);
        assert_eq!(net.leaf_by_id(1), Some(g2));
        assert_eq!(net.leaf_by_id(2), None);
    }

    #[test]
    fn test_depth_budget() {
        let mut c = Circuit::<()>::new();
        let gates = (0..10).map(|_| c.add_gate(GateMode::Or)).collect_vec();
        for (a, b) in gates.iter().tuple_windows() {
            c.connect(*a, *b, false).unwrap();
        }
        let mut net = Network::new(c, gates[0]);
        net.compile(&CompileConfig {
            max_depth: 5,
            remove_dead_ends: false,
            prune_dead_loops: false,
        });
        // The root is at depth 1; depth 5 is out of budget
        assert_eq!(net.leaves(), &gates[0..4]);
        assert!(matches!(
            net.diagnostics(),
            [Error::RecursionBudgetExhausted { node, max_depth: 5 }] if *node == gates[4]
        ));
        assert_eq!(net.node(gates[4]).id(), None);
        net.check();
    }

    #[test]
    fn test_depth_budget_partial() {
        // A branch out of budget does not prevent reaching the same node by a shorter path
        let mut c = Circuit::<()>::new();
        let gates = (0..4).map(|_| c.add_gate(GateMode::Or)).collect_vec();
        for (a, b) in gates.iter().tuple_windows() {
            c.connect(*a, *b, false).unwrap();
        }
        let shortcut = c.add_gate(GateMode::And);
        c.connect(gates[3], shortcut, false).unwrap();
        let root = c.add_container(vec![gates[0].into(), shortcut.into()], Vec::new());
        let mut net = Network::new(c, root);
        net.compile(&CompileConfig {
            max_depth: 4,
            remove_dead_ends: false,
            prune_dead_loops: false,
        });
        assert!(!net.diagnostics().is_empty());
        assert!(net.leaves().contains(&shortcut));
        assert!(net.leaves().contains(&gates[3]));
        net.check();
    }

    #[test]
    fn test_deep_chain() {
        // Far deeper than the call stack would allow with a recursive traversal
        let mut c = Circuit::<()>::new();
        let gates = (0..200_000).map(|_| c.add_gate(GateMode::Or)).collect_vec();
        for (a, b) in gates.iter().tuple_windows() {
            c.connect(*a, *b, false).unwrap();
        }
        let mut net = Network::new(c, gates[0]);
        net.compile(&CompileConfig {
            max_depth: 1_000_000,
            remove_dead_ends: false,
            prune_dead_loops: false,
        });
        assert_eq!(net.nb_leaves(), gates.len());
    }

    #[test]
    fn test_depth_budget_export() {
        let mut c = Circuit::<()>::new();
        let gates = (0..1000).map(|_| c.add_gate(GateMode::Or)).collect_vec();
        for (a, b) in gates.iter().tuple_windows() {
            c.connect(*a, *b, false).unwrap();
        }
        let mut net = Network::new(c, gates[0]);
        net.compile(&no_elimination());
        assert_eq!(net.nb_leaves(), 899);
        assert_eq!(net.diagnostics().len(), 1);
        net.check();

        // The excluded branch does not prevent exporting the rest
        let parts = net.parts().unwrap();
        assert_eq!(parts.len(), 899);
        assert!(parts[898].connections.is_empty());
        assert_eq!(parts[898].connections_from, vec![897]);
        assert_eq!(net.circuit().node(gates[898]).forward_edges(), &[gates[899]]);
    }

    #[test]
    fn test_recompile() {
        let mut c = Circuit::<()>::new();
        let g1 = c.add_gate(GateMode::And);
        let g2 = c.add_gate(GateMode::And);
        c.connect(g1, g2, false).unwrap();
        let mut net = Network::new(c, g1);
        net.compile(&no_elimination());
        let first = net.leaves().to_vec();
        net.compile(&no_elimination());
        assert_eq!(net.leaves(), first.as_slice());
        net.check();
    }

    #[test]
    fn test_recompile_after_pruning() {
        let mut c = Circuit::<()>::new();
        let a = c.add_gate(GateMode::Or);
        let d = c.add_gate(GateMode::And);
        let e = c.add_gate(GateMode::Or);
        let out = c.add_gate(GateMode::And);
        c.connect(a, d, false).unwrap();
        c.connect(e, d, false).unwrap();
        c.connect(e, out, false).unwrap();
        c.pin(a);
        c.pin(out);
        let mut net = Network::new(c, a);
        net.compile(&CompileConfig::default());
        assert_eq!(net.leaves(), &[a, e, out]);
        assert!(net.forward_edges(a).is_empty());

        // The wiring of the circuit is left as built
        assert_eq!(net.circuit().node(a).forward_edges(), &[d]);
        assert_eq!(net.circuit().node(d).backward_edges(), &[a, e]);

        net.compile(&CompileConfig::default());
        assert_eq!(net.leaves(), &[a, e, out]);
        assert_eq!(net.node(out).id(), Some(2));
        net.check();
    }
}
