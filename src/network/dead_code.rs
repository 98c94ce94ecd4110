//! Removal of leaves that cannot influence any pinned leaf

use fxhash::FxHashSet;
use tracing::debug;

use crate::network::compile::Network;
use crate::network::node::NodeId;

impl<P> Network<P> {
    /// Returns whether a leaf feeds nothing and is not pinned
    fn is_prunable(&self, n: NodeId) -> bool {
        let node = self.node(n);
        node.is_leaf() && self.forward_edges(n).is_empty() && !node.is_pinned()
    }

    /// Detach a leaf from the nodes feeding it
    ///
    /// Returns the former parents, which may have become prunable.
    fn detach_from_parents(&mut self, n: NodeId) -> Vec<NodeId> {
        let parents = std::mem::take(&mut self.backward[n.index()]);
        for p in &parents {
            self.forward[p.index()].retain(|m| *m != n);
        }
        parents
    }

    /// Remove unpinned leaves without forward edges, then their parents in cascade
    ///
    /// The initial leaf list is processed as a snapshot, so that removals triggered by one
    /// leaf are visible when the next one is considered. Pinned leaves are never removed.
    pub fn remove_dead_ends(&mut self) {
        let snapshot = self.leaves.clone();
        let mut removed = FxHashSet::default();
        for leaf in snapshot {
            let mut to_visit = vec![leaf];
            while let Some(n) = to_visit.pop() {
                if removed.contains(&n) || !self.is_prunable(n) {
                    continue;
                }
                removed.insert(n);
                let parents = self.detach_from_parents(n);
                to_visit.extend(parents.iter().rev());
            }
        }
        self.remove_leaves(&removed);
        debug!("Removed {} dead ends", removed.len());
    }

    /// Remove leaves whose forward paths never reach a pinned leaf, such as isolated feedback loops
    pub fn prune_dead_loops(&mut self) {
        let listed: FxHashSet<NodeId> = self.leaves.iter().copied().collect();
        let mut live = FxHashSet::default();
        let mut to_visit: Vec<NodeId> = self
            .leaves
            .iter()
            .copied()
            .filter(|n| self.node(*n).is_pinned())
            .collect();
        while let Some(n) = to_visit.pop() {
            if !live.insert(n) {
                continue;
            }
            for p in self.backward_edges(n) {
                if listed.contains(p) && !live.contains(p) {
                    to_visit.push(*p);
                }
            }
        }

        let dead: FxHashSet<NodeId> = listed.difference(&live).copied().collect();
        for n in &dead {
            self.detach_from_parents(*n);
            let children = std::mem::take(&mut self.forward[n.index()]);
            for c in children {
                self.backward[c.index()].retain(|m| m != n);
            }
        }
        self.remove_leaves(&dead);
        debug!("Removed {} leaves in dead loops", dead.len());
    }

    /// Drop leaves from the list and refresh the ids
    fn remove_leaves(&mut self, removed: &FxHashSet<NodeId>) {
        for n in removed {
            self.circuit_mut().node_mut(*n).id = None;
        }
        self.leaves.retain(|n| !removed.contains(n));
        let leaves = self.leaves.clone();
        for (i, n) in leaves.iter().enumerate() {
            self.circuit_mut().node_mut(*n).id = Some(i as u32);
        }
    }
}
