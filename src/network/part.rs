use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::network::compile::Network;
use crate::network::node::{GateMode, NodeId, NodeKind};

/// Kind and parameters of an exported leaf
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PartKind {
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

/// Descriptor of a leaf of a compiled network, as handed to the exporter
///
/// Connections are given by id, and ids are positions in the part list.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Part<P = ()> {
    /// Position of the part in the list
    pub id: u32,
    /// Kind and parameters
    #[serde(flatten)]
    pub kind: PartKind,
    /// Parts this one feeds into
    pub connections: Vec<u32>,
    /// Parts feeding this one
    pub connections_from: Vec<u32>,
    /// Designated input or output
    #[serde(alias = "important")]
    pub pinned: bool,
    /// Exporter data, never interpreted by the network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

impl<P: Clone> Network<P> {
    /// Describe a leaf of the compiled network
    ///
    /// Fails with [`Error::UnexportableContainer`] for a container, and with
    /// [`Error::NotInNetwork`] for a leaf that the last compilation did not identify.
    pub fn describe(&self, n: NodeId) -> Result<Part<P>> {
        let node = self.node(n);
        let kind = match node.kind() {
            NodeKind::Container => return Err(Error::UnexportableContainer { node: n }),
            NodeKind::Gate { mode } => PartKind::Gate { mode },
            NodeKind::Timer { ticks, seconds } => PartKind::Timer { ticks, seconds },
        };
        let id = node.id().ok_or_else(|| Error::NotInNetwork { node: n })?;
        let resolve = |edges: &[NodeId]| -> Result<Vec<u32>> {
            edges
                .iter()
                .map(|m| {
                    self.node(*m)
                        .id()
                        .ok_or_else(|| Error::NotInNetwork { node: *m })
                })
                .collect()
        };
        Ok(Part {
            id,
            kind,
            connections: resolve(self.forward_edges(n))?,
            connections_from: resolve(self.backward_edges(n))?,
            pinned: node.is_pinned(),
            payload: node.payload().cloned(),
        })
    }

    /// Describe all leaves of the compiled network, ordered by id
    ///
    /// Connections only refer to leaves of the network; edges to branches left out by the
    /// depth budget are not exported.
    pub fn parts(&self) -> Result<Vec<Part<P>>> {
        self.leaves().iter().map(|n| self.describe(*n)).collect()
    }
}
