//! Compute part statistics
//!
//! ```
//! # use smlogic::{Circuit, CompileConfig, GateMode, Network};
//! # let mut circuit = Circuit::<()>::new();
//! # let g = circuit.add_gate(GateMode::And);
//! # circuit.pin(g);
//! # let mut net = Network::new(circuit, g);
//! # net.compile(&CompileConfig::default());
//! use smlogic::network::stats::stats;
//! let stats = stats(&net.parts().unwrap());
//!
//! // Check that there is no timer
//! assert_eq!(stats.nb_timers, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::network::{GateMode, Part, PartKind};

/// Number of parts, per kind, and connectivity of a part list
#[derive(Clone, Debug, Default)]
pub struct NetworkStats {
    /// Number of parts
    pub nb_parts: usize,
    /// Number of pinned parts
    pub nb_pinned: usize,
    /// Number of gates for each mode, in encoding order
    pub nb_gates_by_mode: [usize; 6],
    /// Number of timers
    pub nb_timers: usize,
    /// Number of connections
    pub nb_connections: usize,
    /// Largest number of incoming connections
    pub max_fanin: usize,
    /// Largest number of outgoing connections
    pub max_fanout: usize,
    /// Number of parts without any incoming connection
    pub nb_sources: usize,
}

impl NetworkStats {
    /// Total number of gates
    pub fn nb_gates(&self) -> usize {
        self.nb_gates_by_mode.iter().sum()
    }

    /// Number of gates with the given mode
    pub fn nb_gates_with_mode(&self, mode: GateMode) -> usize {
        self.nb_gates_by_mode[mode.as_u8() as usize]
    }
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Parts: {}", self.nb_parts)?;
        writeln!(f, "  Pinned: {}", self.nb_pinned)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        for mode in GateMode::ALL {
            let nb = self.nb_gates_with_mode(mode);
            if nb != 0 {
                writeln!(f, "      {}: {}", mode, nb)?;
            }
        }
        if self.nb_timers != 0 {
            writeln!(f, "  Timers: {}", self.nb_timers)?;
        }
        writeln!(f, "  Connections: {}", self.nb_connections)?;
        writeln!(f, "      max fanin: {}", self.max_fanin)?;
        writeln!(f, "      max fanout: {}", self.max_fanout)?;
        writeln!(f, "      sources: {}", self.nb_sources)?;
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of a part list
pub fn stats<P>(parts: &[Part<P>]) -> NetworkStats {
    let mut ret = NetworkStats {
        nb_parts: parts.len(),
        ..NetworkStats::default()
    };
    for p in parts {
        match p.kind {
            PartKind::Gate { mode } => ret.nb_gates_by_mode[mode.as_u8() as usize] += 1,
            PartKind::Timer { .. } => ret.nb_timers += 1,
        }
        if p.pinned {
            ret.nb_pinned += 1;
        }
        if p.connections_from.is_empty() {
            ret.nb_sources += 1;
        }
        ret.nb_connections += p.connections.len();
        ret.max_fanin = ret.max_fanin.max(p.connections_from.len());
        ret.max_fanout = ret.max_fanout.max(p.connections.len());
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::generators::testcases;
    use crate::network::CompileConfig;

    #[test]
    fn test_chain_stats() {
        let mut net = testcases::chain::<()>(5, GateMode::Or);
        net.compile(&CompileConfig::default());
        let parts = net.parts().unwrap();
        let s = stats(&parts);
        assert_eq!(s.nb_parts, 5);
        assert_eq!(s.nb_gates(), 5);
        assert_eq!(s.nb_gates_with_mode(GateMode::Or), 5);
        assert_eq!(s.nb_pinned, 2);
        assert_eq!(s.nb_connections, 4);
        assert_eq!(s.max_fanin, 1);
        assert_eq!(s.max_fanout, 1);
        assert_eq!(s.nb_sources, 1);
        assert!(s.to_string().contains("OR: 5"));
    }
}
