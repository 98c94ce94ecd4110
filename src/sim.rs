//! Frame-by-frame simulation of a compiled network, optionally split across workers

mod partition;
mod simulator;

pub use partition::partition;
pub(crate) use simulator::timer_delay;
pub use simulator::Simulator;

use crate::error::Result;
use crate::network::Part;

/// Number of frames in one second of timer delay
pub const FRAMES_PER_SECOND: usize = 40;

/// Longest supported timer delay, in frames
pub const MAX_TIMER_DELAY: usize = 60 * FRAMES_PER_SECOND;

/// Options for the simulation
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Number of contiguous partitions of the parts, evaluated concurrently
    pub partitions: usize,
    /// Number of worker threads; the global pool is used if not given
    pub threads: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            partitions: 1,
            threads: None,
        }
    }
}

/// Simulate a part list over multiple frames; return the states of the pinned parts after each frame
pub fn simulate<P>(
    parts: &[Part<P>],
    config: &SimConfig,
    frames: usize,
) -> Result<Vec<Vec<bool>>> {
    let mut sim = Simulator::new(parts, config)?;
    let mut ret = Vec::with_capacity(frames);
    for _ in 0..frames {
        sim.step();
        ret.push(sim.pinned_states());
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::generators::testcases;
    use crate::network::{CompileConfig, GateMode};

    #[test]
    fn test_simulate_chain() {
        let mut net = testcases::chain::<()>(4, GateMode::Nor);
        net.compile(&CompileConfig::default());
        let parts = net.parts().unwrap();
        // Without inputs the first Nor stays inactive, and the chain alternates behind it
        let states = simulate(&parts, &SimConfig::default(), 5).unwrap();
        assert_eq!(states.len(), 5);
        assert_eq!(states[4], vec![false, true]);
    }
}
