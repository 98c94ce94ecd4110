//! Network generators and templates
//!
//! Generated networks are returned uncompiled, with their designated inputs and outputs pinned.

/// Adder generators
pub mod adder {
    use crate::network::{Circuit, GateMode, Network, NodeId, Port};

    /// A full adder, as a container
    ///
    /// Its three input ports (a, b, carry) are buses feeding the gates that read them.
    /// Its two output ports are the sum and the carry out.
    pub fn full_adder<P>(c: &mut Circuit<P>) -> NodeId {
        let xor = c.add_gate(GateMode::Xor);
        let and_ab = c.add_gate(GateMode::And);
        let and_ac = c.add_gate(GateMode::And);
        let and_bc = c.add_gate(GateMode::And);
        let carry = c.add_gate(GateMode::Or);
        for g in [and_ab, and_ac, and_bc] {
            c.link(g, carry);
        }
        c.add_container(
            vec![
                vec![xor, and_ab, and_ac].into(),
                vec![xor, and_ab, and_bc].into(),
                vec![xor, and_ac, and_bc].into(),
            ],
            vec![xor.into(), carry.into()],
        )
    }

    /// A simple and slow ripple-carry adder
    ///
    /// The root exposes the inputs a0..an, then b0..bn, and the outputs s0..sn then the carry.
    /// Inputs are gates without fanin, meant to be driven during simulation.
    pub fn ripple_carry<P>(len: usize) -> Network<P> {
        let mut c = Circuit::new();
        let a = (0..len).map(|_| c.add_gate(GateMode::Or)).collect::<Vec<_>>();
        let b = (0..len).map(|_| c.add_gate(GateMode::Or)).collect::<Vec<_>>();
        let s = (0..len).map(|_| c.add_gate(GateMode::Or)).collect::<Vec<_>>();
        let cout = c.add_gate(GateMode::Or);

        // Without fanin, never active
        let mut carry = c.add_gate(GateMode::Or);
        for i in 0..len {
            let fa = full_adder(&mut c);
            let bundle = c.add_container(
                Vec::new(),
                vec![a[i].into(), b[i].into(), carry.into()],
            );
            c.connect(bundle, fa, false)
                .expect("adder operands match the full adder inputs");
            let sink = c.add_container(vec![s[i].into()], Vec::new());
            c.connect(fa, sink, true).expect("sum sink has an input port");
            carry = c.output_leaves(fa)[1][0];
        }
        c.link(carry, cout);

        let inputs = a.iter().chain(b.iter()).map(|n| Port::from(*n)).collect();
        let mut outputs: Vec<Port> = s.iter().map(|n| Port::from(*n)).collect();
        outputs.push(cout.into());
        let root = c.add_container(inputs, outputs);
        c.pin_ports(root);
        c.check();
        Network::new(c, root)
    }
}

/// Simple generators to test functionality
pub mod testcases {
    use crate::network::{Circuit, GateMode, Network, Port};

    /// A chain of gates, the first one and the last one pinned
    pub fn chain<P>(len: usize, mode: GateMode) -> Network<P> {
        assert!(len > 0);
        let mut c = Circuit::new();
        let gates = (0..len).map(|_| c.add_gate(mode)).collect::<Vec<_>>();
        for w in gates.windows(2) {
            c.link(w[0], w[1]);
        }
        let first = gates[0];
        let last = gates[len - 1];
        let root = c.add_container(vec![first.into()], vec![last.into()]);
        c.pin_ports(root);
        Network::new(c, root)
    }

    /// A mesh of Xor gates, each one driving the two previous ones
    ///
    /// The last gate is the input, the first two gates the outputs.
    pub fn mesh<P>(len: usize) -> Network<P> {
        assert!(len >= 2);
        let mut c = Circuit::new();
        let gates = (0..len)
            .map(|_| c.add_gate(GateMode::Xor))
            .collect::<Vec<_>>();
        for i in 2..len {
            c.link(gates[i], gates[i - 1]);
            c.link(gates[i], gates[i - 2]);
        }
        let outputs: Vec<Port> = vec![gates[0].into(), gates[1].into()];
        let root = c.add_container(vec![gates[len - 1].into()], outputs);
        c.pin_ports(root);
        Network::new(c, root)
    }

    /// A ring of timers behind an Or gate; used to test delays
    pub fn timer_ring<P>(len: usize, ticks: u32) -> Network<P> {
        assert!(len > 0);
        let mut c = Circuit::new();
        let input = c.add_gate(GateMode::Or);
        let timers = (0..len)
            .map(|_| c.add_timer(ticks, 0))
            .collect::<Vec<_>>();
        c.link(input, timers[0]);
        for w in timers.windows(2) {
            c.link(w[0], w[1]);
        }
        c.link(timers[len - 1], input);
        let root = c.add_container(vec![input.into()], vec![timers[len - 1].into()]);
        c.pin_ports(root);
        Network::new(c, root)
    }
}

/// Random generators, for benchmarking and randomized testing
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::network::{Circuit, GateMode, Network, Port};

    /// A random network with feedback loops and occasional timers
    ///
    /// The first eighth of the leaves are inputs without fanin, the last eighth are outputs.
    pub fn random_circuit<P>(len: usize, max_fanin: usize, seed: u64) -> Network<P> {
        assert!(len > 0 && max_fanin > 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut c = Circuit::new();
        let nb_io = (len / 8).max(1);
        let leaves = (0..len)
            .map(|i| {
                if i >= nb_io && rng.gen_ratio(1, 16) {
                    c.add_timer(rng.gen_range(0..4), 0)
                } else {
                    c.add_gate(GateMode::ALL[rng.gen_range(0..GateMode::ALL.len())])
                }
            })
            .collect::<Vec<_>>();
        for &n in &leaves[nb_io..] {
            let fanin = rng.gen_range(1..=max_fanin);
            for _ in 0..fanin {
                let from = leaves[rng.gen_range(0..len)];
                c.link(from, n);
            }
        }
        let inputs: Vec<Port> = leaves[..nb_io].iter().map(|n| Port::from(*n)).collect();
        let outputs: Vec<Port> = leaves[len.saturating_sub(nb_io)..]
            .iter()
            .map(|n| Port::from(*n))
            .collect();
        let root = c.add_container(inputs, outputs);
        c.pin_ports(root);
        Network::new(c, root)
    }
}
