//! Logic gate networks: building, compiling and simulating
//!
//! This crate builds networks of logic gates and timers, compiles them into a flat list of
//! numbered parts ready for export, and simulates them frame by frame.
//!
//! # Usage
//!
//! ```bash
//! # Show available commands
//! smlogic help
//! # Generate a 4-bit adder and write its part list
//! smlogic generate adder --size 4 -o adder.json
//! # Show statistics on the parts
//! smlogic show adder.json
//! # Simulate it for 40 frames, with the first input forced active
//! smlogic simulate adder.json -f 40 --drive 0=1
//! ```
//!
//! # Datastructures
//!
//! A [`Circuit`] is an arena of nodes. Leaves are logic gates and timers; containers only group
//! the ports of other nodes, and a port slot may be a bus of several nodes sharing one bit position.
//! [`Circuit::connect`] wires the output ports of a node to the input ports of another, slot by slot.
//!
//! A [`Network`] designates a root in a circuit. Compiling it lists every leaf reachable from the
//! root, removes the leaves that cannot influence a pinned leaf, and numbers the others by position.
//! The result is exported as a list of [`Part`], which is what the simulator consumes.
//!
//! For example, here is a pinned And gate feeding a pinned Or gate:
//! ```
//! # use smlogic::{Circuit, CompileConfig, GateMode, Network};
//! let mut circuit = Circuit::<()>::new();
//! let a = circuit.add_gate(GateMode::And);
//! let b = circuit.add_gate_named("or").unwrap();
//! circuit.connect(a, b, false).unwrap();
//! circuit.pin(a);
//! circuit.pin(b);
//! let mut net = Network::new(circuit, a);
//! net.compile(&CompileConfig::default());
//! let parts = net.parts().unwrap();
//! assert_eq!(parts[0].connections, vec![1]);
//! ```
//!
//! # Simulation
//!
//! Each frame first captures the state of the inputs of every part, then commits the new states.
//! Parts may be split into partitions evaluated concurrently, with the same results as a sequential run.

#![warn(missing_docs)]

pub mod cmd;
mod error;
pub mod io;
pub mod network;
pub mod sim;

pub use error::{Error, Result};
pub use network::{
    stats, Circuit, CompileConfig, GateMode, Network, NodeId, NodeKind, Part, PartKind, Port,
};
pub use sim::{SimConfig, Simulator};
