//! Representation, compilation and export of logic networks

mod circuit;
mod compile;
mod dead_code;
pub mod generators;
mod node;
mod part;
pub mod stats;

pub use circuit::Circuit;
pub use compile::{CompileConfig, Network};
pub use node::{GateMode, Node, NodeId, NodeKind, Port};
pub use part::{Part, PartKind};
