//! Error types for building, compiling and exporting gate networks

use thiserror::Error;

use crate::network::NodeId;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while wiring, compiling or exporting a network
#[derive(Error, Debug)]
pub enum Error {
    /// Sender and receiver port counts differ and the mismatch was not allowed
    #[error("cannot connect {sender} ({outputs} outputs) to {receiver} ({inputs} inputs); allow the arity mismatch to connect anyway")]
    ArityMismatch {
        /// Node whose output ports are connected
        sender: NodeId,
        /// Node whose input ports are connected
        receiver: NodeId,
        /// Number of output ports on the sender
        outputs: usize,
        /// Number of input ports on the receiver
        inputs: usize,
    },

    /// Unknown gate mode given at construction
    #[error("logic gate mode cannot be '{0}'")]
    InvalidMode(String),

    /// A traversal branch hit the depth budget; the branch is left out of the network
    #[error("depth budget of {max_depth} exhausted when reaching {node}")]
    RecursionBudgetExhausted {
        /// Node that was not visited
        node: NodeId,
        /// Depth budget of the compilation
        max_depth: usize,
    },

    /// Containers are structural only and cannot be exported or simulated
    #[error("{node} is a container and cannot be exported or simulated")]
    UnexportableContainer {
        /// The container
        node: NodeId,
    },

    /// A connected node exposes no port on the connected side
    #[error("{node} has no port to connect")]
    NoPorts {
        /// The node without ports
        node: NodeId,
    },

    /// The leaf was not identified by the last compilation
    #[error("{node} is not part of the compiled network")]
    NotInNetwork {
        /// The leaf without an id
        node: NodeId,
    },

    /// Exported parts accept a bounded number of incoming connections
    #[error("part {id} has {count} incoming connections, at most {max} are supported")]
    TooManyInputs {
        /// Part id
        id: u32,
        /// Number of incoming connections
        count: usize,
        /// Supported maximum
        max: usize,
    },

    /// A timer delay too long to simulate
    #[error("timer {id} has a delay of {delay} frames, at most {max} are supported")]
    TimerTooLong {
        /// Part id
        id: u32,
        /// Delay, in frames
        delay: usize,
        /// Supported maximum
        max: usize,
    },

    /// A part list refers to a part that does not exist
    #[error("no part with id {id}")]
    UnknownPart {
        /// Missing id
        id: u32,
    },

    /// A part list where ids are not the positions of the parts
    #[error("part {id} found at position {position}")]
    MisplacedPart {
        /// Id of the part
        id: u32,
        /// Position of the part in the list
        position: usize,
    },

    /// The simulation worker pool could not be started
    #[error("cannot start simulation workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Reading or writing a part list failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A part list could not be encoded or decoded
    #[error("invalid part list: {0}")]
    Json(#[from] serde_json::Error),
}
