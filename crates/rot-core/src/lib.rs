//! rot-core - Core traits and types for rotator control
//!
//! This crate provides the vocabulary shared by the rotator frontend and
//! the model-specific backends: capability descriptors, the backend trait,
//! per-handle state, the transport descriptor and configuration tokens.

pub mod backend;
pub mod caps;
pub mod error;
pub mod model;
pub mod port;
pub mod state;
pub mod token;

pub use backend::{BackendInit, NullBackend, RotBackend};
pub use caps::RotCaps;
pub use error::{ErrorKind, RotError, RotResult};
pub use model::RotModel;
pub use port::{
    Handshake, Parity, Port, PortHandle, PortStream, PortType, SerialParams, DEFAULT_PATHNAME,
};
pub use state::{CommState, Position, RotState};
pub use token::{ConfKind, ConfParam, Token, TokenScope};
