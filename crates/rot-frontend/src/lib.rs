//! rot-frontend - Hardware-independent rotator frontend
//!
//! This crate exposes one uniform operation set over any number of
//! model-specific backends. Callers never talk to a backend directly:
//! they create a handle from a model id, open it, and issue get/set
//! operations through the [`RotManager`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RotManager                           │
//! │                                                             │
//! │  ┌─────────────┐  ┌──────────────┐  ┌───────────────────┐   │
//! │  │CapsRegistry │  │ handle arena │  │ OpenedRegistry    │   │
//! │  │(model→caps) │  │ (RotId→Rot)  │  │ (open RotIds)     │   │
//! │  └─────────────┘  └──────┬───────┘  └───────────────────┘   │
//! │                          │                                  │
//! │              ┌───────────┴───────────┐                      │
//! │              │ Rot                   │                      │
//! │              │  RotCaps (shared)     │                      │
//! │              │  RotState + Port      │──── transport ────┐  │
//! │              │  Box<dyn RotBackend>  │  serial / device  │  │
//! │              └───────────────────────┘                   │  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod caps_registry;
pub mod conf;
pub mod config;
pub mod dispatch;
pub mod manager;
pub mod registry;
pub mod testing;
pub mod transport;

pub use caps_registry::{BackendLoader, CapsRegistry};
pub use config::{ConfigError, RotatorConfig};
pub use manager::{Rot, RotId, RotManager};
pub use registry::OpenedRegistry;
pub use transport::{SerialOpener, SystemSerial};

// Re-export for convenience
pub use rot_core::{
    CommState, ErrorKind, Position, PortType, RotBackend, RotCaps, RotError, RotModel, RotResult,
    RotState, Token, TokenScope,
};
