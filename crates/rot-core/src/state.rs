//! Per-handle mutable state

use serde::{Deserialize, Serialize};

use crate::port::{Port, PortType};

/// Communication status of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommState {
    #[default]
    Closed,
    Open,
}

/// Azimuth/elevation pair, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub az: f64,
    pub el: f64,
}

impl Position {
    pub fn new(az: f64, el: f64) -> Self {
        Self { az, el }
    }
}

/// Mutable record attached to every rotator handle.
///
/// Backends receive it on every hook and may adjust the port settings
/// and bounds; the communication status is owned by the frontend.
#[derive(Debug)]
pub struct RotState {
    comm_state: CommState,
    pub port: Port,
    pub min_az: f64,
    pub max_az: f64,
    pub min_el: f64,
    pub max_el: f64,
    /// Last position reported by the backend
    pub current: Position,
}

impl RotState {
    /// Closed state with zeroed bounds on a port of the given type
    pub fn new(port_type: PortType) -> Self {
        Self {
            comm_state: CommState::Closed,
            port: Port::new(port_type),
            min_az: 0.0,
            max_az: 0.0,
            min_el: 0.0,
            max_el: 0.0,
            current: Position::default(),
        }
    }

    pub fn comm_state(&self) -> CommState {
        self.comm_state
    }

    pub fn is_open(&self) -> bool {
        self.comm_state == CommState::Open
    }

    /// Record a status transition. Called by the frontend only.
    pub fn set_comm_state(&mut self, comm_state: CommState) {
        self.comm_state = comm_state;
    }
}
