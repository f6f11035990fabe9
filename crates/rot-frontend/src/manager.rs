//! Handle manager
//!
//! Owns every rotator handle in an arena keyed by [`RotId`]. A handle is
//! built from a capability descriptor, filled with the descriptor defaults,
//! handed to the backend init hook, and only then made visible to callers.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use rot_core::{NullBackend, Port, RotBackend, RotCaps, RotError, RotModel, RotResult, RotState};
use tracing::{debug, info, warn};

use crate::caps_registry::CapsRegistry;
use crate::dispatch::close_rot;
use crate::registry::OpenedRegistry;
use crate::transport::{SerialOpener, SystemSerial};

/// Identifier of a live rotator handle. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RotId(pub(crate) u64);

impl std::fmt::Display for RotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rot#{}", self.0)
    }
}

/// One controlled rotator
pub struct Rot {
    pub(crate) caps: Arc<RotCaps>,
    pub(crate) state: RotState,
    pub(crate) backend: Box<dyn RotBackend>,
}

impl Rot {
    /// Capability descriptor this handle was created from
    pub fn caps(&self) -> &Arc<RotCaps> {
        &self.caps
    }

    pub fn state(&self) -> &RotState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

impl std::fmt::Debug for Rot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rot")
            .field("model", &self.caps.model)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Build the state of a new handle from the descriptor defaults
pub(crate) fn default_state(caps: &RotCaps) -> RotState {
    let mut state = RotState::new(caps.port_type);

    let port: &mut Port = &mut state.port;
    port.serial.rate = caps.serial_rate_max;
    port.serial.data_bits = caps.serial_data_bits;
    port.serial.stop_bits = caps.serial_stop_bits;
    port.serial.parity = caps.serial_parity;
    port.serial.handshake = caps.serial_handshake;
    port.write_delay_ms = caps.write_delay_ms;
    port.post_write_delay_ms = caps.post_write_delay_ms;
    port.timeout_ms = caps.timeout_ms;
    port.retry = caps.retry;

    state.min_az = caps.min_az;
    state.max_az = caps.max_az;
    state.min_el = caps.min_el;
    state.max_el = caps.max_el;

    state
}

/// Frontend entry point: creates, opens, drives and destroys handles.
///
/// All mutating operations take `&mut self`; callers sharing a manager
/// across threads wrap it in a lock of their choice.
pub struct RotManager {
    caps: Arc<CapsRegistry>,
    pub(crate) serial: Arc<dyn SerialOpener>,
    pub(crate) rots: HashMap<RotId, Rot>,
    pub(crate) opened: OpenedRegistry,
    next_id: u64,
}

impl RotManager {
    /// Create a manager opening serial lines through the host OS
    pub fn new(caps: Arc<CapsRegistry>) -> Self {
        Self::with_serial(caps, Arc::new(SystemSerial))
    }

    /// Create a manager with a custom serial transport
    pub fn with_serial(caps: Arc<CapsRegistry>, serial: Arc<dyn SerialOpener>) -> Self {
        Self {
            caps,
            serial,
            rots: HashMap::new(),
            opened: OpenedRegistry::new(),
            next_id: 1,
        }
    }

    pub fn caps_registry(&self) -> &Arc<CapsRegistry> {
        &self.caps
    }

    /// Allocate a handle for `model`.
    ///
    /// Fails with `NotFound` for an unknown model, `OutOfMemory` if the
    /// handle cannot be allocated and `InitFailed` if the backend init hook
    /// refuses the handle. On failure no handle exists afterwards.
    pub fn create(&mut self, model: RotModel) -> RotResult<RotId> {
        debug!(%model, "rot_create called");

        let caps = self
            .caps
            .get(model)
            .ok_or_else(|| RotError::NotFound(format!("rotator model {}", model)))?;

        self.rots.try_reserve(1).map_err(|e| {
            RotError::OutOfMemory(format!("handle for rotator model {}: {}", model, e))
        })?;

        let mut state = default_state(&caps);

        let backend: Box<dyn RotBackend> = match &caps.init {
            Some(init) => init(caps.as_ref(), &mut state).map_err(|e| {
                warn!(%model, error = %e, "Backend init failed");
                RotError::InitFailed {
                    model,
                    source: Box::new(e),
                }
            })?,
            None => Box::new(NullBackend),
        };

        let id = RotId(self.next_id);
        self.next_id += 1;
        self.rots.insert(
            id,
            Rot {
                caps,
                state,
                backend,
            },
        );

        info!(%id, %model, "Rotator handle created");
        Ok(id)
    }

    /// Release a handle, closing it first if it is still open.
    ///
    /// Errors from that implicit close are logged, not returned. The
    /// backend cleanup hook runs before the handle is dropped.
    pub fn destroy(&mut self, id: RotId) -> RotResult<()> {
        debug!(%id, "rot_destroy called");

        let mut rot = self.rots.remove(&id).ok_or_else(|| unknown_handle(id))?;

        if rot.state.is_open() {
            if let Err(e) = close_rot(id, &mut rot, &mut self.opened) {
                warn!(%id, error = %e, "Implicit close on destroy failed");
            }
        }

        rot.backend.cleanup(&mut rot.state);

        info!(%id, model = %rot.caps.model, "Rotator handle destroyed");
        Ok(())
    }

    pub fn rot(&self, id: RotId) -> Option<&Rot> {
        self.rots.get(&id)
    }

    pub(crate) fn rot_mut(&mut self, id: RotId) -> RotResult<&mut Rot> {
        self.rots.get_mut(&id).ok_or_else(|| unknown_handle(id))
    }

    /// Whether `id` names a live, open handle
    pub fn is_open(&self, id: RotId) -> bool {
        self.rots.get(&id).is_some_and(Rot::is_open)
    }

    /// Live handle ids in creation order
    pub fn handles(&self) -> Vec<RotId> {
        let mut ids: Vec<RotId> = self.rots.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn opened(&self) -> &OpenedRegistry {
        &self.opened
    }

    /// Visit every open handle, most recently opened first.
    ///
    /// Stops the first time `visitor` returns `Break`; early termination is
    /// not an error. Returns the number of handles visited.
    pub fn for_each_opened<F>(&mut self, mut visitor: F) -> usize
    where
        F: FnMut(RotId, &mut Rot) -> ControlFlow<()>,
    {
        let rots = &mut self.rots;
        self.opened.for_each(|id| match rots.get_mut(&id) {
            Some(rot) => visitor(id, rot),
            None => {
                warn!(%id, "Opened registry refers to a missing handle");
                ControlFlow::Continue(())
            }
        })
    }
}

impl Drop for RotManager {
    fn drop(&mut self) {
        for id in self.handles() {
            if let Err(e) = self.destroy(id) {
                warn!(%id, error = %e, "Failed to destroy handle on shutdown");
            }
        }
    }
}

impl std::fmt::Debug for RotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotManager")
            .field("handles", &self.rots.len())
            .field("opened", &self.opened)
            .finish_non_exhaustive()
    }
}

pub(crate) fn unknown_handle(id: RotId) -> RotError {
    RotError::InvalidArgument(format!("{} is not a live rotator handle", id))
}
