//! Backend dispatcher
//!
//! Open/close drive the transport, the opened-handle registry and the
//! backend lifecycle hooks together. Positioning and info requests are
//! forwarded to the backend unchanged: the frontend performs no range
//! validation against the configured bounds.

use rot_core::{CommState, Position, RotError, RotResult};
use tracing::{debug, info, warn};

use crate::manager::{Rot, RotId, RotManager};
use crate::registry::OpenedRegistry;
use crate::transport;

impl Rot {
    /// Command the rotator to an azimuth/elevation
    pub fn set_position(&mut self, az: f64, el: f64) -> RotResult<()> {
        self.backend.set_position(&mut self.state, az, el)
    }

    /// Query the rotator position and remember it as the last known one
    pub fn get_position(&mut self) -> RotResult<Position> {
        let position = self.backend.get_position(&mut self.state)?;
        self.state.current = position;
        Ok(position)
    }

    /// Backend-provided description, borrowed until the next call
    pub fn get_info(&mut self) -> Option<&str> {
        self.backend.get_info(&mut self.state)
    }
}

/// Close an open handle: farewell hook, transport release, unregister.
///
/// The backend close hook is advisory; its failure does not stop the
/// release of the transport or the registry update.
pub(crate) fn close_rot(id: RotId, rot: &mut Rot, opened: &mut OpenedRegistry) -> RotResult<()> {
    if !rot.state.is_open() {
        return Err(RotError::InvalidState(format!("{} is not open", id)));
    }

    if let Err(e) = rot.backend.close(&mut rot.state) {
        warn!(%id, error = %e, "Backend close failed, ignoring");
    }

    transport::close_port(&mut rot.state.port);

    if let Err(e) = opened.unregister(id) {
        warn!(%id, error = %e, "Open handle was missing from the registry");
    }

    rot.state.set_comm_state(CommState::Closed);
    Ok(())
}

impl RotManager {
    /// Open communication with the rotator.
    ///
    /// Opens the transport, registers the handle as open and runs the
    /// backend open hook. If the hook fails the handle is closed again and
    /// the hook's error is returned. On success one position query primes
    /// the last known position; its outcome does not affect the result.
    pub fn open(&mut self, id: RotId) -> RotResult<()> {
        debug!(%id, "rot_open called");

        let rot = self
            .rots
            .get_mut(&id)
            .ok_or_else(|| RotError::InvalidState(format!("{} is not a live handle", id)))?;

        if rot.state.is_open() {
            return Err(RotError::InvalidState(format!("{} is already open", id)));
        }

        transport::open_port(&mut rot.state.port, self.serial.as_ref())?;

        if let Err(e) = self.opened.register(id) {
            transport::close_port(&mut rot.state.port);
            return Err(e);
        }
        rot.state.set_comm_state(CommState::Open);

        if let Err(e) = rot.backend.open(&mut rot.state) {
            warn!(%id, error = %e, "Backend open failed, rolling back");
            if let Err(close_err) = close_rot(id, rot, &mut self.opened) {
                warn!(%id, error = %close_err, "Rollback close failed");
            }
            return Err(e);
        }

        match rot.get_position() {
            Ok(position) => debug!(%id, az = position.az, el = position.el, "Initial position"),
            Err(e) => debug!(%id, error = %e, "Initial position query failed"),
        }

        info!(
            %id,
            port_type = %rot.state.port.port_type,
            path = %rot.state.port.pathname,
            "Rotator opened"
        );
        Ok(())
    }

    /// Close communication with the rotator
    pub fn close(&mut self, id: RotId) -> RotResult<()> {
        debug!(%id, "rot_close called");

        let rot = self
            .rots
            .get_mut(&id)
            .ok_or_else(|| crate::manager::unknown_handle(id))?;
        close_rot(id, rot, &mut self.opened)?;

        info!(%id, "Rotator closed");
        Ok(())
    }

    /// Command the rotator to an azimuth/elevation.
    ///
    /// `NotAvailable` if the backend does not support positioning.
    pub fn set_position(&mut self, id: RotId, az: f64, el: f64) -> RotResult<()> {
        debug!(%id, az, el, "rot_set_position called");
        self.rot_mut(id)?.set_position(az, el)
    }

    /// Read the current azimuth/elevation.
    ///
    /// `NotAvailable` if the backend does not support position queries;
    /// the last known position is only updated on success.
    pub fn get_position(&mut self, id: RotId) -> RotResult<Position> {
        debug!(%id, "rot_get_position called");
        self.rot_mut(id)?.get_position()
    }

    /// Backend-provided description of the rotator.
    ///
    /// `None` for an unknown handle or a backend without info support.
    pub fn get_info(&mut self, id: RotId) -> Option<&str> {
        debug!(%id, "rot_get_info called");
        self.rots.get_mut(&id)?.get_info()
    }
}
