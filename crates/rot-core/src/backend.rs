//! RotBackend trait - the abstraction implemented by every rotator model

use std::sync::Arc;

use crate::caps::RotCaps;
use crate::error::{RotError, RotResult};
use crate::state::{Position, RotState};
use crate::token::Token;

/// Init hook of a capability descriptor.
///
/// Called once per handle after the frontend has filled `RotState` with
/// the descriptor defaults. The hook may override any of them and returns
/// the backend object, which doubles as the handle's private data.
pub type BackendInit =
    Arc<dyn Fn(&RotCaps, &mut RotState) -> RotResult<Box<dyn RotBackend>> + Send + Sync>;

/// The trait that all rotator backends implement.
///
/// Every method is optional. Lifecycle hooks (`open`, `close`, `cleanup`)
/// default to doing nothing; the remaining operations default to
/// `NotAvailable`, which the frontend reports unchanged to its caller.
pub trait RotBackend: Send {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Called after the transport is open. An error aborts the open.
    fn open(&mut self, state: &mut RotState) -> RotResult<()> {
        let _ = state;
        Ok(())
    }

    /// Called before the transport is released. Errors are ignored.
    fn close(&mut self, state: &mut RotState) -> RotResult<()> {
        let _ = state;
        Ok(())
    }

    /// Release private resources before the handle is dropped
    fn cleanup(&mut self, state: &mut RotState) {
        let _ = state;
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set a backend-scope configuration parameter
    fn set_conf(&mut self, state: &mut RotState, token: Token, val: &str) -> RotResult<()> {
        let _ = (state, token, val);
        Err(RotError::not_available("set_conf"))
    }

    /// Read a backend-scope configuration parameter
    fn get_conf(&mut self, state: &mut RotState, token: Token) -> RotResult<String> {
        let _ = (state, token);
        Err(RotError::not_available("get_conf"))
    }

    // =========================================================================
    // Positioning
    // =========================================================================

    /// Command the rotator to an azimuth/elevation
    fn set_position(&mut self, state: &mut RotState, az: f64, el: f64) -> RotResult<()> {
        let _ = (state, az, el);
        Err(RotError::not_available("set_position"))
    }

    /// Read the current azimuth/elevation
    fn get_position(&mut self, state: &mut RotState) -> RotResult<Position> {
        let _ = state;
        Err(RotError::not_available("get_position"))
    }

    /// Free-form description (firmware revision, exact model name, ...).
    ///
    /// The text is borrowed from the backend and only valid until the
    /// next call on it.
    fn get_info(&mut self, state: &mut RotState) -> Option<&str> {
        let _ = state;
        None
    }
}

/// Backend used when a descriptor has no init hook: supports nothing
#[derive(Debug, Default)]
pub struct NullBackend;

impl RotBackend for NullBackend {}
