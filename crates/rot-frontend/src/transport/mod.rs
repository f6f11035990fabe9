//! Transport layer
//!
//! Opens and releases the OS resource behind a [`Port`]:
//! - serial lines through a [`SerialOpener`] (default: [`SystemSerial`])
//! - device files opened read/write
//! - `none` and `rpc` ports need nothing
//! - `network` is reserved and reports `NotImplemented`
//!
//! Reading and writing is left to the backends via [`Port::io`].

mod serial;

pub use serial::{SerialOpener, SystemSerial};

use std::fs::OpenOptions;

use rot_core::{Port, PortHandle, PortType, RotError, RotResult};
use tracing::debug;

/// Open the transport described by `port` and attach its resource
pub fn open_port(port: &mut Port, serial: &dyn SerialOpener) -> RotResult<()> {
    if port.detach().is_some() {
        debug!(path = %port.pathname, "Dropped stale port resource before open");
    }

    match port.port_type {
        PortType::Serial => {
            let stream = serial.open(port)?;
            port.attach(PortHandle::Stream(stream));
        }
        PortType::Device => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&port.pathname)
                .map_err(|e| RotError::io(format!("open device {}", port.pathname), e))?;
            port.attach(PortHandle::Raw(file));
        }
        PortType::None | PortType::Rpc => {}
        PortType::Network => {
            return Err(RotError::NotImplemented(format!(
                "network transport ({})",
                port.pathname
            )))
        }
    }

    debug!(port_type = %port.port_type, path = %port.pathname, "Transport opened");
    Ok(())
}

/// Release whichever resource the port holds.
///
/// A stream owns its descriptor, so dropping the stream releases both;
/// a raw descriptor is released directly. Ports without a resource are
/// left untouched.
pub fn close_port(port: &mut Port) {
    match port.detach() {
        Some(PortHandle::Stream(stream)) => {
            drop(stream);
            debug!(path = %port.pathname, "Released transport stream");
        }
        Some(PortHandle::Raw(file)) => {
            drop(file);
            debug!(path = %port.pathname, "Released transport descriptor");
        }
        None => {}
    }
}
