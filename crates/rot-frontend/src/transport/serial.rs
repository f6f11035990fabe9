//! Serial line transport

use std::time::Duration;

use rot_core::{Handshake, Parity, Port, PortStream, RotError, RotResult};

/// Opens serial lines for the frontend.
///
/// The frontend only needs open; closing is dropping the returned stream.
pub trait SerialOpener: Send + Sync {
    /// Open `port.pathname` with the port's serial and timing settings
    fn open(&self, port: &Port) -> RotResult<Box<dyn PortStream>>;
}

/// Serial lines of the host, via the `serialport` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSerial;

impl SerialOpener for SystemSerial {
    fn open(&self, port: &Port) -> RotResult<Box<dyn PortStream>> {
        let data_bits = match port.serial.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            n => {
                return Err(RotError::InvalidArgument(format!(
                    "unsupported data bits: {}",
                    n
                )))
            }
        };
        let stop_bits = match port.serial.stop_bits {
            1 => serialport::StopBits::One,
            2 => serialport::StopBits::Two,
            n => {
                return Err(RotError::InvalidArgument(format!(
                    "unsupported stop bits: {}",
                    n
                )))
            }
        };
        let parity = match port.serial.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };
        let flow_control = match port.serial.handshake {
            Handshake::None => serialport::FlowControl::None,
            Handshake::XonXoff => serialport::FlowControl::Software,
            Handshake::Hardware => serialport::FlowControl::Hardware,
        };

        let line = serialport::new(port.pathname.as_str(), port.serial.rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(flow_control)
            .timeout(Duration::from_millis(u64::from(port.timeout_ms)))
            .open()
            .map_err(|e| map_serial_error(&port.pathname, e))?;

        Ok(Box::new(line))
    }
}

fn map_serial_error(path: &str, err: serialport::Error) -> RotError {
    match err.kind() {
        serialport::ErrorKind::InvalidInput => {
            RotError::InvalidArgument(format!("serial {}: {}", path, err))
        }
        _ => RotError::io(format!("open serial {}", path), err.into()),
    }
}
