//! Transport descriptor
//!
//! A [`Port`] describes the channel used to reach the physical rotator:
//! its type, path, serial line parameters and timing. While the handle is
//! open it also owns the OS resource (raw descriptor or stream).

use std::fs::File;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{RotError, RotResult};

/// Fallback path used when no explicit path is configured
pub const DEFAULT_PATHNAME: &str = "/dev/rotator";

/// Communication channel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Serial line (RS-232, USB serial adapters)
    Serial,
    /// Raw device file opened read/write
    Device,
    /// Network socket (reserved)
    Network,
    /// Remote procedure call, handled entirely by the backend
    Rpc,
    /// No transport at all
    None,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PortType::Serial => "serial",
            PortType::Device => "device",
            PortType::Network => "network",
            PortType::Rpc => "rpc",
            PortType::None => "none",
        };
        f.write_str(s)
    }
}

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Parity::None => "None",
            Parity::Odd => "Odd",
            Parity::Even => "Even",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Parity {
    type Err = RotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Parity::None),
            "Odd" => Ok(Parity::Odd),
            "Even" => Ok(Parity::Even),
            _ => Err(RotError::InvalidArgument(format!("Unknown parity: '{}'", s))),
        }
    }
}

/// Serial flow control setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handshake {
    #[default]
    None,
    XonXoff,
    Hardware,
}

impl std::fmt::Display for Handshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Handshake::None => "None",
            Handshake::XonXoff => "XONXOFF",
            Handshake::Hardware => "Hardware",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Handshake {
    type Err = RotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Handshake::None),
            "XONXOFF" => Ok(Handshake::XonXoff),
            "Hardware" => Ok(Handshake::Hardware),
            _ => Err(RotError::InvalidArgument(format!(
                "Unknown handshake: '{}'",
                s
            ))),
        }
    }
}

/// Serial line parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialParams {
    /// Baud rate
    pub rate: u32,
    /// Data bits per character (5-8)
    pub data_bits: u8,
    /// Stop bits (1-2)
    pub stop_bits: u8,
    pub parity: Parity,
    pub handshake: Handshake,
}

impl Default for SerialParams {
    fn default() -> Self {
        Self {
            rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            handshake: Handshake::None,
        }
    }
}

/// Any bidirectional byte channel a port can hold
pub trait PortStream: Read + Write + Send {}

impl<T: Read + Write + Send + ?Sized> PortStream for T {}

/// OS resource held by an open port
pub enum PortHandle {
    /// Plain file descriptor (device files)
    Raw(File),
    /// Stream wrapping its own descriptor (serial lines, test doubles)
    Stream(Box<dyn PortStream>),
}

impl std::fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortHandle::Raw(file) => f.debug_tuple("Raw").field(file).finish(),
            PortHandle::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Transport descriptor of a rotator handle
#[derive(Debug)]
pub struct Port {
    pub port_type: PortType,
    /// Device path or address
    pub pathname: String,
    pub serial: SerialParams,
    /// Delay between characters on write, in milliseconds
    pub write_delay_ms: u32,
    /// Delay after a complete command, in milliseconds
    pub post_write_delay_ms: u32,
    /// Read timeout handed to the transport, in milliseconds
    pub timeout_ms: u32,
    /// Retry count handed to the transport
    pub retry: u32,
    handle: Option<PortHandle>,
}

impl Port {
    /// Create a closed port of the given type on the default path
    pub fn new(port_type: PortType) -> Self {
        Self {
            port_type,
            pathname: DEFAULT_PATHNAME.to_string(),
            serial: SerialParams::default(),
            write_delay_ms: 0,
            post_write_delay_ms: 0,
            timeout_ms: 0,
            retry: 0,
            handle: None,
        }
    }

    /// Whether an OS resource is currently held
    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Store the resource obtained by opening the transport
    pub fn attach(&mut self, handle: PortHandle) {
        self.handle = Some(handle);
    }

    /// Remove and return the held resource, leaving the port detached
    pub fn detach(&mut self) -> Option<PortHandle> {
        self.handle.take()
    }

    /// Byte channel of the open port
    pub fn io(&mut self) -> RotResult<&mut dyn PortStream> {
        match self.handle.as_mut() {
            Some(PortHandle::Raw(file)) => Ok(file),
            Some(PortHandle::Stream(stream)) => Ok(stream.as_mut()),
            None => Err(RotError::InvalidState(format!(
                "{} port '{}' is not open",
                self.port_type, self.pathname
            ))),
        }
    }
}
