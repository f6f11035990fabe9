//! Test doubles for frontend consumers
//!
//! - [`ScriptedBackend`]: a backend whose hooks can be told to fail and
//!   which counts every call, observed through a shared [`Probe`]
//! - [`MockSerial`]: a serial opener handing out in-memory streams and
//!   counting how many were opened and released

use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rot_core::{
    ConfKind, ConfParam, Port, PortStream, PortType, Position, RotBackend, RotCaps, RotError,
    RotModel, RotResult, RotState, Token,
};

use crate::transport::SerialOpener;

/// Backend parameter understood by [`ScriptedBackend`]
pub const TOK_SPEED: Token = Token::backend(1);

/// Shared observation point of a [`ScriptedBackend`]
#[derive(Debug, Default)]
pub struct Probe {
    opens: AtomicUsize,
    closes: AtomicUsize,
    cleanups: AtomicUsize,
    position_queries: AtomicUsize,
    fail_init: AtomicBool,
    fail_open: AtomicBool,
    fail_close: AtomicBool,
    reported: Mutex<Position>,
    last_command: Mutex<Option<Position>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open hook invocations, failed ones included
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }

    pub fn position_queries(&self) -> usize {
        self.position_queries.load(Ordering::SeqCst)
    }

    pub fn fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Position returned by subsequent position queries
    pub fn set_reported_position(&self, position: Position) {
        *self.reported.lock() = position;
    }

    /// Last position passed to `set_position`
    pub fn last_command(&self) -> Option<Position> {
        *self.last_command.lock()
    }
}

/// Backend driven by a [`Probe`]
#[derive(Debug)]
pub struct ScriptedBackend {
    probe: Arc<Probe>,
    speed: String,
}

impl RotBackend for ScriptedBackend {
    fn open(&mut self, _state: &mut RotState) -> RotResult<()> {
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_open.load(Ordering::SeqCst) {
            return Err(RotError::Protocol("scripted open failure".into()));
        }
        Ok(())
    }

    fn close(&mut self, _state: &mut RotState) -> RotResult<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_close.load(Ordering::SeqCst) {
            return Err(RotError::Protocol("scripted close failure".into()));
        }
        Ok(())
    }

    fn cleanup(&mut self, _state: &mut RotState) {
        self.probe.cleanups.fetch_add(1, Ordering::SeqCst);
    }

    fn set_conf(&mut self, _state: &mut RotState, token: Token, val: &str) -> RotResult<()> {
        match token {
            TOK_SPEED => {
                self.speed = val.to_string();
                Ok(())
            }
            _ => Err(RotError::InvalidArgument(format!("unknown token {}", token))),
        }
    }

    fn get_conf(&mut self, _state: &mut RotState, token: Token) -> RotResult<String> {
        match token {
            TOK_SPEED => Ok(self.speed.clone()),
            _ => Err(RotError::InvalidArgument(format!("unknown token {}", token))),
        }
    }

    fn set_position(&mut self, _state: &mut RotState, az: f64, el: f64) -> RotResult<()> {
        *self.probe.last_command.lock() = Some(Position::new(az, el));
        Ok(())
    }

    fn get_position(&mut self, _state: &mut RotState) -> RotResult<Position> {
        self.probe.position_queries.fetch_add(1, Ordering::SeqCst);
        Ok(*self.probe.reported.lock())
    }

    fn get_info(&mut self, _state: &mut RotState) -> Option<&str> {
        Some("Scripted rotator")
    }
}

/// Descriptor whose init hook creates a [`ScriptedBackend`] bound to `probe`
pub fn scripted_caps(model: RotModel, port_type: PortType, probe: Arc<Probe>) -> RotCaps {
    let mut caps = bare_caps(model, port_type);
    caps.model_name = "Scripted".to_string();
    caps.with_cfg_params(vec![ConfParam {
        token: TOK_SPEED,
        name: "speed",
        label: "Speed",
        tooltip: "Slew speed setting",
        default: "1",
        kind: ConfKind::Numeric {
            min: 1.0,
            max: 4.0,
            step: 1.0,
        },
    }])
    .with_init(move |_, _| {
        if probe.fail_init.load(Ordering::SeqCst) {
            return Err(RotError::Protocol("scripted init failure".into()));
        }
        Ok(Box::new(ScriptedBackend {
            probe: probe.clone(),
            speed: "1".to_string(),
        }))
    })
}

/// Descriptor without init hook: every optional operation is unavailable.
///
/// Accepts serial speeds from 1200 to 19200 baud.
pub fn bare_caps(model: RotModel, port_type: PortType) -> RotCaps {
    let mut caps = RotCaps::new(model, "Bare")
        .with_mfg("Test")
        .with_port_type(port_type);
    caps.serial_rate_min = 1200;
    caps.serial_rate_max = 19200;
    caps
}

/// Serial opener producing in-memory streams
#[derive(Debug, Default)]
pub struct MockSerial {
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
    fail_next_open: AtomicBool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams dropped so far
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Make the next open fail with an I/O error
    pub fn fail_next_open(&self, fail: bool) {
        self.fail_next_open.store(fail, Ordering::SeqCst);
    }
}

impl SerialOpener for MockSerial {
    fn open(&self, port: &Port) -> RotResult<Box<dyn PortStream>> {
        if self.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(RotError::io(
                format!("open serial {}", port.pathname),
                io::Error::new(io::ErrorKind::NotFound, "no such device"),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedStream {
            buf: Cursor::new(Vec::new()),
            released: self.released.clone(),
        }))
    }
}

struct TrackedStream {
    buf: Cursor<Vec<u8>>,
    released: Arc<AtomicUsize>,
}

impl Read for TrackedStream {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.buf.read(out)
    }
}

impl Write for TrackedStream {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
