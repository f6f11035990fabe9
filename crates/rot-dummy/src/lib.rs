//! rot-dummy - Simulated rotator backend
//!
//! A rotator without hardware: it needs no transport, accepts every
//! command and reports the last commanded position back. Useful for
//! trying out a frontend setup and as a reference for backend authors.

use rot_core::{
    ConfKind, ConfParam, Position, PortType, RotBackend, RotCaps, RotError, RotModel, RotResult,
    RotState, Token,
};
use tracing::{debug, info};

/// Backend family of the simulated models
pub const DUMMY_BACKEND: u32 = 0;

/// Model id of the simulated rotator
pub const MODEL_DUMMY: RotModel = RotModel::make(DUMMY_BACKEND, 1);

/// Free-form backend parameter with no effect on the simulation
pub const TOK_MAGICCONF: Token = Token::backend(1);

const MAGICCONF_DEFAULT: &str = "DX";

/// Simulated rotator state
#[derive(Debug)]
pub struct DummyRotator {
    target: Position,
    magic_conf: String,
    info: String,
}

impl DummyRotator {
    pub fn new(caps: &RotCaps) -> Self {
        Self {
            target: Position::default(),
            magic_conf: MAGICCONF_DEFAULT.to_string(),
            info: format!("{} {} v{}", caps.mfg_name, caps.model_name, caps.version),
        }
    }
}

impl RotBackend for DummyRotator {
    fn open(&mut self, _state: &mut RotState) -> RotResult<()> {
        info!(model = %MODEL_DUMMY, "Dummy rotator opened");
        Ok(())
    }

    fn close(&mut self, _state: &mut RotState) -> RotResult<()> {
        info!(model = %MODEL_DUMMY, "Dummy rotator closed");
        Ok(())
    }

    fn set_conf(&mut self, _state: &mut RotState, token: Token, val: &str) -> RotResult<()> {
        match token {
            TOK_MAGICCONF => {
                self.magic_conf = val.to_string();
                Ok(())
            }
            _ => Err(RotError::InvalidArgument(format!(
                "unknown dummy token {}",
                token
            ))),
        }
    }

    fn get_conf(&mut self, _state: &mut RotState, token: Token) -> RotResult<String> {
        match token {
            TOK_MAGICCONF => Ok(self.magic_conf.clone()),
            _ => Err(RotError::InvalidArgument(format!(
                "unknown dummy token {}",
                token
            ))),
        }
    }

    fn set_position(&mut self, _state: &mut RotState, az: f64, el: f64) -> RotResult<()> {
        debug!(az, el, "Dummy rotator moving");
        self.target = Position::new(az, el);
        Ok(())
    }

    fn get_position(&mut self, _state: &mut RotState) -> RotResult<Position> {
        Ok(self.target)
    }

    fn get_info(&mut self, _state: &mut RotState) -> Option<&str> {
        Some(self.info.as_str())
    }
}

/// Capability descriptor of the simulated rotator
pub fn caps() -> RotCaps {
    let mut caps = RotCaps::new(MODEL_DUMMY, "Dummy")
        .with_mfg("Hamlib")
        .with_port_type(PortType::None)
        .with_cfg_params(vec![ConfParam {
            token: TOK_MAGICCONF,
            name: "mcfg",
            label: "Magic conf",
            tooltip: "Magic parameter, as an example",
            default: MAGICCONF_DEFAULT,
            kind: ConfKind::String,
        }])
        .with_init(|caps, _state| Ok(Box::new(DummyRotator::new(caps))));
    caps.min_az = 0.0;
    caps.max_az = 360.0;
    caps.min_el = 0.0;
    caps.max_el = 90.0;
    caps
}

/// Every descriptor of the dummy backend family
pub fn all_caps() -> Vec<RotCaps> {
    vec![caps()]
}
