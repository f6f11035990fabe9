//! Configuration token router
//!
//! Frontend-scope tokens (transport path, serial and timing parameters,
//! bounds) are handled here for every model. Backend-scope tokens are
//! forwarded to the handle's backend, which answers `NotAvailable` when it
//! has no configuration support.

use std::str::FromStr;

use rot_core::{ConfKind, ConfParam, RotCaps, RotError, RotResult, RotState, Token, TokenScope};
use tracing::debug;

use crate::manager::{Rot, RotId, RotManager};

pub const TOK_PATHNAME: Token = Token::frontend(10);
pub const TOK_WRITE_DELAY: Token = Token::frontend(12);
pub const TOK_POST_WRITE_DELAY: Token = Token::frontend(13);
pub const TOK_TIMEOUT: Token = Token::frontend(14);
pub const TOK_RETRY: Token = Token::frontend(15);
pub const TOK_SERIAL_SPEED: Token = Token::frontend(20);
pub const TOK_DATA_BITS: Token = Token::frontend(21);
pub const TOK_STOP_BITS: Token = Token::frontend(22);
pub const TOK_PARITY: Token = Token::frontend(23);
pub const TOK_HANDSHAKE: Token = Token::frontend(24);
pub const TOK_MIN_AZ: Token = Token::frontend(110);
pub const TOK_MAX_AZ: Token = Token::frontend(111);
pub const TOK_MIN_EL: Token = Token::frontend(112);
pub const TOK_MAX_EL: Token = Token::frontend(113);

/// Parameters understood by every handle, whatever its backend
pub static FRONTEND_PARAMS: &[ConfParam] = &[
    ConfParam {
        token: TOK_PATHNAME,
        name: "rot_pathname",
        label: "Rig path name",
        tooltip: "Path name to the device file of the rotator",
        default: rot_core::DEFAULT_PATHNAME,
        kind: ConfKind::String,
    },
    ConfParam {
        token: TOK_WRITE_DELAY,
        name: "write_delay",
        label: "Write delay",
        tooltip: "Delay in ms between each byte sent out",
        default: "0",
        kind: ConfKind::Numeric {
            min: 0.0,
            max: 1000.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_POST_WRITE_DELAY,
        name: "post_write_delay",
        label: "Post write delay",
        tooltip: "Delay in ms between each command sent out",
        default: "0",
        kind: ConfKind::Numeric {
            min: 0.0,
            max: 1000.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_TIMEOUT,
        name: "timeout",
        label: "Timeout",
        tooltip: "Timeout in ms",
        default: "200",
        kind: ConfKind::Numeric {
            min: 0.0,
            max: 10000.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_RETRY,
        name: "retry",
        label: "Retry",
        tooltip: "Max number of retry",
        default: "3",
        kind: ConfKind::Numeric {
            min: 0.0,
            max: 10.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_SERIAL_SPEED,
        name: "serial_speed",
        label: "Serial speed",
        tooltip: "Serial port baud rate",
        default: "9600",
        kind: ConfKind::Numeric {
            min: 300.0,
            max: 115200.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_DATA_BITS,
        name: "data_bits",
        label: "Serial data bits",
        tooltip: "Serial port data bits",
        default: "8",
        kind: ConfKind::Numeric {
            min: 5.0,
            max: 8.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_STOP_BITS,
        name: "stop_bits",
        label: "Serial stop bits",
        tooltip: "Serial port stop bits",
        default: "1",
        kind: ConfKind::Numeric {
            min: 1.0,
            max: 2.0,
            step: 1.0,
        },
    },
    ConfParam {
        token: TOK_PARITY,
        name: "serial_parity",
        label: "Serial parity",
        tooltip: "Serial port parity",
        default: "None",
        kind: ConfKind::Combo {
            options: &["None", "Odd", "Even"],
        },
    },
    ConfParam {
        token: TOK_HANDSHAKE,
        name: "serial_handshake",
        label: "Serial handshake",
        tooltip: "Serial port handshake",
        default: "None",
        kind: ConfKind::Combo {
            options: &["None", "XONXOFF", "Hardware"],
        },
    },
    ConfParam {
        token: TOK_MIN_AZ,
        name: "min_az",
        label: "Minimum azimuth",
        tooltip: "Minimum rotator azimuth in degrees",
        default: "0",
        kind: ConfKind::Numeric {
            min: -360.0,
            max: 360.0,
            step: 0.001,
        },
    },
    ConfParam {
        token: TOK_MAX_AZ,
        name: "max_az",
        label: "Maximum azimuth",
        tooltip: "Maximum rotator azimuth in degrees",
        default: "360",
        kind: ConfKind::Numeric {
            min: -360.0,
            max: 360.0,
            step: 0.001,
        },
    },
    ConfParam {
        token: TOK_MIN_EL,
        name: "min_el",
        label: "Minimum elevation",
        tooltip: "Minimum rotator elevation in degrees",
        default: "0",
        kind: ConfKind::Numeric {
            min: -90.0,
            max: 180.0,
            step: 0.001,
        },
    },
    ConfParam {
        token: TOK_MAX_EL,
        name: "max_el",
        label: "Maximum elevation",
        tooltip: "Maximum rotator elevation in degrees",
        default: "90",
        kind: ConfKind::Numeric {
            min: -90.0,
            max: 180.0,
            step: 0.001,
        },
    },
];

fn parse_value<T: FromStr>(token: Token, val: &str) -> RotResult<T> {
    val.trim()
        .parse()
        .map_err(|_| RotError::InvalidArgument(format!("bad value '{}' for {}", val, token)))
}

fn parse_in_range(token: Token, val: &str, range: std::ops::RangeInclusive<u8>) -> RotResult<u8> {
    let n: u8 = parse_value(token, val)?;
    if !range.contains(&n) {
        return Err(RotError::InvalidArgument(format!(
            "{} out of range for {}",
            n, token
        )));
    }
    Ok(n)
}

fn parse_rate(caps: &RotCaps, token: Token, val: &str) -> RotResult<u32> {
    let rate: u32 = parse_value(token, val)?;
    if !(caps.serial_rate_min..=caps.serial_rate_max).contains(&rate) {
        return Err(RotError::InvalidArgument(format!(
            "{} baud outside {}..={} supported by model {}",
            rate, caps.serial_rate_min, caps.serial_rate_max, caps.model
        )));
    }
    Ok(rate)
}

/// Apply a frontend-scope token to the handle state.
///
/// The serial speed must lie within the rates of the model's descriptor.
pub fn frontend_set_conf(
    caps: &RotCaps,
    state: &mut RotState,
    token: Token,
    val: &str,
) -> RotResult<()> {
    let port = &mut state.port;
    match token {
        TOK_PATHNAME => port.pathname = val.to_string(),
        TOK_WRITE_DELAY => port.write_delay_ms = parse_value(token, val)?,
        TOK_POST_WRITE_DELAY => port.post_write_delay_ms = parse_value(token, val)?,
        TOK_TIMEOUT => port.timeout_ms = parse_value(token, val)?,
        TOK_RETRY => port.retry = parse_value(token, val)?,
        TOK_SERIAL_SPEED => port.serial.rate = parse_rate(caps, token, val)?,
        TOK_DATA_BITS => port.serial.data_bits = parse_in_range(token, val, 5..=8)?,
        TOK_STOP_BITS => port.serial.stop_bits = parse_in_range(token, val, 1..=2)?,
        TOK_PARITY => port.serial.parity = val.parse()?,
        TOK_HANDSHAKE => port.serial.handshake = val.parse()?,
        TOK_MIN_AZ => state.min_az = parse_value(token, val)?,
        TOK_MAX_AZ => state.max_az = parse_value(token, val)?,
        TOK_MIN_EL => state.min_el = parse_value(token, val)?,
        TOK_MAX_EL => state.max_el = parse_value(token, val)?,
        _ => {
            return Err(RotError::InvalidArgument(format!(
                "unknown frontend token {}",
                token
            )))
        }
    }
    Ok(())
}

/// Read a frontend-scope token from the handle state
pub fn frontend_get_conf(state: &RotState, token: Token) -> RotResult<String> {
    let port = &state.port;
    let val = match token {
        TOK_PATHNAME => port.pathname.clone(),
        TOK_WRITE_DELAY => port.write_delay_ms.to_string(),
        TOK_POST_WRITE_DELAY => port.post_write_delay_ms.to_string(),
        TOK_TIMEOUT => port.timeout_ms.to_string(),
        TOK_RETRY => port.retry.to_string(),
        TOK_SERIAL_SPEED => port.serial.rate.to_string(),
        TOK_DATA_BITS => port.serial.data_bits.to_string(),
        TOK_STOP_BITS => port.serial.stop_bits.to_string(),
        TOK_PARITY => port.serial.parity.to_string(),
        TOK_HANDSHAKE => port.serial.handshake.to_string(),
        TOK_MIN_AZ => state.min_az.to_string(),
        TOK_MAX_AZ => state.max_az.to_string(),
        TOK_MIN_EL => state.min_el.to_string(),
        TOK_MAX_EL => state.max_el.to_string(),
        _ => {
            return Err(RotError::InvalidArgument(format!(
                "unknown frontend token {}",
                token
            )))
        }
    };
    Ok(val)
}

impl Rot {
    /// Set a configuration parameter, routed by token scope
    pub fn set_conf(&mut self, token: Token, val: &str) -> RotResult<()> {
        match token.scope() {
            TokenScope::Frontend => frontend_set_conf(&self.caps, &mut self.state, token, val),
            TokenScope::Backend => self.backend.set_conf(&mut self.state, token, val),
        }
    }

    /// Read a configuration parameter, routed by token scope
    pub fn get_conf(&mut self, token: Token) -> RotResult<String> {
        match token.scope() {
            TokenScope::Frontend => frontend_get_conf(&self.state, token),
            TokenScope::Backend => self.backend.get_conf(&mut self.state, token),
        }
    }

    /// Resolve a parameter name, frontend table first
    pub fn token_lookup(&self, name: &str) -> RotResult<&ConfParam> {
        FRONTEND_PARAMS
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.caps.find_param(name))
            .ok_or_else(|| RotError::NotFound(format!("configuration parameter '{}'", name)))
    }

    /// Every parameter this handle accepts: frontend ones, then backend ones
    pub fn conf_params(&self) -> impl Iterator<Item = &ConfParam> + '_ {
        FRONTEND_PARAMS.iter().chain(self.caps.cfg_params.iter())
    }
}

impl RotManager {
    /// Set a configuration parameter on a handle
    pub fn set_conf(&mut self, id: RotId, token: Token, val: &str) -> RotResult<()> {
        debug!(%id, %token, val, "rot_set_conf called");
        self.rot_mut(id)?.set_conf(token, val)
    }

    /// Read a configuration parameter of a handle
    pub fn get_conf(&mut self, id: RotId, token: Token) -> RotResult<String> {
        debug!(%id, %token, "rot_get_conf called");
        self.rot_mut(id)?.get_conf(token)
    }

    /// Resolve a parameter name to its token for a handle
    pub fn token_lookup(&self, id: RotId, name: &str) -> RotResult<Token> {
        let rot = self
            .rot(id)
            .ok_or_else(|| crate::manager::unknown_handle(id))?;
        rot.token_lookup(name).map(|param| param.token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::caps_registry::CapsRegistry;
    use crate::testing::{bare_caps, scripted_caps, MockSerial, Probe, TOK_SPEED};
    use pretty_assertions::assert_eq;
    use rot_core::{ErrorKind, Handshake, Parity, PortType, RotModel};
    use rstest::rstest;

    fn setup() -> (RotManager, RotId, RotId) {
        let registry = Arc::new(CapsRegistry::new());
        registry
            .register(scripted_caps(RotModel(30), PortType::Serial, Probe::new()))
            .unwrap();
        registry
            .register(bare_caps(RotModel(31), PortType::Serial))
            .unwrap();
        let mut mgr = RotManager::with_serial(registry, Arc::new(MockSerial::new()));
        let scripted = mgr.create(RotModel(30)).unwrap();
        let bare = mgr.create(RotModel(31)).unwrap();
        (mgr, scripted, bare)
    }

    #[rstest]
    #[case(TOK_PATHNAME, "/dev/ttyS1")]
    #[case(TOK_WRITE_DELAY, "5")]
    #[case(TOK_POST_WRITE_DELAY, "100")]
    #[case(TOK_TIMEOUT, "1500")]
    #[case(TOK_RETRY, "4")]
    #[case(TOK_SERIAL_SPEED, "4800")]
    #[case(TOK_DATA_BITS, "7")]
    #[case(TOK_STOP_BITS, "2")]
    #[case(TOK_PARITY, "Odd")]
    #[case(TOK_HANDSHAKE, "XONXOFF")]
    #[case(TOK_MIN_AZ, "-180")]
    #[case(TOK_MAX_AZ, "350")]
    #[case(TOK_MIN_EL, "5.5")]
    #[case(TOK_MAX_EL, "85")]
    fn test_frontend_round_trip(#[case] token: Token, #[case] val: &str) {
        let (mut mgr, _, bare) = setup();
        mgr.set_conf(bare, token, val).unwrap();
        assert_eq!(mgr.get_conf(bare, token).unwrap(), val);
    }

    #[test]
    fn test_frontend_tokens_update_state() {
        let (mut mgr, _, bare) = setup();
        mgr.set_conf(bare, TOK_PARITY, "Even").unwrap();
        mgr.set_conf(bare, TOK_HANDSHAKE, "Hardware").unwrap();
        mgr.set_conf(bare, TOK_MAX_AZ, "270").unwrap();

        let state = mgr.rot(bare).unwrap().state();
        assert_eq!(state.port.serial.parity, Parity::Even);
        assert_eq!(state.port.serial.handshake, Handshake::Hardware);
        assert_eq!(state.max_az, 270.0);
    }

    #[rstest]
    #[case(TOK_SERIAL_SPEED, "fast")]
    #[case(TOK_DATA_BITS, "9")]
    #[case(TOK_STOP_BITS, "0")]
    #[case(TOK_STOP_BITS, "3")]
    #[case(TOK_SERIAL_SPEED, "600")]
    #[case(TOK_SERIAL_SPEED, "38400")]
    #[case(TOK_PARITY, "Mark")]
    #[case(TOK_MIN_EL, "")]
    #[case(Token::frontend(999), "1")]
    fn test_frontend_rejects_bad_values(#[case] token: Token, #[case] val: &str) {
        let (mut mgr, _, bare) = setup();
        let err = mgr.set_conf(bare, token, val).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_backend_tokens_are_forwarded() {
        let (mut mgr, scripted, _) = setup();
        mgr.set_conf(scripted, TOK_SPEED, "3").unwrap();
        assert_eq!(mgr.get_conf(scripted, TOK_SPEED).unwrap(), "3");
    }

    #[test]
    fn test_backend_without_conf_is_not_available() {
        let (mut mgr, _, bare) = setup();
        assert_eq!(
            mgr.set_conf(bare, Token::backend(1), "3").unwrap_err().kind(),
            ErrorKind::NotAvailable
        );
        assert_eq!(
            mgr.get_conf(bare, Token::backend(1)).unwrap_err().kind(),
            ErrorKind::NotAvailable
        );
    }

    #[test]
    fn test_unknown_handle() {
        let (mut mgr, _, _) = setup();
        assert_eq!(
            mgr.set_conf(RotId(99), TOK_RETRY, "1").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            mgr.get_conf(RotId(99), TOK_RETRY).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_token_lookup() {
        let (mgr, scripted, bare) = setup();
        assert_eq!(mgr.token_lookup(bare, "serial_speed").unwrap(), TOK_SERIAL_SPEED);
        assert_eq!(mgr.token_lookup(scripted, "speed").unwrap(), TOK_SPEED);
        assert_eq!(
            mgr.token_lookup(bare, "speed").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_conf_params_lists_both_scopes() {
        let (mgr, scripted, _) = setup();
        let names: Vec<&str> = mgr
            .rot(scripted)
            .unwrap()
            .conf_params()
            .map(|p| p.name)
            .collect();
        assert_eq!(names.len(), FRONTEND_PARAMS.len() + 1);
        assert_eq!(names.first(), Some(&"rot_pathname"));
        assert_eq!(names.last(), Some(&"speed"));
    }

    #[test]
    fn test_table_defaults_match_plain_descriptor() {
        let caps = RotCaps::new(RotModel(32), "Plain").with_port_type(PortType::Serial);
        let state = crate::manager::default_state(&caps);

        for param in FRONTEND_PARAMS {
            assert_eq!(
                frontend_get_conf(&state, param.token).unwrap(),
                param.default,
                "{}",
                param.name
            );
        }
    }

    #[test]
    fn test_table_defaults_are_accepted() {
        let caps = RotCaps::new(RotModel(33), "Plain");
        let mut state = crate::manager::default_state(&caps);

        for param in FRONTEND_PARAMS {
            frontend_set_conf(&caps, &mut state, param.token, param.default).unwrap();
            if let ConfKind::Numeric { min, max, .. } = param.kind {
                let value: f64 = param.default.parse().unwrap();
                assert!((min..=max).contains(&value), "{}", param.name);
            }
        }
    }

    #[test]
    fn test_numeric_ranges_match_setter() {
        let caps = RotCaps::new(RotModel(34), "Plain");
        let mut state = crate::manager::default_state(&caps);

        for (token, low, high) in [(TOK_DATA_BITS, "5", "8"), (TOK_STOP_BITS, "1", "2")] {
            let param = FRONTEND_PARAMS.iter().find(|p| p.token == token).unwrap();
            assert_eq!(
                param.kind,
                ConfKind::Numeric {
                    min: low.parse().unwrap(),
                    max: high.parse().unwrap(),
                    step: 1.0,
                }
            );
            frontend_set_conf(&caps, &mut state, token, low).unwrap();
            frontend_set_conf(&caps, &mut state, token, high).unwrap();
        }
    }

    #[rstest]
    #[case("1200", true)]
    #[case("19200", true)]
    #[case("1199", false)]
    #[case("19201", false)]
    fn test_serial_speed_limited_by_descriptor(#[case] rate: &str, #[case] accepted: bool) {
        let mut caps = RotCaps::new(RotModel(35), "Ranged");
        caps.serial_rate_min = 1200;
        caps.serial_rate_max = 19200;
        let mut state = crate::manager::default_state(&caps);

        let result = frontend_set_conf(&caps, &mut state, TOK_SERIAL_SPEED, rate);
        assert_eq!(result.is_ok(), accepted);
        if accepted {
            assert_eq!(state.port.serial.rate.to_string(), rate);
        } else {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(state.port.serial.rate, 19200);
        }
    }

    #[test]
    fn test_frontend_table_is_frontend_scoped() {
        for param in FRONTEND_PARAMS {
            assert_eq!(param.token.scope(), TokenScope::Frontend, "{}", param.name);
        }
    }
}
