//! Capability descriptor
//!
//! Immutable description of one rotator model: identification, transport
//! defaults, mechanical bounds, backend configuration parameters and the
//! init hook creating the backend for a new handle.

use std::sync::Arc;

use crate::backend::{BackendInit, RotBackend};
use crate::error::RotResult;
use crate::model::RotModel;
use crate::port::{Handshake, Parity, PortType};
use crate::state::RotState;
use crate::token::{ConfParam, Token};

/// Capabilities and defaults of a rotator model
#[derive(Clone)]
pub struct RotCaps {
    pub model: RotModel,
    pub model_name: String,
    pub mfg_name: String,
    /// Backend version string
    pub version: String,
    /// Default transport type
    pub port_type: PortType,
    pub serial_rate_min: u32,
    pub serial_rate_max: u32,
    pub serial_data_bits: u8,
    pub serial_stop_bits: u8,
    pub serial_parity: Parity,
    pub serial_handshake: Handshake,
    pub write_delay_ms: u32,
    pub post_write_delay_ms: u32,
    pub timeout_ms: u32,
    pub retry: u32,
    pub min_az: f64,
    pub max_az: f64,
    pub min_el: f64,
    pub max_el: f64,
    /// Backend-scope configuration parameters
    pub cfg_params: Vec<ConfParam>,
    /// Creates the backend (and its private data) for a new handle
    pub init: Option<BackendInit>,
}

impl RotCaps {
    /// Descriptor with no transport, full-circle bounds and no init hook
    pub fn new(model: RotModel, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            mfg_name: String::new(),
            version: "0.1".to_string(),
            port_type: PortType::None,
            serial_rate_min: 9600,
            serial_rate_max: 9600,
            serial_data_bits: 8,
            serial_stop_bits: 1,
            serial_parity: Parity::None,
            serial_handshake: Handshake::None,
            write_delay_ms: 0,
            post_write_delay_ms: 0,
            timeout_ms: 200,
            retry: 3,
            min_az: 0.0,
            max_az: 360.0,
            min_el: 0.0,
            max_el: 90.0,
            cfg_params: Vec::new(),
            init: None,
        }
    }

    pub fn with_mfg(mut self, mfg_name: impl Into<String>) -> Self {
        self.mfg_name = mfg_name.into();
        self
    }

    pub fn with_port_type(mut self, port_type: PortType) -> Self {
        self.port_type = port_type;
        self
    }

    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&RotCaps, &mut RotState) -> RotResult<Box<dyn RotBackend>> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    pub fn with_cfg_params(mut self, cfg_params: Vec<ConfParam>) -> Self {
        self.cfg_params = cfg_params;
        self
    }

    /// Find a backend parameter by name
    pub fn find_param(&self, name: &str) -> Option<&ConfParam> {
        self.cfg_params.iter().find(|p| p.name == name)
    }

    /// Find a backend parameter by token
    pub fn find_param_by_token(&self, token: Token) -> Option<&ConfParam> {
        self.cfg_params.iter().find(|p| p.token == token)
    }
}

impl std::fmt::Debug for RotCaps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotCaps")
            .field("model", &self.model)
            .field("model_name", &self.model_name)
            .field("mfg_name", &self.mfg_name)
            .field("version", &self.version)
            .field("port_type", &self.port_type)
            .field("serial_rate_max", &self.serial_rate_max)
            .field("min_az", &self.min_az)
            .field("max_az", &self.max_az)
            .field("min_el", &self.min_el)
            .field("max_el", &self.max_el)
            .field("cfg_params", &self.cfg_params.len())
            .field("init", &self.init.is_some())
            .finish()
    }
}
