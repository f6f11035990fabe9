//! Configuration tokens and parameter descriptions
//!
//! A token identifies one configuration parameter. Bit 30 of the raw
//! value marks frontend scope (options shared by every model); all other
//! tokens belong to the backend of the handle they are applied to.

use serde::{Deserialize, Serialize};

const FRONTEND_BIT: u32 = 1 << 30;

/// Which layer handles a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Frontend,
    Backend,
}

/// Identifier of a configuration parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(u32);

impl Token {
    /// Token handled by the frontend configuration handler
    pub const fn frontend(n: u32) -> Self {
        Token(n | FRONTEND_BIT)
    }

    /// Token forwarded to the backend
    pub const fn backend(n: u32) -> Self {
        Token(n & !FRONTEND_BIT)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Token(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_frontend(self) -> bool {
        self.0 & FRONTEND_BIT != 0
    }

    pub const fn scope(self) -> TokenScope {
        if self.is_frontend() {
            TokenScope::Frontend
        } else {
            TokenScope::Backend
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scope() {
            TokenScope::Frontend => write!(f, "frontend:{}", self.0 & !FRONTEND_BIT),
            TokenScope::Backend => write!(f, "backend:{}", self.0),
        }
    }
}

/// Value domain of a configuration parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConfKind {
    Numeric { min: f64, max: f64, step: f64 },
    Combo { options: &'static [&'static str] },
    String,
    Checkbutton,
}

/// Description of one configuration parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfParam {
    pub token: Token,
    /// Name used for lookups (e.g. "serial_speed")
    pub name: &'static str,
    pub label: &'static str,
    pub tooltip: &'static str,
    /// Default value, in the same string form `set_conf` accepts
    pub default: &'static str,
    pub kind: ConfKind,
}
