//! Rotator model identifiers

use serde::{Deserialize, Serialize};

/// Number of model ids reserved per backend family
pub const BACKEND_SPAN: u32 = 100;

/// Identifier of a rotator model.
///
/// The hundreds part selects the backend family that implements the
/// model (`RotModel(102)` belongs to family 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotModel(pub u32);

impl RotModel {
    /// Build a model id from a backend family and a model number within it
    pub const fn make(backend: u32, number: u32) -> Self {
        RotModel(backend * BACKEND_SPAN + number)
    }

    /// Backend family this model belongs to
    pub const fn backend_num(self) -> u32 {
        self.0 / BACKEND_SPAN
    }
}

impl std::fmt::Display for RotModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
