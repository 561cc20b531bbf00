use super::StateVector;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A body held at a constant position relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FixedOrbit {
    pub position: Vector3<f64>,
}

impl FixedOrbit {
    pub fn new(position: Vector3<f64>) -> Self {
        Self { position }
    }

    pub fn set_position(&mut self, position: Vector3<f64>) {
        self.position = position;
    }

    pub fn evaluate(&self) -> StateVector {
        StateVector {
            position: self.position,
            velocity: Vector3::zeros(),
        }
    }
}
