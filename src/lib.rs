//! Orrery: positions, orientations and brightness of solar system bodies
//!
//! Bodies live in a [`BodyHierarchy`] tree. Each body has its own orbit
//! model relative to its parent and its own rotation model. Advancing the
//! hierarchy to a [`Time`] evaluates every body and composes heliocentric
//! positions up the tree. Observational quantities (phase, magnitude,
//! angular size, shadow candidates) are derived from that state on request.

use thiserror::Error;

pub mod cache;
pub mod celestial;
pub mod config;
pub mod constants;
pub mod framelib;
pub mod orbits;
pub mod photometry;
pub mod planetlib;
pub mod rotation;
pub mod system;
pub mod time;

// Re-export commonly used types
pub use celestial::{AssetProvider, CelestialBody, Ring};
pub use config::{BodyConfig, Settings, SystemConfig};
pub use orbits::{OrbitModel, StateVector};
pub use photometry::MagnitudeAlgorithm;
pub use planetlib::{Body, PlanetType};
pub use rotation::{AxisCorrection, CorrectionTable, RotationElements};
pub use system::{BodyHierarchy, BodyId, RejectedBody};
pub use time::{CalendarTuple, Time, TimeError, TimeFlavor, Timescale};

/// Main error type for the orrery library
#[derive(Debug, Error)]
pub enum OrreryError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown magnitude algorithm: {0}")]
    UnknownMagnitudeAlgorithm(String),

    #[error("Magnitude algorithm is undefined")]
    UndefinedMagnitudeAlgorithm,

    #[error("Unknown body: {0}")]
    UnknownBody(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for orrery operations
pub type Result<T> = std::result::Result<T, OrreryError>;

/// Build the built-in solar system
pub fn solar_system() -> Result<BodyHierarchy> {
    Ok(SystemConfig::solar_system()?.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OrreryError::UnknownMagnitudeAlgorithm("Planck".into());
        assert_eq!(err.to_string(), "Unknown magnitude algorithm: Planck");
        let err: OrreryError = TimeError::InvalidFormat("bad".into()).into();
        assert!(matches!(err, OrreryError::Time(_)));
    }

    #[test]
    fn test_builtin_system_has_no_rejections() {
        let system = solar_system().unwrap();
        assert!(system.rejected().is_empty(), "{:?}", system.rejected());
        assert!(system.find("Sun").is_some());
    }
}
