//! Global settings and static per-body configuration
//!
//! Body records use degrees, kilometres and days, and are converted to the
//! internal units (radians, AU) when a body is built.

use crate::cache::PositionCache;
use crate::celestial::{CelestialBody, Ring};
use crate::constants::{AU_KM, DEG2RAD, GM_SUN_AU, J2000};
use crate::orbits::{
    FixedOrbit, MeanElements, OrbitModel, OsculatingElements, OsculatingOrbit, PoissonSeries,
    SeriesOrbit,
};
use crate::photometry::MagnitudeAlgorithm;
use crate::planetlib::PlanetType;
use crate::rotation::{AxisCorrection, IcrfPole, RotationElements};
use crate::system::BodyHierarchy;
use crate::time::TimeFlavor;
use crate::{OrreryError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SOLAR_SYSTEM_JSON: &str = include_str!("../../data/solar_system.json");

/// Process-wide configuration, shared by the hierarchy as an immutable snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Formula set used for planetary magnitudes
    pub magnitude_algorithm: MagnitudeAlgorithm,
    /// Entries kept per body in the position cache
    pub cache_capacity: usize,
    /// Evaluate bodies on the rayon thread pool when advancing
    pub parallel: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity > PositionCache::MAX_CAPACITY {
            return Err(OrreryError::InvalidConfiguration(format!(
                "cache capacity {} exceeds {}",
                self.cache_capacity,
                PositionCache::MAX_CAPACITY
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            magnitude_algorithm: MagnitudeAlgorithm::default(),
            cache_capacity: PositionCache::DEFAULT_CAPACITY,
            parallel: true,
        }
    }
}

/// Ring radii in km
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingConfig {
    pub inner_km: f64,
    pub outer_km: f64,
}

/// One osculating element set, angles in degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementsConfig {
    /// Perihelion distance and time of perihelion (comets)
    Cometary {
        #[serde(default)]
        epoch: Option<f64>,
        q: f64,
        e: f64,
        i: f64,
        node: f64,
        arg_perihelion: f64,
        perihelion_time: f64,
        #[serde(default)]
        gm: Option<f64>,
    },
    /// Semi-major axis and mean anomaly at epoch (minor planets, moons)
    MeanAnomaly {
        epoch: f64,
        a: f64,
        e: f64,
        i: f64,
        node: f64,
        arg_perihelion: f64,
        mean_anomaly: f64,
        #[serde(default)]
        gm: Option<f64>,
    },
}

impl ElementsConfig {
    fn build(&self) -> Result<OsculatingElements> {
        match *self {
            ElementsConfig::Cometary {
                epoch,
                q,
                e,
                i,
                node,
                arg_perihelion,
                perihelion_time,
                gm,
            } => {
                let elements = OsculatingElements {
                    epoch: epoch.unwrap_or(perihelion_time),
                    q,
                    e,
                    i: i * DEG2RAD,
                    node: node * DEG2RAD,
                    arg_perihelion: arg_perihelion * DEG2RAD,
                    perihelion_time,
                    gm: gm.unwrap_or(GM_SUN_AU),
                };
                elements.validate()?;
                Ok(elements)
            }
            ElementsConfig::MeanAnomaly {
                epoch,
                a,
                e,
                i,
                node,
                arg_perihelion,
                mean_anomaly,
                gm,
            } => OsculatingElements::from_mean_anomaly(
                epoch,
                a,
                e,
                i * DEG2RAD,
                node * DEG2RAD,
                arg_perihelion * DEG2RAD,
                mean_anomaly * DEG2RAD,
                gm.unwrap_or(GM_SUN_AU),
            ),
        }
    }
}

fn default_validity_days() -> f64 {
    OsculatingOrbit::DEFAULT_VALIDITY_DAYS
}

/// Orbit model record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum OrbitConfig {
    Fixed {
        /// Position relative to the parent, AU
        #[serde(default)]
        position: [f64; 3],
    },
    MeanElements(MeanElements),
    PoissonSeries(PoissonSeries),
    Lunar,
    Osculating {
        elements: Vec<ElementsConfig>,
        #[serde(default = "default_validity_days")]
        validity_days: f64,
    },
}

impl OrbitConfig {
    pub fn build(&self) -> Result<OrbitModel> {
        let model = match self {
            OrbitConfig::Fixed { position } => {
                OrbitModel::Fixed(FixedOrbit::new(Vector3::from(*position)))
            }
            OrbitConfig::MeanElements(el) => {
                OrbitModel::Series(SeriesOrbit::MeanElements(el.clone()))
            }
            OrbitConfig::PoissonSeries(series) => {
                OrbitModel::Series(SeriesOrbit::PoissonSeries(series.clone()))
            }
            OrbitConfig::Lunar => OrbitModel::Series(SeriesOrbit::Lunar),
            OrbitConfig::Osculating {
                elements,
                validity_days,
            } => {
                let sets = elements
                    .iter()
                    .map(ElementsConfig::build)
                    .collect::<Result<Vec<_>>>()?;
                OrbitModel::Osculating(OsculatingOrbit::new(sets, *validity_days)?)
            }
        };
        model.validate()?;
        Ok(model)
    }

    /// GM of the central body implied by the elements, if any
    fn central_gm(&self) -> Option<f64> {
        match self {
            OrbitConfig::Osculating { elements, .. } => elements.first().and_then(|el| match el {
                ElementsConfig::Cometary { gm, .. } | ElementsConfig::MeanAnomaly { gm, .. } => *gm,
            }),
            _ => None,
        }
    }
}

/// Modern pole record, degrees, degrees per century and degrees per day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoleConfig {
    pub ra0: f64,
    #[serde(default)]
    pub ra1: f64,
    pub de0: f64,
    #[serde(default)]
    pub de1: f64,
    pub w0: f64,
    pub w1: f64,
}

fn default_epoch() -> f64 {
    J2000
}

/// Rotation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Sidereal rotation period, days (legacy model)
    #[serde(default)]
    pub period: Option<f64>,
    /// Rotation angle at epoch, degrees
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_epoch")]
    pub epoch: f64,
    /// Degrees
    #[serde(default)]
    pub obliquity: f64,
    /// Degrees
    #[serde(default)]
    pub ascending_node: f64,
    /// Orbital sidereal period, days
    #[serde(default)]
    pub sidereal_period: f64,
    #[serde(default)]
    pub pole: Option<PoleConfig>,
    #[serde(default)]
    pub correction: AxisCorrection,
    #[serde(default)]
    pub spin_time: TimeFlavor,
}

impl RotationConfig {
    pub fn build(&self) -> Result<RotationElements> {
        let elements = match (&self.pole, self.period) {
            (Some(pole), _) => RotationElements::icrf(
                IcrfPole {
                    ra0: pole.ra0 * DEG2RAD,
                    ra1: pole.ra1 * DEG2RAD,
                    de0: pole.de0 * DEG2RAD,
                    de1: pole.de1 * DEG2RAD,
                    w0: pole.w0,
                    w1: pole.w1,
                },
                self.epoch,
                self.sidereal_period,
            )?,
            (None, Some(period)) => RotationElements::legacy(
                period,
                self.offset,
                self.epoch,
                self.obliquity * DEG2RAD,
                self.ascending_node * DEG2RAD,
                self.sidereal_period,
            )?,
            (None, None) => {
                return Err(OrreryError::InvalidConfiguration(
                    "rotation needs either a period or a pole".into(),
                ))
            }
        };
        Ok(elements
            .with_correction(self.correction)
            .with_spin_time(self.spin_time))
    }
}

/// Static description of one body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: PlanetType,
    /// Equatorial radius, km
    #[serde(default)]
    pub radius_km: f64,
    #[serde(default)]
    pub oblateness: f64,
    #[serde(default)]
    pub albedo: f64,
    #[serde(default)]
    pub absolute_magnitude: Option<f64>,
    /// G for minor planets, k for comets
    #[serde(default)]
    pub slope: Option<f64>,
    #[serde(default)]
    pub rings: Option<RingConfig>,
    /// GM of the central body, AU³/day²
    #[serde(default)]
    pub gm: Option<f64>,
    #[serde(default)]
    pub model: Option<String>,
    pub orbit: OrbitConfig,
    #[serde(default)]
    pub rotation: Option<RotationConfig>,
    /// Sidereal orbital period in days when no rotation record carries it
    #[serde(default)]
    pub sidereal_period: Option<f64>,
}

impl BodyConfig {
    /// Build the body, converting to internal units
    pub fn build(&self) -> Result<CelestialBody> {
        if self.name.trim().is_empty() {
            return Err(OrreryError::InvalidConfiguration("body without a name".into()));
        }
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(OrreryError::InvalidConfiguration(format!(
                "{}: radius must be non-negative",
                self.name
            )));
        }
        if !(0.0..1.0).contains(&self.oblateness) {
            return Err(OrreryError::InvalidConfiguration(format!(
                "{}: oblateness must lie in [0, 1)",
                self.name
            )));
        }
        let orbit = self.orbit.build()?;
        let rotation = match &self.rotation {
            Some(rotation) => rotation.build()?,
            None => {
                let period = self.sidereal_period.unwrap_or(0.0);
                RotationElements::legacy(1.0, 0.0, J2000, 0.0, 0.0, period)?
            }
        };
        let gm = self.gm.or_else(|| self.orbit.central_gm()).unwrap_or(GM_SUN_AU);
        if !(gm > 0.0) {
            return Err(OrreryError::InvalidConfiguration(format!(
                "{}: gm must be positive",
                self.name
            )));
        }

        let mut body = CelestialBody::new(&self.name, self.kind, orbit, rotation)
            .with_radius(self.radius_km / AU_KM, 1.0 - self.oblateness)
            .with_albedo(self.albedo)
            .with_magnitude_parameters(self.absolute_magnitude, self.slope)
            .with_gm(gm);
        if let Some(rings) = self.rings {
            if !(rings.inner_km >= 0.0 && rings.outer_km > rings.inner_km) {
                return Err(OrreryError::InvalidConfiguration(format!(
                    "{}: ring radii must satisfy 0 <= inner < outer",
                    self.name
                )));
            }
            body = body.with_rings(Ring {
                inner_radius: rings.inner_km / AU_KM,
                outer_radius: rings.outer_km / AU_KM,
            });
        }
        if let Some(model) = &self.model {
            body = body.with_model(model);
        }
        Ok(body)
    }
}

/// A whole system: settings plus body records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub settings: Settings,
    pub bodies: Vec<BodyConfig>,
}

impl SystemConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.settings.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The built-in solar system
    pub fn solar_system() -> Result<Self> {
        Self::from_json_str(SOLAR_SYSTEM_JSON)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn find(&self, name: &str) -> Option<&BodyConfig> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Build a hierarchy; invalid bodies are rejected and reported
    pub fn build(&self) -> BodyHierarchy {
        BodyHierarchy::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.magnitude_algorithm, MagnitudeAlgorithm::ExplanatorySupplement2013);
    }

    #[test]
    fn test_unknown_algorithm_in_settings() {
        let err = serde_json::from_str::<Settings>(r#"{"magnitude_algorithm": "Nope"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_builtin_solar_system_parses() {
        let config = SystemConfig::solar_system().unwrap();
        assert!(config.find("Sun").is_some());
        assert!(config.find("Earth").is_some());
        assert!(config.find("Moon").is_some());
        for body in &config.bodies {
            body.build().unwrap_or_else(|e| panic!("{} failed: {e}", body.name));
        }
    }

    #[test]
    fn test_units_converted() {
        let json = r#"{
            "name": "Rock",
            "type": "asteroid",
            "radius_km": 149597.8707,
            "oblateness": 0.1,
            "orbit": {"model": "fixed", "position": [1.0, 0.0, 0.0]},
            "rotation": {"period": 0.5, "obliquity": 90.0}
        }"#;
        let body = serde_json::from_str::<BodyConfig>(json).unwrap().build().unwrap();
        assert_relative_eq!(body.radius(), 0.001, epsilon = 1e-12);
        assert_relative_eq!(body.polar_radius(), 0.0009, epsilon = 1e-12);
        assert_eq!(body.kind(), PlanetType::Asteroid);
    }

    #[test]
    fn test_zero_period_rejected() {
        let json = r#"{
            "name": "Spinner",
            "orbit": {"model": "fixed"},
            "rotation": {"period": 0.0}
        }"#;
        let config: BodyConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.build(), Err(OrreryError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_osculating_elements_both_forms() {
        let json = r#"{"model": "osculating", "elements": [
            {"q": 0.586, "e": 0.967, "i": 162.3, "node": 58.4, "arg_perihelion": 111.3,
             "perihelion_time": 2446467.4},
            {"epoch": 2446500.0, "a": 17.8, "e": 0.967, "i": 162.3, "node": 58.4,
             "arg_perihelion": 111.3, "mean_anomaly": 0.5}
        ]}"#;
        let orbit: OrbitConfig = serde_json::from_str(json).unwrap();
        match orbit.build().unwrap() {
            OrbitModel::Osculating(o) => {
                assert_eq!(o.element_sets().len(), 2);
                assert_relative_eq!(o.element_sets()[0].epoch, 2446467.4);
            }
            other => panic!("unexpected model {other:?}"),
        }
    }
}
