//! Position and velocity of a body relative to its parent
//!
//! Every model is a pure function of ephemeris time returning a state in the
//! parent's J2000 ecliptic frame, in AU and AU/day.

pub mod fixed;
pub mod kepler;
pub mod lunar;
pub mod osculating;
pub mod series;

pub use fixed::FixedOrbit;
pub use osculating::{OsculatingElements, OsculatingOrbit};
pub use series::{MeanElements, PoissonSeries, PoissonTerm, SeriesOrbit};

use crate::constants::TAU;
use crate::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Position (AU) and velocity (AU/day)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

/// How a body's parentocentric state is obtained
#[derive(Debug, Clone, PartialEq)]
pub enum OrbitModel {
    Series(SeriesOrbit),
    Osculating(OsculatingOrbit),
    Fixed(FixedOrbit),
}

impl OrbitModel {
    pub fn validate(&self) -> Result<()> {
        match self {
            OrbitModel::Series(series) => series.validate(),
            OrbitModel::Osculating(orbit) => {
                for el in orbit.element_sets() {
                    el.validate()?;
                }
                Ok(())
            }
            OrbitModel::Fixed(_) => Ok(()),
        }
    }

    /// State relative to the parent at `jde`
    pub fn evaluate(&self, jde: f64) -> StateVector {
        match self {
            OrbitModel::Series(series) => StateVector {
                position: series.position(jde),
                velocity: series.velocity(jde),
            },
            OrbitModel::Osculating(orbit) => orbit.evaluate(jde),
            OrbitModel::Fixed(fixed) => fixed.evaluate(),
        }
    }

    /// Position only; skips the finite difference for series bodies
    pub fn position(&self, jde: f64) -> Vector3<f64> {
        match self {
            OrbitModel::Series(series) => series.position(jde),
            OrbitModel::Osculating(orbit) => orbit.evaluate(jde).position,
            OrbitModel::Fixed(fixed) => fixed.position,
        }
    }

    /// Whether the model is inside its documented accuracy window at `jde`
    pub fn is_valid_at(&self, jde: f64) -> bool {
        match self {
            OrbitModel::Series(series) => series.is_valid_at(jde),
            OrbitModel::Osculating(orbit) => {
                !orbit.needs_refresh(orbit.elements_for(jde).epoch, jde)
            }
            OrbitModel::Fixed(_) => true,
        }
    }

    pub fn semi_major_axis(&self, jde: f64) -> Option<f64> {
        match self {
            OrbitModel::Series(series) => series.semi_major_axis(jde),
            OrbitModel::Osculating(orbit) => orbit.elements_for(jde).semi_major_axis(),
            OrbitModel::Fixed(_) => None,
        }
    }

    /// Orbital period in days around the parent, given its gravitational parameter
    pub fn orbital_period(&self, jde: f64, gm: f64) -> Option<f64> {
        match self {
            OrbitModel::Osculating(orbit) => orbit.elements_for(jde).period(),
            _ => self
                .semi_major_axis(jde)
                .filter(|_| gm > 0.0)
                .map(|a| TAU * (a * a * a / gm).sqrt()),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, OrbitModel::Fixed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GM_SUN_AU, J2000};
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_orbit_is_constant() {
        let model = OrbitModel::Fixed(FixedOrbit::new(Vector3::new(1.0, 2.0, 3.0)));
        for jde in [J2000 - 1e5, J2000, J2000 + 42.0] {
            let s = model.evaluate(jde);
            assert_eq!(s.position, Vector3::new(1.0, 2.0, 3.0));
            assert_eq!(s.velocity, Vector3::zeros());
        }
        assert!(model.is_fixed());
        assert!(model.is_valid_at(0.0));
    }

    #[test]
    fn test_repeat_evaluation_is_bit_identical() {
        let model = OrbitModel::Series(SeriesOrbit::Lunar);
        let a = model.evaluate(J2000 + 123.456);
        let b = model.evaluate(J2000 + 123.456);
        assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
        assert_eq!(a.velocity.z.to_bits(), b.velocity.z.to_bits());
    }

    #[test]
    fn test_orbital_period_from_mean_elements() {
        let model = OrbitModel::Series(SeriesOrbit::MeanElements(MeanElements {
            a: [5.20288700, -0.00011607],
            e: [0.04838624, -0.00013253],
            i: [1.30439695, -0.00183714],
            mean_longitude: [34.39644051, 3034.74612775],
            perihelion_longitude: [14.72847983, 0.21252668],
            node: [100.47390909, 0.20469106],
        }));
        let years = model.orbital_period(J2000, GM_SUN_AU).unwrap() / 365.25;
        assert_relative_eq!(years, 11.86, epsilon = 0.02);
        assert!(model.orbital_period(J2000, 0.0).is_none());
    }
}
