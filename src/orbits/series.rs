//! Analytic series theories evaluated directly as functions of time

use super::kepler::{orbital_to_reference, solve_elliptic};
use super::lunar;
use crate::constants::{
    DEG2RAD, FINITE_DIFFERENCE_STEP_DAYS, J2000, JULIAN_CENTURY, JULIAN_MILLENNIUM,
};
use crate::{OrreryError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Mean Keplerian elements varying linearly with time.
///
/// Elements follow the JPL approximate-positions tables: semi-major axis in
/// AU, eccentricity, inclination, mean longitude, longitude of perihelion and
/// longitude of the ascending node in degrees, each with a rate per Julian
/// century. Results are referred to the J2000 ecliptic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanElements {
    pub a: [f64; 2],
    pub e: [f64; 2],
    pub i: [f64; 2],
    pub mean_longitude: [f64; 2],
    pub perihelion_longitude: [f64; 2],
    pub node: [f64; 2],
}

impl MeanElements {
    /// JDE of 1800-01-01 and 2050-01-01, the fitted interval
    pub const VALID_RANGE: (f64, f64) = (2_378_496.5, 2_469_807.5);

    pub fn validate(&self) -> Result<()> {
        let all = [
            self.a,
            self.e,
            self.i,
            self.mean_longitude,
            self.perihelion_longitude,
            self.node,
        ];
        if all.iter().flatten().any(|v| !v.is_finite()) {
            return Err(OrreryError::InvalidConfiguration(
                "mean elements must be finite".into(),
            ));
        }
        if self.a[0] <= 0.0 || !(0.0..1.0).contains(&self.e[0]) {
            return Err(OrreryError::InvalidConfiguration(format!(
                "mean elements need a > 0 and 0 <= e < 1 (a = {}, e = {})",
                self.a[0], self.e[0]
            )));
        }
        Ok(())
    }

    /// Osculating-like elements at `jde`: (a, e, i, Ω, ω, M), angles in radians
    pub fn elements_at(&self, jde: f64) -> (f64, f64, f64, f64, f64, f64) {
        let t = (jde - J2000) / JULIAN_CENTURY;
        let at = |el: [f64; 2]| el[0] + el[1] * t;
        let a = at(self.a);
        let e = at(self.e).clamp(0.0, 0.999_999);
        let i = at(self.i) * DEG2RAD;
        let l = at(self.mean_longitude) * DEG2RAD;
        let varpi = at(self.perihelion_longitude) * DEG2RAD;
        let node = at(self.node) * DEG2RAD;
        (a, e, i, node, varpi - node, l - varpi)
    }

    pub fn position(&self, jde: f64) -> Vector3<f64> {
        let (a, e, i, node, omega, m) = self.elements_at(jde);
        let ecc = solve_elliptic(m, e);
        let plane = Vector3::new(
            a * (ecc.cos() - e),
            a * (1.0 - e * e).sqrt() * ecc.sin(),
            0.0,
        );
        orbital_to_reference(node, i, omega) * plane
    }
}

/// One term `A·cos(B + C·τ)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoissonTerm {
    pub amplitude: f64,
    pub phase: f64,
    pub frequency: f64,
}

/// Rectangular Poisson series in the style of VSOP87.
///
/// Each coordinate is `Σ_α τ^α Σ_k A_k cos(B_k + C_k τ)` with τ in Julian
/// millennia from J2000; `x[α]` holds the terms multiplied by `τ^α`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoissonSeries {
    pub x: Vec<Vec<PoissonTerm>>,
    pub y: Vec<Vec<PoissonTerm>>,
    pub z: Vec<Vec<PoissonTerm>>,
    /// Optional validity interval as JDE bounds
    #[serde(default)]
    pub valid_range: Option<(f64, f64)>,
}

fn sum_coordinate(powers: &[Vec<PoissonTerm>], tau: f64) -> f64 {
    // Horner over the powers of τ
    powers.iter().rev().fold(0.0, |acc, terms| {
        let inner: f64 = terms
            .iter()
            .map(|t| t.amplitude * (t.phase + t.frequency * tau).cos())
            .sum();
        acc * tau + inner
    })
}

impl PoissonSeries {
    pub fn validate(&self) -> Result<()> {
        if self.x.is_empty() && self.y.is_empty() && self.z.is_empty() {
            return Err(OrreryError::InvalidConfiguration(
                "Poisson series has no terms".into(),
            ));
        }
        let finite = [&self.x, &self.y, &self.z].iter().all(|c| {
            c.iter().flatten().all(|t| {
                t.amplitude.is_finite() && t.phase.is_finite() && t.frequency.is_finite()
            })
        });
        if !finite {
            return Err(OrreryError::InvalidConfiguration(
                "Poisson series terms must be finite".into(),
            ));
        }
        Ok(())
    }

    pub fn position(&self, jde: f64) -> Vector3<f64> {
        let tau = (jde - J2000) / JULIAN_MILLENNIUM;
        Vector3::new(
            sum_coordinate(&self.x, tau),
            sum_coordinate(&self.y, tau),
            sum_coordinate(&self.z, tau),
        )
    }
}

/// The analytic theories available for series bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "theory", rename_all = "snake_case")]
pub enum SeriesOrbit {
    MeanElements(MeanElements),
    PoissonSeries(PoissonSeries),
    Lunar,
}

impl SeriesOrbit {
    pub fn validate(&self) -> Result<()> {
        match self {
            SeriesOrbit::MeanElements(el) => el.validate(),
            SeriesOrbit::PoissonSeries(series) => series.validate(),
            SeriesOrbit::Lunar => Ok(()),
        }
    }

    /// Position relative to the parent in the J2000 ecliptic frame, AU
    pub fn position(&self, jde: f64) -> Vector3<f64> {
        match self {
            SeriesOrbit::MeanElements(el) => el.position(jde),
            SeriesOrbit::PoissonSeries(series) => series.position(jde),
            SeriesOrbit::Lunar => lunar::geocentric_position(jde),
        }
    }

    /// Velocity by centred finite difference, AU/day
    pub fn velocity(&self, jde: f64) -> Vector3<f64> {
        let h = FINITE_DIFFERENCE_STEP_DAYS;
        (self.position(jde + h) - self.position(jde - h)) / (2.0 * h)
    }

    /// Whether `jde` lies inside the interval the theory was fitted to
    pub fn is_valid_at(&self, jde: f64) -> bool {
        let range = match self {
            SeriesOrbit::MeanElements(_) => Some(MeanElements::VALID_RANGE),
            SeriesOrbit::PoissonSeries(series) => series.valid_range,
            SeriesOrbit::Lunar => None,
        };
        range.map_or(true, |(lo, hi)| (lo..=hi).contains(&jde))
    }

    /// Semi-major axis where the theory defines one
    pub fn semi_major_axis(&self, jde: f64) -> Option<f64> {
        match self {
            SeriesOrbit::MeanElements(el) => Some(el.elements_at(jde).0),
            _ => None,
        }
    }
}
