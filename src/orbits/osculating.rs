//! Osculating conic elements
//!
//! Comets, minor planets and small moons are described by instantaneous
//! two-body elements. An orbit may carry several element sets; each
//! evaluation uses the set whose epoch is closest to the requested time.

use super::kepler::{
    orbital_to_reference, perifocal_state, time_since_perihelion, true_anomaly,
    PARABOLIC_TOLERANCE,
};
use super::StateVector;
use crate::{OrreryError, Result};
use log::warn;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Cometary elements of a conic around a central body.
///
/// Distances in AU, angles in radians, times as JDE, `gm` in AU³/day².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OsculatingElements {
    /// Osculation epoch
    pub epoch: f64,
    /// Perihelion distance
    pub q: f64,
    /// Eccentricity
    pub e: f64,
    /// Inclination
    pub i: f64,
    /// Longitude of the ascending node
    pub node: f64,
    /// Argument of perihelion
    pub arg_perihelion: f64,
    /// Time of perihelion passage
    pub perihelion_time: f64,
    /// Gravitational parameter of the central body
    pub gm: f64,
}

impl OsculatingElements {
    /// Elements from a semi-major axis and mean anomaly at epoch (elliptic orbits)
    #[allow(clippy::too_many_arguments)]
    pub fn from_mean_anomaly(
        epoch: f64,
        a: f64,
        e: f64,
        i: f64,
        node: f64,
        arg_perihelion: f64,
        mean_anomaly: f64,
        gm: f64,
    ) -> Result<Self> {
        if !(a > 0.0) || !(0.0..1.0).contains(&e) {
            return Err(OrreryError::InvalidConfiguration(format!(
                "mean-anomaly elements need a > 0 and 0 <= e < 1 (a = {a}, e = {e})"
            )));
        }
        let n = (gm / (a * a * a)).sqrt();
        let elements = Self {
            epoch,
            q: a * (1.0 - e),
            e,
            i,
            node,
            arg_perihelion,
            perihelion_time: epoch - mean_anomaly / n,
            gm,
        };
        elements.validate()?;
        Ok(elements)
    }

    /// Re-derive elements from a state vector relative to the central body
    pub fn from_state(epoch: f64, r: &Vector3<f64>, v: &Vector3<f64>, gm: f64) -> Result<Self> {
        let h = r.cross(v);
        let h_norm = h.norm();
        if !(gm > 0.0) || h_norm == 0.0 || !h_norm.is_finite() {
            return Err(OrreryError::InvalidConfiguration(
                "cannot derive elements from a degenerate state".into(),
            ));
        }
        let r_norm = r.norm();
        let e_vec = ((v.norm_squared() - gm / r_norm) * r - r.dot(v) * v) / gm;
        let e = e_vec.norm();
        let p = h_norm * h_norm / gm;
        let q = p / (1.0 + e);
        let h_hat = h / h_norm;
        let i = h_hat.z.clamp(-1.0, 1.0).acos();

        let node_vec = Vector3::z().cross(&h);
        let (node, reference) = if node_vec.norm() > 1e-12 * h_norm {
            (h.x.atan2(-h.y), node_vec.normalize())
        } else {
            // Equatorial orbit: measure from the x axis
            (0.0, Vector3::x())
        };

        let signed_angle =
            |from: &Vector3<f64>, to: &Vector3<f64>| from.cross(to).dot(&h_hat).atan2(from.dot(to));

        let (arg_perihelion, nu) = if e > 1e-11 {
            (signed_angle(&reference, &e_vec), signed_angle(&e_vec, r))
        } else {
            (0.0, signed_angle(&reference, r))
        };

        let elements = Self {
            epoch,
            q,
            e,
            i,
            node: node.rem_euclid(TAU),
            arg_perihelion: arg_perihelion.rem_euclid(TAU),
            perihelion_time: epoch - time_since_perihelion(q, e, gm, nu),
            gm,
        };
        elements.validate()?;
        Ok(elements)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            self.epoch,
            self.q,
            self.e,
            self.i,
            self.node,
            self.arg_perihelion,
            self.perihelion_time,
            self.gm,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(OrreryError::InvalidConfiguration(
                "osculating elements must be finite".into(),
            ));
        }
        if self.q <= 0.0 || self.e < 0.0 || self.gm <= 0.0 {
            return Err(OrreryError::InvalidConfiguration(format!(
                "osculating elements need q > 0, e >= 0 and gm > 0 (q = {}, e = {}, gm = {})",
                self.q, self.e, self.gm
            )));
        }
        Ok(())
    }

    /// State relative to the central body at `jde`
    pub fn state_at(&self, jde: f64) -> StateVector {
        let nu = true_anomaly(self.q, self.e, self.gm, jde - self.perihelion_time);
        let (r, v) = perifocal_state(self.q, self.e, self.gm, nu);
        let rotation = orbital_to_reference(self.node, self.i, self.arg_perihelion);
        StateVector {
            position: rotation * r,
            velocity: rotation * v,
        }
    }

    /// Semi-major axis for closed orbits
    pub fn semi_major_axis(&self) -> Option<f64> {
        (self.e < 1.0 - PARABOLIC_TOLERANCE).then(|| self.q / (1.0 - self.e))
    }

    /// Orbital period in days for closed orbits
    pub fn period(&self) -> Option<f64> {
        self.semi_major_axis()
            .map(|a| TAU * (a * a * a / self.gm).sqrt())
    }
}

/// A body moving on osculating conics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsculatingOrbit {
    elements: Vec<OsculatingElements>,
    /// Days from an element epoch after which the elements are considered stale
    validity_days: f64,
}

impl OsculatingOrbit {
    pub const DEFAULT_VALIDITY_DAYS: f64 = 365.25 * 100.0;

    pub fn new(mut elements: Vec<OsculatingElements>, validity_days: f64) -> Result<Self> {
        if elements.is_empty() {
            return Err(OrreryError::InvalidConfiguration(
                "osculating orbit needs at least one element set".into(),
            ));
        }
        if !(validity_days > 0.0) {
            return Err(OrreryError::InvalidConfiguration(format!(
                "validity window must be positive, got {validity_days}"
            )));
        }
        for el in &elements {
            el.validate()?;
        }
        elements.sort_by(|a, b| a.epoch.total_cmp(&b.epoch));
        Ok(Self {
            elements,
            validity_days,
        })
    }

    pub fn single(elements: OsculatingElements) -> Result<Self> {
        Self::new(vec![elements], Self::DEFAULT_VALIDITY_DAYS)
    }

    pub fn element_sets(&self) -> &[OsculatingElements] {
        &self.elements
    }

    pub fn validity_days(&self) -> f64 {
        self.validity_days
    }

    /// The element set to use at `jde`: the nearer of the two epochs bracketing it
    pub fn elements_for(&self, jde: f64) -> &OsculatingElements {
        let idx = self.elements.partition_point(|el| el.epoch <= jde);
        match idx {
            0 => &self.elements[0],
            i if i >= self.elements.len() => &self.elements[self.elements.len() - 1],
            i => {
                let (before, after) = (&self.elements[i - 1], &self.elements[i]);
                if jde - before.epoch <= after.epoch - jde {
                    before
                } else {
                    after
                }
            }
        }
    }

    pub fn evaluate(&self, jde: f64) -> StateVector {
        let el = self.elements_for(jde);
        if self.needs_refresh(el.epoch, jde) {
            warn!(
                "osculating elements of epoch {} used {:.1} days away at JDE {}",
                el.epoch,
                (jde - el.epoch).abs(),
                jde
            );
        }
        el.state_at(jde)
    }

    /// Evaluate at `jde` with the elements valid at `jde0`
    pub fn evaluate_from_epoch(&self, jde0: f64, jde: f64) -> StateVector {
        self.elements_for(jde0).state_at(jde)
    }

    /// Whether elements taken at `jde0` are too old to use at `jde`
    pub fn needs_refresh(&self, jde0: f64, jde: f64) -> bool {
        (jde - jde0).abs() > self.validity_days
    }
}
