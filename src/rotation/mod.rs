//! Body rotation elements and axis orientation
//!
//! Two models coexist. The legacy model spins a body with a fixed period
//! around an axis given by obliquity and ascending node on the J2000
//! ecliptic. The modern model follows the IAU/WGCCRE recommendations: a pole
//! given in ICRF right ascension and declination with linear drift, and a
//! prime meridian angle `W = W0 + W1·d`, both optionally refined by periodic
//! terms from a [`CorrectionTable`].

pub mod corrections;

pub use corrections::{AxisCorrection, CorrectionFamily, CorrectionTable};

use crate::constants::{J2000, JULIAN_CENTURY};
use crate::framelib::{self, equator_of_date_to_ecliptic, mean_obliquity, ICRF_TO_ECLIPTIC};
use crate::time::{Time, TimeError, TimeFlavor};
use crate::{OrreryError, Result};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Pole and prime meridian of the modern rotation model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcrfPole {
    /// Pole right ascension at epoch, radians
    pub ra0: f64,
    /// Pole right ascension drift, radians per Julian century
    pub ra1: f64,
    /// Pole declination at epoch, radians
    pub de0: f64,
    /// Pole declination drift, radians per Julian century
    pub de1: f64,
    /// Prime meridian angle at epoch, degrees
    pub w0: f64,
    /// Prime meridian rate, degrees per day
    pub w1: f64,
}

/// Rotation elements of a body
#[derive(Debug, Clone, PartialEq)]
pub struct RotationElements {
    period: f64,
    offset: f64,
    epoch: f64,
    obliquity: f64,
    ascending_node: f64,
    sidereal_period: f64,
    pole: Option<IcrfPole>,
    correction: AxisCorrection,
    spin_time: TimeFlavor,
}

impl Default for RotationElements {
    fn default() -> Self {
        Self {
            period: 1.0,
            offset: 0.0,
            epoch: J2000,
            obliquity: 0.0,
            ascending_node: 0.0,
            sidereal_period: 0.0,
            pole: None,
            correction: AxisCorrection::None,
            spin_time: TimeFlavor::Ephemeris,
        }
    }
}

/// Reduce degrees to [0, 360)
pub(crate) fn normalize_degrees(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(360.0);
    // rem_euclid can round a tiny negative input up to exactly 360
    if reduced >= 360.0 {
        0.0
    } else {
        reduced
    }
}

impl RotationElements {
    /// Legacy model: fixed spin period around a fixed axis.
    ///
    /// `period` is the sidereal rotation period in days, `offset` the
    /// rotation angle at `epoch` in degrees, `obliquity` and
    /// `ascending_node` are radians on the J2000 ecliptic.
    pub fn legacy(
        period: f64,
        offset: f64,
        epoch: f64,
        obliquity: f64,
        ascending_node: f64,
        sidereal_period: f64,
    ) -> Result<Self> {
        if !period.is_finite() || period <= 0.0 {
            return Err(OrreryError::InvalidConfiguration(format!(
                "rotation period must be positive, got {period}"
            )));
        }
        if ![offset, epoch, obliquity, ascending_node, sidereal_period]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(OrreryError::InvalidConfiguration(
                "rotation elements must be finite".into(),
            ));
        }
        Ok(Self {
            period,
            offset,
            epoch,
            obliquity,
            ascending_node,
            sidereal_period,
            ..Self::default()
        })
    }

    /// Modern model with an ICRF pole; obliquity and node are derived from it
    pub fn icrf(pole: IcrfPole, epoch: f64, sidereal_period: f64) -> Result<Self> {
        let IcrfPole {
            ra0,
            ra1,
            de0,
            de1,
            w0,
            w1,
        } = pole;
        if !w1.is_finite() || w1 == 0.0 {
            return Err(OrreryError::InvalidConfiguration(format!(
                "prime meridian rate must be non-zero, got {w1}"
            )));
        }
        if ![ra0, ra1, de0, de1, w0, epoch, sidereal_period]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(OrreryError::InvalidConfiguration(
                "pole elements must be finite".into(),
            ));
        }
        let mut elements = Self {
            period: 360.0 / w1.abs(),
            offset: w0,
            epoch,
            sidereal_period,
            pole: Some(pole),
            ..Self::default()
        };
        elements.refresh_axis(epoch, &CorrectionTable::default());
        Ok(elements)
    }

    /// Attach periodic correction terms
    pub fn with_correction(mut self, correction: AxisCorrection) -> Self {
        self.correction = correction;
        if self.pole.is_some() {
            let epoch = self.epoch;
            self.refresh_axis(epoch, &CorrectionTable::at(epoch));
        }
        self
    }

    /// Select which time flavour drives the spin angle
    pub fn with_spin_time(mut self, spin_time: TimeFlavor) -> Self {
        self.spin_time = spin_time;
        self
    }

    pub fn is_icrf(&self) -> bool {
        self.pole.is_some()
    }

    pub fn pole(&self) -> Option<&IcrfPole> {
        self.pole.as_ref()
    }

    pub fn correction(&self) -> AxisCorrection {
        self.correction
    }

    pub fn spin_time(&self) -> TimeFlavor {
        self.spin_time
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// Rotation period in days, negative for retrograde modern rotators
    pub fn sidereal_day(&self) -> f64 {
        match &self.pole {
            Some(pole) => 360.0 / pole.w1,
            None => self.period,
        }
    }

    /// Orbital sidereal period in days (0 when unknown)
    pub fn sidereal_period(&self) -> f64 {
        self.sidereal_period
    }

    /// Pole right ascension and declination in the ICRF, radians
    pub fn pole_at(&self, jde: f64, table: &CorrectionTable) -> Option<(f64, f64)> {
        self.pole.as_ref().map(|pole| {
            let t = (jde - self.epoch) / JULIAN_CENTURY;
            let (dra, dde) = self.correction.pole_offset(table);
            (
                pole.ra0 + pole.ra1 * t + dra.to_radians(),
                pole.de0 + pole.de1 * t + dde.to_radians(),
            )
        })
    }

    fn icrf_pole_vector(&self, jde: f64, table: &CorrectionTable) -> Option<Vector3<f64>> {
        self.pole_at(jde, table).map(|(ra, de)| {
            let icrf = Vector3::new(de.cos() * ra.cos(), de.cos() * ra.sin(), de.sin());
            framelib::icrf_to_ecliptic(&icrf)
        })
    }

    /// Unit vector of the north pole in the J2000 ecliptic frame
    pub fn pole_vector(&self, jde: f64, table: &CorrectionTable) -> Vector3<f64> {
        self.icrf_pole_vector(jde, table)
            .unwrap_or_else(|| self.axis_rotation(jde, table) * Vector3::z())
    }

    /// Re-derive obliquity and node of a modern rotator for `jde`
    pub fn refresh_axis(&mut self, jde: f64, table: &CorrectionTable) {
        if let Some(p) = self.icrf_pole_vector(jde, table) {
            let (obliquity, node) = obliquity_and_node(&p);
            self.obliquity = obliquity;
            self.ascending_node = node;
        }
    }

    /// Axis obliquity against the J2000 ecliptic, radians.
    ///
    /// Earth's is the mean obliquity against the ecliptic of date.
    pub fn rot_obliquity(&self, jde: f64, table: &CorrectionTable) -> f64 {
        if self.correction == AxisCorrection::Earth {
            return mean_obliquity(jde);
        }
        match self.icrf_pole_vector(jde, table) {
            Some(p) => obliquity_and_node(&p).0,
            None => self.obliquity,
        }
    }

    /// Longitude of the ascending node of the body equator, radians.
    ///
    /// Earth's node is the equinox of date, so zero.
    pub fn rot_ascending_node(&self, jde: f64, table: &CorrectionTable) -> f64 {
        if self.correction == AxisCorrection::Earth {
            return 0.0;
        }
        match self.icrf_pole_vector(jde, table) {
            Some(p) => obliquity_and_node(&p).1,
            None => self.ascending_node,
        }
    }

    /// Rotation taking the body's equatorial frame into the J2000 ecliptic
    pub fn axis_rotation(&self, jde: f64, table: &CorrectionTable) -> Rotation3<f64> {
        if self.correction == AxisCorrection::Earth {
            // Equator and equinox of date, precessed into the J2000 ecliptic
            return equator_of_date_to_ecliptic(jde);
        }
        let node = self.rot_ascending_node(jde, table);
        let obliquity = self.rot_obliquity(jde, table);
        Rotation3::from_axis_angle(&Vector3::z_axis(), node)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), obliquity)
    }

    /// Sidereal rotation angle W in degrees, in [0, 360)
    pub fn sidereal_rotation_angle(&self, t: &Time, table: &CorrectionTable) -> Result<f64> {
        let d = t.get(self.spin_time) - self.epoch;
        if !d.is_finite() {
            return Err(TimeError::OutOfRange(format!(
                "{:?} Julian date {} is not finite",
                self.spin_time,
                t.get(self.spin_time)
            ))
            .into());
        }
        let angle = match &self.pole {
            Some(pole) => {
                if !pole.w1.is_finite() || pole.w1 == 0.0 {
                    return Err(OrreryError::InvalidConfiguration(
                        "prime meridian rate is zero".into(),
                    ));
                }
                pole.w0 + pole.w1 * d + self.correction.meridian_offset(table, d)
            }
            None => {
                if !self.period.is_finite() || self.period <= 0.0 {
                    return Err(OrreryError::InvalidConfiguration(format!(
                        "rotation period must be positive, got {}",
                        self.period
                    )));
                }
                self.offset + 360.0 * d / self.period + self.correction.meridian_offset(table, d)
            }
        };
        Ok(normalize_degrees(angle))
    }

    /// Arc from the ecliptic node of the body equator to its ICRF node, degrees.
    ///
    /// W is counted from the ICRF node; the spin is applied in the ecliptic
    /// frame, so the two differ by this offset. Zero for legacy rotators.
    pub fn prime_meridian_offset(&self, jde: f64, table: &CorrectionTable) -> f64 {
        let Some(p) = self.icrf_pole_vector(jde, table) else {
            return 0.0;
        };
        let icrf_z = *ICRF_TO_ECLIPTIC * Vector3::z();
        let ecliptic_node = Vector3::z().cross(&p);
        let icrf_node = icrf_z.cross(&p);
        if ecliptic_node.norm() == 0.0 || icrf_node.norm() == 0.0 {
            return 0.0;
        }
        let sin = ecliptic_node.cross(&icrf_node).dot(&p);
        let cos = ecliptic_node.dot(&icrf_node);
        sin.atan2(cos).to_degrees()
    }

    /// Spin angle to apply about the body axis in the ecliptic frame, degrees
    pub fn spin_angle(&self, t: &Time, table: &CorrectionTable) -> Result<f64> {
        let w = self.sidereal_rotation_angle(t, table)?;
        Ok(normalize_degrees(w + self.prime_meridian_offset(t.jde(), table)))
    }

    /// Full body-fixed to J2000 ecliptic rotation at `t`
    pub fn body_rotation(&self, t: &Time, table: &CorrectionTable) -> Result<Rotation3<f64>> {
        let spin = self.spin_angle(t, table)?;
        Ok(self.axis_rotation(t.jde(), table)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), spin.to_radians()))
    }
}

/// Obliquity and ascending node of an equator whose pole is `p` (ecliptic frame)
fn obliquity_and_node(p: &Vector3<f64>) -> (f64, f64) {
    let lambda = p.y.atan2(p.x);
    let beta = p.z.clamp(-1.0, 1.0).asin();
    (FRAC_PI_2 - beta, lambda + FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEG2RAD;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn mars_pole() -> IcrfPole {
        IcrfPole {
            ra0: 317.68143 * DEG2RAD,
            ra1: -0.1061 * DEG2RAD,
            de0: 52.88650 * DEG2RAD,
            de1: -0.0609 * DEG2RAD,
            w0: 176.630,
            w1: 350.89198226,
        }
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(6.0, 90.0)]
    #[case(12.0, 180.0)]
    #[case(24.0, 0.0)]
    #[case(-6.0, 270.0)]
    fn test_legacy_angle(#[case] days: f64, #[case] expected: f64) {
        let re = RotationElements::legacy(24.0, 0.0, J2000, 0.0, 0.0, 0.0).unwrap();
        let t = Time::from_jd_pair(J2000 + days, J2000 + days);
        let w = re.sidereal_rotation_angle(&t, &CorrectionTable::default()).unwrap();
        assert_relative_eq!(w, expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(-1.0e7)]
    #[case(-3.652_5e6)]
    #[case(-1.0e-13)]
    #[case(1.0e-13)]
    #[case(3.652_5e6)]
    #[case(1.0e7)]
    #[case(1.234_567_890_123e8)]
    fn test_angle_normalised_far_from_epoch(#[case] days: f64) {
        let table = CorrectionTable::default();
        let t = Time::from_jd_pair(J2000 + days, J2000 + days);
        let legacy = RotationElements::legacy(0.37, 123.0, J2000, 0.1, 0.2, 0.0).unwrap();
        let modern = RotationElements::icrf(mars_pole(), J2000, 686.98).unwrap();
        let retrograde = RotationElements::icrf(
            IcrfPole {
                w1: -1.4813688,
                ..mars_pole()
            },
            J2000,
            224.7,
        )
        .unwrap();
        for re in [legacy, modern, retrograde] {
            let w = re.sidereal_rotation_angle(&t, &table).unwrap();
            assert!((0.0..360.0).contains(&w), "angle {w} out of range at {days} days");
            let spin = re.spin_angle(&t, &table).unwrap();
            assert!((0.0..360.0).contains(&spin), "spin {spin} out of range at {days} days");
        }
    }

    #[test]
    fn test_angle_always_normalised() {
        let re = RotationElements::legacy(0.37, 123.0, J2000, 0.1, 0.2, 0.0).unwrap();
        let table = CorrectionTable::default();
        for k in -200..200 {
            let jd = J2000 + k as f64 * 17.123;
            let w = re
                .sidereal_rotation_angle(&Time::from_jd_pair(jd, jd), &table)
                .unwrap();
            assert!((0.0..360.0).contains(&w), "angle {w} out of range");
        }
    }

    #[test]
    fn test_normalize_never_returns_360() {
        assert_eq!(normalize_degrees(-1e-15), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_relative_eq!(normalize_degrees(-90.0), 270.0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_period_rejected(#[case] period: f64) {
        assert!(matches!(
            RotationElements::legacy(period, 0.0, J2000, 0.0, 0.0, 0.0),
            Err(OrreryError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let pole = IcrfPole {
            w1: 0.0,
            ..mars_pole()
        };
        assert!(RotationElements::icrf(pole, J2000, 686.98).is_err());
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let re = RotationElements::legacy(1.0, 0.0, J2000, 0.0, 0.0, 0.0)
            .unwrap()
            .with_spin_time(TimeFlavor::Civil);
        let table = CorrectionTable::default();
        let t = Time::from_jd_pair(f64::NAN, J2000);
        assert!(matches!(
            re.sidereal_rotation_angle(&t, &table),
            Err(OrreryError::Time(TimeError::OutOfRange(_)))
        ));
        // The ephemeris flavour is still usable
        let ephemeris = re.with_spin_time(TimeFlavor::Ephemeris);
        assert!(ephemeris.sidereal_rotation_angle(&t, &table).is_ok());
    }

    #[test]
    fn test_civil_spin_uses_jd() {
        let re = RotationElements::legacy(1.0, 0.0, J2000, 0.0, 0.0, 0.0)
            .unwrap()
            .with_spin_time(TimeFlavor::Civil);
        let t = Time::from_jd_pair(J2000 + 0.25, J2000 + 0.5);
        let w = re.sidereal_rotation_angle(&t, &CorrectionTable::default()).unwrap();
        assert_relative_eq!(w, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_modern_pole_derivation() {
        let re = RotationElements::icrf(mars_pole(), J2000, 686.98).unwrap();
        let table = CorrectionTable::default();
        let p = re.pole_vector(J2000, &table);
        assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-12);

        // The axis built from obliquity and node points at the pole
        let axis = re.axis_rotation(J2000, &table) * Vector3::z();
        assert_relative_eq!(axis, p, epsilon = 1e-12);

        // Mars is tilted by roughly 25 degrees to its orbit, ~26.7 to the ecliptic
        let obliquity = re.rot_obliquity(J2000, &table).to_degrees();
        assert!(obliquity > 24.0 && obliquity < 28.0, "obliquity {obliquity}");
        assert_relative_eq!(re.sidereal_day(), 360.0 / 350.89198226, epsilon = 1e-12);
    }

    #[test]
    fn test_modern_angle_matches_w() {
        let re = RotationElements::icrf(mars_pole(), J2000, 686.98).unwrap();
        let t = Time::from_jd_pair(J2000 + 10.0, J2000 + 10.0);
        let w = re.sidereal_rotation_angle(&t, &CorrectionTable::default()).unwrap();
        let expected = normalize_degrees(176.630 + 350.89198226 * 10.0);
        assert_relative_eq!(w, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_prime_meridian_lands_on_icrf_node() {
        // With W = 0 the body x-axis must point at the ICRF ascending node
        let pole = IcrfPole {
            w0: 0.0,
            w1: 1.0,
            ..mars_pole()
        };
        let re = RotationElements::icrf(pole, J2000, 0.0).unwrap();
        let table = CorrectionTable::default();
        let t = Time::from_jd_pair(J2000, J2000);
        let x_axis = re.body_rotation(&t, &table).unwrap() * Vector3::x();
        let p = re.pole_vector(J2000, &table);
        let icrf_node = (*ICRF_TO_ECLIPTIC * Vector3::z()).cross(&p).normalize();
        assert_relative_eq!(x_axis, icrf_node, epsilon = 1e-9);
    }

    fn earth_rotation() -> RotationElements {
        RotationElements::legacy(0.99726956633, 280.46061837, J2000, 0.0, 0.0, 365.25)
            .unwrap()
            .with_correction(AxisCorrection::Earth)
            .with_spin_time(TimeFlavor::Civil)
    }

    #[test]
    fn test_earth_axis_uses_obliquity_of_date() {
        let re = earth_rotation();
        let table = CorrectionTable::default();
        let jde = J2000 + 3652.5;
        assert_relative_eq!(re.rot_obliquity(jde, &table), mean_obliquity(jde));
        assert_eq!(re.rot_ascending_node(jde, &table), 0.0);

        let eps = mean_obliquity(J2000);
        let pole = re.pole_vector(J2000, &table);
        assert_relative_eq!(pole, Vector3::new(0.0, eps.sin(), eps.cos()), epsilon = 1e-12);
    }

    #[rstest]
    #[case(-10.0)]
    #[case(-5.0)]
    #[case(-1.0)]
    #[case(1.0)]
    #[case(5.0)]
    fn test_earth_pole_follows_precession(#[case] centuries: f64) {
        // WGCCRE Earth pole: RA = -0.641 T, Dec = 90 - 0.557 T
        let ra = (-0.641 * centuries) * DEG2RAD;
        let de = (90.0 - 0.557 * centuries) * DEG2RAD;
        let iau = framelib::icrf_to_ecliptic(&Vector3::new(
            de.cos() * ra.cos(),
            de.cos() * ra.sin(),
            de.sin(),
        ));
        let jde = J2000 + centuries * JULIAN_CENTURY;
        let pole = earth_rotation().pole_vector(jde, &CorrectionTable::default());
        let separation = pole.angle(&iau).to_degrees();
        assert!(separation < 0.01, "separation {separation} deg at T = {centuries}");
    }

    #[test]
    fn test_legacy_pole_from_stored_axis() {
        let re = RotationElements::legacy(1.0, 0.0, J2000, 0.5, 1.0, 0.0).unwrap();
        let table = CorrectionTable::default();
        assert_eq!(re.rot_obliquity(J2000 + 100.0, &table), 0.5);
        assert_eq!(re.rot_ascending_node(J2000 + 100.0, &table), 1.0);
        assert_eq!(re.prime_meridian_offset(J2000, &table), 0.0);
        assert!(!re.is_icrf());
    }
}
