//! Apparent visual magnitudes and phase geometry
//!
//! Major planets use one of several published sets of magnitude formulas,
//! selected globally. Minor planets use the H,G system, comets a power law in
//! heliocentric distance, and anything else a diffuse-sphere model driven by
//! albedo and radius.

use crate::constants::SUN_MAGNITUDE_1AU;
use crate::planetlib::{Body, PlanetType};
use crate::{OrreryError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Published formula sets for planetary magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MagnitudeAlgorithm {
    /// G. Müller, 1893, as used in older planetarium software
    Mueller1893,
    /// Astronomical Almanac 1984 and later (D. L. Harris)
    AstronomicalAlmanac1984,
    /// Explanatory Supplement to the Astronomical Almanac, 1992
    ExplanatorySupplement1992,
    /// Explanatory Supplement to the Astronomical Almanac, 3rd edition 2013
    #[default]
    ExplanatorySupplement2013,
    /// Albedo-based sphere model for every body
    Generic,
    /// No algorithm selected; magnitudes cannot be computed
    Undefined,
}

impl MagnitudeAlgorithm {
    pub const ALL: [MagnitudeAlgorithm; 6] = [
        MagnitudeAlgorithm::Mueller1893,
        MagnitudeAlgorithm::AstronomicalAlmanac1984,
        MagnitudeAlgorithm::ExplanatorySupplement1992,
        MagnitudeAlgorithm::ExplanatorySupplement2013,
        MagnitudeAlgorithm::Generic,
        MagnitudeAlgorithm::Undefined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MagnitudeAlgorithm::Mueller1893 => "Mueller_1893",
            MagnitudeAlgorithm::AstronomicalAlmanac1984 => "AstronomicalAlmanac_1984",
            MagnitudeAlgorithm::ExplanatorySupplement1992 => "ExplanatorySupplement_1992",
            MagnitudeAlgorithm::ExplanatorySupplement2013 => "ExplanatorySupplement_2013",
            MagnitudeAlgorithm::Generic => "Generic",
            MagnitudeAlgorithm::Undefined => "UndefinedAlgorithm",
        }
    }
}

impl fmt::Display for MagnitudeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MagnitudeAlgorithm {
    type Err = OrreryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| OrreryError::UnknownMagnitudeAlgorithm(s.to_string()))
    }
}

impl TryFrom<String> for MagnitudeAlgorithm {
    type Error = OrreryError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<MagnitudeAlgorithm> for String {
    fn from(a: MagnitudeAlgorithm) -> Self {
        a.as_str().to_string()
    }
}

/// Angle at `c` in the triangle a-b-c given the three side lengths, radians.
///
/// `ca` and `cb` are the sides meeting at `c`, `ab` the opposite one. A
/// zero-length side yields 0.
fn triangle_angle(ca: f64, cb: f64, ab: f64) -> f64 {
    if ca <= 0.0 || cb <= 0.0 || ab < 0.0 {
        return 0.0;
    }
    let cos = (ca * ca + cb * cb - ab * ab) / (2.0 * ca * cb);
    if !cos.is_finite() {
        return 0.0;
    }
    cos.clamp(-1.0, 1.0).acos()
}

/// Sun-body-observer angle, radians in [0, π]. Positions are heliocentric.
pub fn phase_angle(body: &Vector3<f64>, observer: &Vector3<f64>) -> f64 {
    let r = body.norm();
    let delta = (body - observer).norm();
    triangle_angle(delta, r, observer.norm())
}

/// Sun-observer-body angle, radians in [0, π]. Positions are heliocentric.
pub fn elongation(body: &Vector3<f64>, observer: &Vector3<f64>) -> f64 {
    let big_r = observer.norm();
    let delta = (body - observer).norm();
    triangle_angle(delta, big_r, body.norm())
}

/// Illuminated fraction of the disk for a phase angle
pub fn illuminated_fraction(phase_angle: f64) -> f64 {
    ((1.0 + phase_angle.cos()) / 2.0).clamp(0.0, 1.0)
}

/// Sine of the planetocentric elevation of the observer over the equator
/// of a body with unit pole `pole`
pub fn ring_tilt_sin(pole: &Vector3<f64>, body: &Vector3<f64>, observer: &Vector3<f64>) -> f64 {
    let to_observer = observer - body;
    let norm = to_observer.norm();
    if norm == 0.0 {
        return 0.0;
    }
    (pole.dot(&to_observer) / norm).clamp(-1.0, 1.0)
}

/// Everything a magnitude formula needs about one body and one observer
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeInput {
    pub body: Option<Body>,
    pub kind: PlanetType,
    /// Equatorial radius, AU
    pub radius: f64,
    pub albedo: f64,
    /// H for minor planets and comets
    pub absolute_magnitude: Option<f64>,
    /// G for minor planets, k for comets
    pub slope: Option<f64>,
    /// Distance body to Sun, AU
    pub r: f64,
    /// Distance body to observer, AU
    pub delta: f64,
    /// Phase angle, radians
    pub phase_angle: f64,
    /// Sine of the ring tilt towards the observer (Saturn)
    pub ring_tilt_sin: f64,
}

/// Apparent visual magnitude under the selected algorithm
pub fn v_magnitude(algorithm: MagnitudeAlgorithm, input: &MagnitudeInput) -> Result<f64> {
    if algorithm == MagnitudeAlgorithm::Undefined {
        return Err(OrreryError::UndefinedMagnitudeAlgorithm);
    }
    if input.body == Some(Body::Sun) || input.kind == PlanetType::Star {
        return Ok(SUN_MAGNITUDE_1AU + 5.0 * input.delta.log10());
    }
    if input.kind.is_comet() {
        if let Some(h) = input.absolute_magnitude {
            let k = input.slope.unwrap_or(4.0);
            return Ok(h + 5.0 * input.delta.log10() + 2.5 * k * input.r.log10());
        }
    }
    if input.kind.is_minor_planet() {
        if let (Some(h), Some(g)) = (input.absolute_magnitude, input.slope) {
            return Ok(hg_magnitude(h, g, input));
        }
    }
    let major = match (algorithm, input.body) {
        (MagnitudeAlgorithm::Generic, _) | (_, None) => None,
        (algorithm, Some(body)) => major_body_magnitude(algorithm, body, input),
    };
    Ok(major.unwrap_or_else(|| generic_magnitude(input)))
}

fn hg_magnitude(h: f64, g: f64, input: &MagnitudeInput) -> f64 {
    let d = 5.0 * (input.r * input.delta).log10();
    let half_tan = (input.phase_angle / 2.0).tan();
    let phi1 = (-3.33 * half_tan.powf(0.63)).exp();
    let phi2 = (-1.87 * half_tan.powf(1.22)).exp();
    h + d - 2.5 * ((1.0 - g) * phi1 + g * phi2).log10()
}

/// Diffuse sphere lit by the Sun
pub fn generic_magnitude(input: &MagnitudeInput) -> f64 {
    let alpha = input.phase_angle;
    let p = (1.0 - alpha / PI) * alpha.cos() + alpha.sin() / PI;
    let flux = 2.0 * input.albedo * input.radius * input.radius * p
        / (3.0 * input.delta * input.delta * input.r * input.r);
    SUN_MAGNITUDE_1AU - 2.5 * flux.log10()
}

fn major_body_magnitude(
    algorithm: MagnitudeAlgorithm,
    body: Body,
    input: &MagnitudeInput,
) -> Option<f64> {
    let d = 5.0 * (input.r * input.delta).log10();
    let i = input.phase_angle.to_degrees();
    let sin_b = input.ring_tilt_sin;
    let rings = -2.60 * sin_b.abs() + 1.25 * sin_b * sin_b;

    let m = match algorithm {
        MagnitudeAlgorithm::Mueller1893 => match body {
            Body::Mercury => {
                let i50 = i - 50.0;
                1.16 + d + 0.02838 * i50 + 0.0001023 * i50 * i50
            }
            Body::Venus => -4.00 + d + 0.01322 * i + 0.0000004247 * i * i * i,
            Body::Mars => -1.30 + d + 0.01486 * i,
            Body::Jupiter => -8.93 + d,
            Body::Saturn => -8.68 + d + 0.044 * i + rings,
            Body::Uranus => -6.85 + d,
            Body::Neptune => -7.05 + d,
            _ => return None,
        },
        MagnitudeAlgorithm::AstronomicalAlmanac1984 => match body {
            Body::Mercury => -0.36 + d + 0.027 * i + 2.2e-13 * i.powi(6),
            Body::Venus => -4.29 + d + 0.0009 * i + 0.000239 * i * i - 0.00000065 * i * i * i,
            Body::Mars => -1.52 + d + 0.016 * i,
            Body::Jupiter => -9.25 + d + 0.005 * i,
            Body::Saturn => -8.88 + d + 0.044 * i + rings,
            Body::Uranus => -7.19 + d + 0.0028 * i,
            Body::Neptune => -6.87 + d,
            Body::Pluto => -1.01 + d + 0.041 * i,
            Body::Moon => 0.21 + d + 0.026 * i + 4.0e-9 * i.powi(4),
            _ => return None,
        },
        MagnitudeAlgorithm::ExplanatorySupplement1992 => match body {
            Body::Mercury => -0.42 + d + 0.0380 * i - 0.000273 * i * i + 0.000002 * i * i * i,
            Body::Venus => -4.40 + d + 0.0009 * i + 0.000239 * i * i - 0.00000065 * i * i * i,
            Body::Earth => -3.86 + d,
            Body::Mars => -1.52 + d + 0.016 * i,
            Body::Jupiter => -9.40 + d + 0.005 * i,
            Body::Saturn => -8.88 + d + rings,
            Body::Uranus => -7.19 + d + 0.0028 * i,
            Body::Neptune => -6.87 + d,
            Body::Pluto => -1.01 + d + 0.041 * i,
            _ => return None,
        },
        MagnitudeAlgorithm::ExplanatorySupplement2013 => match body {
            Body::Mercury => -0.60 + d + (((3.02e-6 * i - 0.000488) * i + 0.0498) * i),
            Body::Venus if i < 163.6 => {
                -4.47 + d + ((0.13e-6 * i + 0.000057) * i + 0.0103) * i
            }
            Body::Venus => 0.98 + d - 0.0102 * i,
            Body::Earth => -3.87 + d + (((0.48e-6 * i + 0.0000194) * i + 0.0048) * i),
            Body::Mars => -1.52 + d + 0.016 * i,
            Body::Jupiter => -9.40 + d + 0.005 * i,
            Body::Saturn => -8.88 + d + 0.044 * i + rings,
            Body::Uranus => -7.19 + d + 0.002 * i,
            Body::Neptune => -6.87 + d,
            Body::Pluto => -1.01 + d,
            _ => return None,
        },
        MagnitudeAlgorithm::Generic | MagnitudeAlgorithm::Undefined => return None,
    };
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn input(
        body: Option<Body>,
        kind: PlanetType,
        r: f64,
        delta: f64,
        phase_deg: f64,
    ) -> MagnitudeInput {
        MagnitudeInput {
            body,
            kind,
            radius: 4.0e-5,
            albedo: 0.3,
            absolute_magnitude: None,
            slope: None,
            r,
            delta,
            phase_angle: phase_deg.to_radians(),
            ring_tilt_sin: 0.0,
        }
    }

    #[test]
    fn test_phase_angle_full_and_new() {
        let body = Vector3::new(1.5, 0.0, 0.0);
        // Observer between body and Sun: full phase
        assert_relative_eq!(phase_angle(&body, &Vector3::new(1.0, 0.0, 0.0)), 0.0, epsilon = 1e-7);
        // Observer behind body: new phase
        let alpha = phase_angle(&Vector3::new(0.5, 0.0, 0.0), &Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(alpha, PI, epsilon = 1e-7);
    }

    #[test]
    fn test_phase_angle_quadrature() {
        let body = Vector3::new(1.0, 0.0, 0.0);
        let observer = Vector3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(phase_angle(&body, &observer), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(elongation(&body, &observer), PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_geometry_gives_zero() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(phase_angle(&p, &p), 0.0);
        assert_eq!(phase_angle(&Vector3::zeros(), &p), 0.0);
        assert_eq!(elongation(&p, &Vector3::zeros()), 0.0);
    }

    #[test]
    fn test_phase_angle_range_for_many_geometries() {
        for k in 0..50 {
            let a = k as f64 * 0.37;
            let body = Vector3::new(a.cos() * 2.0, a.sin() * 2.0, 0.1 * a);
            let observer = Vector3::new((3.0 * a).sin(), (2.0 * a).cos(), 0.0);
            let alpha = phase_angle(&body, &observer);
            assert!((0.0..=PI).contains(&alpha));
        }
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(90.0, 0.5)]
    #[case(180.0, 0.0)]
    fn test_illuminated_fraction(#[case] alpha_deg: f64, #[case] expected: f64) {
        assert_relative_eq!(
            illuminated_fraction(alpha_deg.to_radians()),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_illuminated_fraction_monotonic() {
        let mut last = 2.0;
        for k in 0..=180 {
            let f = illuminated_fraction((k as f64).to_radians());
            assert!(f <= last);
            last = f;
        }
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(
            "Mueller_1893".parse::<MagnitudeAlgorithm>().unwrap(),
            MagnitudeAlgorithm::Mueller1893
        );
        assert_eq!(
            "explanatorysupplement_2013".parse::<MagnitudeAlgorithm>().unwrap(),
            MagnitudeAlgorithm::ExplanatorySupplement2013
        );
        assert!(matches!(
            "Harris_1961".parse::<MagnitudeAlgorithm>(),
            Err(OrreryError::UnknownMagnitudeAlgorithm(name)) if name == "Harris_1961"
        ));
        assert!(serde_json::from_str::<MagnitudeAlgorithm>("\"Bogus\"").is_err());
    }

    #[test]
    fn test_undefined_algorithm_is_an_error() {
        let inp = input(Some(Body::Mars), PlanetType::Planet, 1.5, 0.5, 10.0);
        assert!(matches!(
            v_magnitude(MagnitudeAlgorithm::Undefined, &inp),
            Err(OrreryError::UndefinedMagnitudeAlgorithm)
        ));
    }

    #[rstest]
    #[case(MagnitudeAlgorithm::Mueller1893, -8.93)]
    #[case(MagnitudeAlgorithm::AstronomicalAlmanac1984, -9.25)]
    #[case(MagnitudeAlgorithm::ExplanatorySupplement1992, -9.40)]
    #[case(MagnitudeAlgorithm::ExplanatorySupplement2013, -9.40)]
    fn test_jupiter_absolute_magnitude(
        #[case] algorithm: MagnitudeAlgorithm,
        #[case] expected: f64,
    ) {
        let inp = input(Some(Body::Jupiter), PlanetType::Planet, 1.0, 1.0, 0.0);
        assert_relative_eq!(v_magnitude(algorithm, &inp).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sun_magnitude() {
        let inp = input(Some(Body::Sun), PlanetType::Star, 0.0, 1.0, 0.0);
        assert_relative_eq!(
            v_magnitude(MagnitudeAlgorithm::Mueller1893, &inp).unwrap(),
            -26.73,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_venus_branches_2013() {
        let low = input(Some(Body::Venus), PlanetType::Planet, 0.72, 0.5, 100.0);
        let high = input(Some(Body::Venus), PlanetType::Planet, 0.72, 0.5, 170.0);
        let d = 5.0 * (0.72f64 * 0.5).log10();
        let m = v_magnitude(MagnitudeAlgorithm::ExplanatorySupplement2013, &low).unwrap();
        let i = 100.0;
        let expected = -4.47 + d + ((0.13e-6 * i + 0.000057) * i + 0.0103) * i;
        assert_relative_eq!(m, expected, epsilon = 1e-9);
        let m = v_magnitude(MagnitudeAlgorithm::ExplanatorySupplement2013, &high).unwrap();
        assert_relative_eq!(m, 0.98 + d - 0.0102 * 170.0, epsilon = 1e-9);
    }

    #[test]
    fn test_saturn_rings_brighten() {
        let mut inp = input(Some(Body::Saturn), PlanetType::Planet, 9.5, 8.5, 5.0);
        let edge_on = v_magnitude(MagnitudeAlgorithm::ExplanatorySupplement2013, &inp).unwrap();
        inp.ring_tilt_sin = 26.0f64.to_radians().sin();
        let open = v_magnitude(MagnitudeAlgorithm::ExplanatorySupplement2013, &inp).unwrap();
        assert!(open < edge_on);
    }

    #[test]
    fn test_uncovered_body_falls_back_to_generic() {
        // Mueller has no Pluto formula
        let inp = input(Some(Body::Pluto), PlanetType::DwarfPlanet, 39.0, 38.0, 1.0);
        assert_relative_eq!(
            v_magnitude(MagnitudeAlgorithm::Mueller1893, &inp).unwrap(),
            generic_magnitude(&inp),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_hg_magnitude_at_opposition() {
        let mut inp = input(None, PlanetType::Asteroid, 2.0, 1.0, 0.0);
        inp.absolute_magnitude = Some(3.34);
        inp.slope = Some(0.12);
        let m = v_magnitude(MagnitudeAlgorithm::ExplanatorySupplement2013, &inp).unwrap();
        assert_relative_eq!(m, 3.34 + 5.0 * 2.0f64.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_comet_magnitude() {
        let mut inp = input(None, PlanetType::Comet, 2.0, 1.5, 20.0);
        inp.absolute_magnitude = Some(5.5);
        let m = v_magnitude(MagnitudeAlgorithm::ExplanatorySupplement2013, &inp).unwrap();
        assert_relative_eq!(m, 5.5 + 5.0 * 1.5f64.log10() + 10.0 * 2.0f64.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_generic_fades_with_phase() {
        let full = generic_magnitude(&input(None, PlanetType::Moon, 5.2, 4.2, 0.0));
        let gibbous = generic_magnitude(&input(None, PlanetType::Moon, 5.2, 4.2, 10.0));
        assert!(gibbous > full);
    }
}
