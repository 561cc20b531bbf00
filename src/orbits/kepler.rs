//! Two-body conic propagation
//!
//! All angles in radians, distances in AU, times in days. States are produced
//! in the orbital plane with x towards perihelion and rotated into the
//! reference frame with [`orbital_to_reference`].

use nalgebra::{Rotation3, Vector3};
use std::f64::consts::PI;

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-14;

/// Eccentricities this close to one are propagated as parabolas
pub const PARABOLIC_TOLERANCE: f64 = 1e-8;

/// Wrap an angle to [-π, π)
pub fn wrap_pi(a: f64) -> f64 {
    (a + PI).rem_euclid(2.0 * PI) - PI
}

/// Eccentric anomaly from mean anomaly, elliptic case (Newton iteration)
pub fn solve_elliptic(mean_anomaly: f64, e: f64) -> f64 {
    let m = wrap_pi(mean_anomaly);
    let mut ecc = if e > 0.8 { PI.copysign(m) } else { m + e * m.sin() };
    for _ in 0..MAX_ITERATIONS {
        let delta = (ecc - e * ecc.sin() - m) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < TOLERANCE {
            break;
        }
    }
    ecc
}

/// Hyperbolic anomaly from mean anomaly (`e·sinh H − H = M`)
pub fn solve_hyperbolic(mean_anomaly: f64, e: f64) -> f64 {
    let m = mean_anomaly;
    let mut h = (2.0 * m.abs() / e + 1.8).ln().copysign(m);
    for _ in 0..MAX_ITERATIONS {
        let delta = (e * h.sinh() - h - m) / (e * h.cosh() - 1.0);
        h -= delta;
        if delta.abs() < TOLERANCE * h.abs().max(1.0) {
            break;
        }
    }
    h
}

/// True anomaly `dt` days after perihelion passage on a conic with
/// perihelion distance `q`, eccentricity `e` and gravitational parameter `mu`
pub fn true_anomaly(q: f64, e: f64, mu: f64, dt: f64) -> f64 {
    if (e - 1.0).abs() < PARABOLIC_TOLERANCE {
        // Barker's equation: s³ + 3s = W with s = tan(ν/2)
        let w = 3.0 * (mu / (2.0 * q * q * q)).sqrt() * dt;
        let y = (w / 2.0 + (w * w / 4.0 + 1.0).sqrt()).cbrt();
        let s = y - 1.0 / y;
        2.0 * s.atan()
    } else if e < 1.0 {
        let a = q / (1.0 - e);
        let n = (mu / (a * a * a)).sqrt();
        let ecc = solve_elliptic(n * dt, e);
        2.0 * (((1.0 + e) / (1.0 - e)).sqrt() * (ecc / 2.0).tan()).atan()
    } else {
        let a = q / (e - 1.0);
        let n = (mu / (a * a * a)).sqrt();
        let h = solve_hyperbolic(n * dt, e);
        2.0 * (((e + 1.0) / (e - 1.0)).sqrt() * (h / 2.0).tanh()).atan()
    }
}

/// Time since perihelion passage at true anomaly `nu` (inverse of [`true_anomaly`])
pub fn time_since_perihelion(q: f64, e: f64, mu: f64, nu: f64) -> f64 {
    if (e - 1.0).abs() < PARABOLIC_TOLERANCE {
        let s = (nu / 2.0).tan();
        (s + s * s * s / 3.0) / (mu / (2.0 * q * q * q)).sqrt()
    } else if e < 1.0 {
        let a = q / (1.0 - e);
        let n = (mu / (a * a * a)).sqrt();
        let ecc = 2.0 * (((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan()).atan();
        (ecc - e * ecc.sin()) / n
    } else {
        let a = q / (e - 1.0);
        let n = (mu / (a * a * a)).sqrt();
        let h = 2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * (nu / 2.0).tan()).atanh();
        (e * h.sinh() - h) / n
    }
}

/// Position and velocity in the orbital plane at true anomaly `nu`
pub fn perifocal_state(q: f64, e: f64, mu: f64, nu: f64) -> (Vector3<f64>, Vector3<f64>) {
    let p = q * (1.0 + e);
    let (sin_nu, cos_nu) = nu.sin_cos();
    let r = p / (1.0 + e * cos_nu);
    let k = (mu / p).sqrt();
    (
        Vector3::new(r * cos_nu, r * sin_nu, 0.0),
        Vector3::new(-k * sin_nu, k * (e + cos_nu), 0.0),
    )
}

/// Rotation from the orbital plane into the reference frame: Rz(Ω)·Rx(i)·Rz(ω)
pub fn orbital_to_reference(node: f64, inclination: f64, arg_perihelion: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), node)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), inclination)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), arg_perihelion)
}
