//! Inertial reference frames used by the ephemeris core
//!
//! Positions are kept in the J2000 ecliptic frame of VSOP87. Output towards
//! observers is given in the ICRF (J2000 equatorial).

pub mod inertial;

pub use inertial::{Ecliptic, Equatorial, InertialFrame};

use crate::constants::{
    ASEC2RAD, DEG2RAD, JULIAN_CENTURY, J2000, OBLIQUITY_J2000_ASEC, VSOP87_FRAME_TIE_DEG,
};
use lazy_static::lazy_static;
use nalgebra::{Rotation3, Vector3};

lazy_static! {
    /// Rotation taking ICRF vectors into the VSOP87 J2000 ecliptic frame
    pub static ref ICRF_TO_ECLIPTIC: Rotation3<f64> =
        Rotation3::from_axis_angle(&Vector3::x_axis(), -OBLIQUITY_J2000_ASEC * ASEC2RAD)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), VSOP87_FRAME_TIE_DEG * DEG2RAD);

    /// Rotation taking VSOP87 J2000 ecliptic vectors into the ICRF
    pub static ref ECLIPTIC_TO_ICRF: Rotation3<f64> = ICRF_TO_ECLIPTIC.inverse();
}

/// Express an ICRF vector in the J2000 ecliptic frame
pub fn icrf_to_ecliptic(v: &Vector3<f64>) -> Vector3<f64> {
    *ICRF_TO_ECLIPTIC * v
}

/// Express a J2000 ecliptic vector in the ICRF
pub fn ecliptic_to_icrf(v: &Vector3<f64>) -> Vector3<f64> {
    *ECLIPTIC_TO_ICRF * v
}

/// Mean obliquity of the ecliptic of date (IAU 2006), radians
pub fn mean_obliquity(jde: f64) -> f64 {
    let t = (jde - J2000) / JULIAN_CENTURY;
    let arcsec = OBLIQUITY_J2000_ASEC
        + (-46.836769
            + (-0.0001831 + (0.00200340 + (-0.000000576 + (-0.0000000434) * t) * t) * t) * t)
            * t;
    arcsec * ASEC2RAD
}

/// IAU 2006 precession angles `(ψ_A, ω_A, χ_A)` in radians.
///
/// `ψ_A` is the luni-solar precession along the J2000 ecliptic, `ω_A` the
/// inclination of the mean equator of date on the J2000 ecliptic and `χ_A`
/// the planetary precession along the equator of date.
pub fn precession_angles(jde: f64) -> (f64, f64, f64) {
    let t = (jde - J2000) / JULIAN_CENTURY;
    let psi = (5038.481507
        + (-1.0790069 + (-0.00114045 + (0.000132851 - 0.0000000951 * t) * t) * t) * t)
        * t;
    let omega = OBLIQUITY_J2000_ASEC
        + (-0.025754 + (0.0512623 + (-0.00772503 + (-0.000000467 + 0.0000003337 * t) * t) * t) * t)
            * t;
    let chi = (10.556403
        + (-2.3814292 + (-0.00121197 + (0.000170663 - 0.0000000560 * t) * t) * t) * t)
        * t;
    (psi * ASEC2RAD, omega * ASEC2RAD, chi * ASEC2RAD)
}

/// Rotation taking the mean equator and equinox of date into the J2000 ecliptic
pub fn equator_of_date_to_ecliptic(jde: f64) -> Rotation3<f64> {
    let (psi, omega, chi) = precession_angles(jde);
    Rotation3::from_axis_angle(&Vector3::z_axis(), -psi)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), -omega)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), chi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_celestial_pole_in_ecliptic_frame() {
        let pole = icrf_to_ecliptic(&Vector3::z());
        let eps = OBLIQUITY_J2000_ASEC * ASEC2RAD;
        assert_relative_eq!(pole.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(pole.y, eps.sin(), epsilon = 1e-9);
        assert_relative_eq!(pole.z, eps.cos(), epsilon = 1e-9);
    }

    #[test]
    fn test_frame_rotations_are_inverse() {
        let v = Vector3::new(0.3, -1.2, 0.7);
        let back = ecliptic_to_icrf(&icrf_to_ecliptic(&v));
        assert_relative_eq!(back, v, epsilon = 1e-14);
    }

    #[test]
    fn test_mean_obliquity() {
        assert_relative_eq!(mean_obliquity(J2000), 84381.406 * ASEC2RAD, epsilon = 1e-15);
        // Obliquity decreases by roughly 47 arcseconds per century
        let drift = (mean_obliquity(J2000 + JULIAN_CENTURY) - mean_obliquity(J2000)) / ASEC2RAD;
        assert_relative_eq!(drift, -46.8369, epsilon = 0.01);
    }

    #[test]
    fn test_equator_of_date_at_j2000_is_mean_equator() {
        let r = equator_of_date_to_ecliptic(J2000);
        let expected =
            Rotation3::from_axis_angle(&Vector3::x_axis(), -OBLIQUITY_J2000_ASEC * ASEC2RAD);
        assert_relative_eq!(r, expected, epsilon = 1e-15);
    }

    #[test]
    fn test_equinox_of_date_recedes_along_ecliptic() {
        // After one century the equinox has moved about 5029 arcsec west
        let jde = J2000 + JULIAN_CENTURY;
        let equinox = equator_of_date_to_ecliptic(jde) * Vector3::x();
        let longitude = equinox.y.atan2(equinox.x) / ASEC2RAD;
        assert_relative_eq!(longitude, -5028.8, epsilon = 1.0);
        // The equinox of date lies on the ecliptic of date, slightly off J2000's
        assert!(equinox.z.abs() < 50.0 * ASEC2RAD);
    }
}
