use super::{ECLIPTIC_TO_ICRF, ICRF_TO_ECLIPTIC};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// Spherical directions in an inertial frame
pub trait InertialFrame: Sized {
    fn to_unit_vector(&self) -> Vector3<f64>;
    fn from_vector(v: &Vector3<f64>) -> Self;

    fn angle_between(&self, other: &Self) -> f64 {
        let v1 = self.to_unit_vector();
        let v2 = other.to_unit_vector();

        let cos_angle = v1.dot(&v2) / (v1.norm() * v2.norm());

        // Handle numerical precision issues
        if cos_angle >= 1.0 {
            0.0
        } else if cos_angle <= -1.0 {
            PI
        } else {
            cos_angle.acos()
        }
    }
}

// ICRF equatorial coordinates (RA/Dec)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    pub ra: f64,  // Right ascension in radians
    pub dec: f64, // Declination in radians
}

impl Equatorial {
    pub fn new(ra: f64, dec: f64) -> Self {
        Equatorial {
            ra: ra.rem_euclid(2.0 * PI),
            dec,
        }
    }

    /// Create a new Equatorial coordinate with values in degrees
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::new(ra_deg.to_radians(), dec_deg.to_radians())
    }

    /// Get right ascension in degrees
    pub fn ra_degrees(&self) -> f64 {
        self.ra.to_degrees()
    }

    /// Get declination in degrees
    pub fn dec_degrees(&self) -> f64 {
        self.dec.to_degrees()
    }
}

// J2000 ecliptic coordinates (VSOP87 frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ecliptic {
    pub lon: f64, // Ecliptic longitude in radians
    pub lat: f64, // Ecliptic latitude in radians
}

impl Ecliptic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Ecliptic {
            lon: lon.rem_euclid(2.0 * PI),
            lat,
        }
    }

    pub fn lon_degrees(&self) -> f64 {
        self.lon.to_degrees()
    }

    pub fn lat_degrees(&self) -> f64 {
        self.lat.to_degrees()
    }
}

fn spherical_to_unit(lon: f64, lat: f64) -> Vector3<f64> {
    let cos_lat = lat.cos();
    Vector3::new(cos_lat * lon.cos(), cos_lat * lon.sin(), lat.sin())
}

fn unit_to_spherical(v: &Vector3<f64>) -> (f64, f64) {
    let r_xy = (v.x * v.x + v.y * v.y).sqrt();
    (v.y.atan2(v.x), v.z.atan2(r_xy))
}

impl InertialFrame for Equatorial {
    fn to_unit_vector(&self) -> Vector3<f64> {
        spherical_to_unit(self.ra, self.dec)
    }

    fn from_vector(v: &Vector3<f64>) -> Self {
        let (ra, dec) = unit_to_spherical(v);
        Equatorial::new(ra, dec)
    }
}

impl InertialFrame for Ecliptic {
    fn to_unit_vector(&self) -> Vector3<f64> {
        spherical_to_unit(self.lon, self.lat)
    }

    fn from_vector(v: &Vector3<f64>) -> Self {
        let (lon, lat) = unit_to_spherical(v);
        Ecliptic::new(lon, lat)
    }
}

impl From<Equatorial> for Ecliptic {
    fn from(eq: Equatorial) -> Self {
        Ecliptic::from_vector(&(*ICRF_TO_ECLIPTIC * eq.to_unit_vector()))
    }
}

impl From<Ecliptic> for Equatorial {
    fn from(ec: Ecliptic) -> Self {
        Equatorial::from_vector(&(*ECLIPTIC_TO_ICRF * ec.to_unit_vector()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equatorial_unit_vector_specific_cases() {
        let v = Equatorial::new(0.0, 0.0).to_unit_vector();
        assert_relative_eq!(v, Vector3::x(), epsilon = 1e-12);

        let v = Equatorial::new(PI / 2.0, 0.0).to_unit_vector();
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);

        let v = Equatorial::new(0.0, PI / 2.0).to_unit_vector();
        assert_relative_eq!(v, Vector3::z(), epsilon = 1e-12);

        let eq = Equatorial::from_vector(&Vector3::new(0.5, 0.5, 1.0 / 2.0_f64.sqrt()));
        assert_relative_eq!(eq.ra, PI / 4.0, epsilon = 1e-12);
        assert_relative_eq!(eq.dec, PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_ra_is_normalised() {
        let eq = Equatorial::from_vector(&Vector3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(eq.ra_degrees(), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ecliptic_roundtrip_grid() {
        for i in 0..12 {
            for j in -4..=4 {
                let lon = i as f64 * 30.0_f64.to_radians();
                let lat = j as f64 * 20.0_f64.to_radians();
                let ec = Ecliptic::new(lon, lat);
                let eq: Equatorial = ec.into();
                let back: Ecliptic = eq.into();
                assert_relative_eq!(back.lat, lat, epsilon = 1e-9);
                assert_relative_eq!(back.lon.cos(), lon.cos(), epsilon = 1e-9);
                assert_relative_eq!(back.lon.sin(), lon.sin(), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_celestial_pole_latitude() {
        let ncp: Ecliptic = Equatorial::new(0.0, PI / 2.0).into();
        assert_relative_eq!(ncp.lon.to_degrees(), 90.0, epsilon = 1e-4);
        assert_relative_eq!(ncp.lat.to_degrees(), 90.0 - 84381.406 / 3600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_between() {
        let a = Equatorial::from_degrees(10.0, 0.0);
        let b = Equatorial::from_degrees(40.0, 0.0);
        assert_relative_eq!(a.angle_between(&b).to_degrees(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(a.angle_between(&a), 0.0, epsilon = 1e-12);
    }
}
