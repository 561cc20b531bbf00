//! Constants module for astronomical calculations

use std::f64::consts::PI;

// Astronomical distances
/// Astronomical Unit in meters (per IAU 2012 Resolution B2)
pub const AU_M: f64 = 149_597_870_700.0;
/// Astronomical Unit in kilometers
pub const AU_KM: f64 = 149_597_870.700;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// J2000.0 epoch as Julian date
pub const J2000: f64 = 2_451_545.0;
/// Days per Julian century
pub const JULIAN_CENTURY: f64 = 36_525.0;
/// Days per Julian millennium
pub const JULIAN_MILLENNIUM: f64 = 365_250.0;
/// TT minus TAI in seconds
pub const TT_MINUS_TAI_S: f64 = 32.184;

// Angles
/// Arcseconds to radians conversion factor
pub const ASEC2RAD: f64 = 4.848_136_811_095_36e-6;
/// Degrees to radians conversion factor
pub const DEG2RAD: f64 = PI / 180.0;
/// Radians to degrees conversion factor
pub const RAD2DEG: f64 = 180.0 / PI;
/// Tau (2*PI) for full circle
pub const TAU: f64 = 2.0 * PI;

// Physics
/// Gaussian gravitational constant k (AU^(3/2) / day)
pub const GAUSS_K: f64 = 0.017_202_098_95;
/// Heliocentric gravitational parameter k^2 in AU^3/day^2
pub const GM_SUN_AU: f64 = GAUSS_K * GAUSS_K;
/// Solar radius in kilometers
pub const SUN_RADIUS_KM: f64 = 696_000.0;
/// Solar radius in AU
pub const SUN_RADIUS_AU: f64 = SUN_RADIUS_KM / AU_KM;
/// Apparent visual magnitude of the Sun at 1 AU
pub const SUN_MAGNITUDE_1AU: f64 = -26.73;

// Earth constants
/// Mean obliquity of the ecliptic at J2000.0 (IAU 2006), arcseconds
pub const OBLIQUITY_J2000_ASEC: f64 = 84_381.406;
/// Rotation about z between the ICRF origin and the VSOP87 equinox, degrees
pub const VSOP87_FRAME_TIE_DEG: f64 = 0.000_027_5;

// Numerics
/// Step used for centred finite-difference velocities, in days (one hour).
///
/// The same step is used for every body; it must stay well below the
/// shortest orbital period in the system.
pub const FINITE_DIFFERENCE_STEP_DAYS: f64 = 1.0 / 24.0;
/// Number of segments used when sampling an orbit path
pub const ORBIT_SEGMENTS: usize = 360;
