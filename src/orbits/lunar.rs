//! Truncated analytic lunar theory (principal terms of ELP-2000/82 as
//! tabulated in Meeus, Astronomical Algorithms ch. 47)

use crate::constants::{AU_KM, DEG2RAD, J2000, JULIAN_CENTURY};
use nalgebra::Vector3;

// Multiples of D, M, M', F with longitude (1e-6 deg) and distance (1e-3 km) amplitudes
const LONGITUDE_DISTANCE_TERMS: [(i8, i8, i8, i8, f64, f64); 32] = [
    (0, 0, 1, 0, 6_288_774.0, -20_905_355.0),
    (2, 0, -1, 0, 1_274_027.0, -3_699_111.0),
    (2, 0, 0, 0, 658_314.0, -2_955_968.0),
    (0, 0, 2, 0, 213_618.0, -569_925.0),
    (0, 1, 0, 0, -185_116.0, 48_888.0),
    (0, 0, 0, 2, -114_332.0, -3_149.0),
    (2, 0, -2, 0, 58_793.0, 246_158.0),
    (2, -1, -1, 0, 57_066.0, -152_138.0),
    (2, 0, 1, 0, 53_322.0, -170_733.0),
    (2, -1, 0, 0, 45_758.0, -204_586.0),
    (0, 1, -1, 0, -40_923.0, -129_620.0),
    (1, 0, 0, 0, -34_720.0, 108_743.0),
    (0, 1, 1, 0, -30_383.0, 104_755.0),
    (2, 0, 0, -2, 15_327.0, 10_321.0),
    (0, 0, 1, 2, -12_528.0, 0.0),
    (0, 0, 1, -2, 10_980.0, 79_661.0),
    (4, 0, -1, 0, 10_675.0, -34_782.0),
    (0, 0, 3, 0, 10_034.0, -23_210.0),
    (4, 0, -2, 0, 8_548.0, -21_636.0),
    (2, 1, -1, 0, -7_888.0, 24_208.0),
    (2, 1, 0, 0, -6_766.0, 30_824.0),
    (1, 0, -1, 0, -5_163.0, -8_379.0),
    (1, 1, 0, 0, 4_987.0, -16_675.0),
    (2, -1, 1, 0, 4_036.0, -12_831.0),
    (2, 0, 2, 0, 3_994.0, -10_445.0),
    (4, 0, 0, 0, 3_861.0, -11_650.0),
    (2, 0, -3, 0, 3_665.0, 14_403.0),
    (0, 1, -2, 0, -2_689.0, -7_003.0),
    (2, 0, -1, 2, -2_602.0, 0.0),
    (2, -1, -2, 0, 2_390.0, 10_056.0),
    (1, 0, 1, 0, -2_348.0, 6_322.0),
    (2, -2, 0, 0, 2_236.0, -9_884.0),
];

// Multiples of D, M, M', F with latitude amplitude (1e-6 deg)
const LATITUDE_TERMS: [(i8, i8, i8, i8, f64); 20] = [
    (0, 0, 0, 1, 5_128_122.0),
    (0, 0, 1, 1, 280_602.0),
    (0, 0, 1, -1, 277_693.0),
    (2, 0, 0, -1, 173_237.0),
    (2, 0, -1, 1, 55_413.0),
    (2, 0, -1, -1, 46_271.0),
    (2, 0, 0, 1, 32_573.0),
    (0, 0, 2, 1, 17_198.0),
    (2, 0, 1, -1, 9_266.0),
    (0, 0, 2, -1, 8_822.0),
    (2, -1, 0, -1, 8_216.0),
    (2, 0, -2, -1, 4_324.0),
    (2, 0, 1, 1, 4_200.0),
    (2, 1, 0, -1, -3_359.0),
    (2, -1, -1, 1, 2_463.0),
    (2, -1, 0, 1, 2_211.0),
    (2, -1, -1, -1, 2_065.0),
    (0, 1, -1, -1, -1_870.0),
    (4, 0, -1, -1, 1_828.0),
    (0, 1, 0, 1, -1_794.0),
];

/// General precession in longitude, degrees per Julian century
const PRECESSION_RATE_DEG: f64 = 1.396_971;

/// Geocentric ecliptic longitude, latitude (degrees, mean equinox of date)
/// and distance (km)
pub fn of_date(jde: f64) -> (f64, f64, f64) {
    let t = (jde - J2000) / JULIAN_CENTURY;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let lp = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2 + t3 / 538_841.0
        - t4 / 65_194_000.0;
    let d = 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let m = 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0;
    let mp = 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;
    let f = 93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0;
    let a1 = 119.75 + 131.849 * t;
    let a2 = 53.09 + 479_264.290 * t;
    let a3 = 313.45 + 481_266.484 * t;
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t2;

    let (lp, d, m, mp, f) = (
        lp * DEG2RAD,
        d * DEG2RAD,
        m * DEG2RAD,
        mp * DEG2RAD,
        f * DEG2RAD,
    );
    let (a1, a2, a3) = (a1 * DEG2RAD, a2 * DEG2RAD, a3 * DEG2RAD);

    let argument = |cd: i8, cm: i8, cmp: i8, cf: i8| {
        let angle = cd as f64 * d + cm as f64 * m + cmp as f64 * mp + cf as f64 * f;
        let eccentricity = e.powi(cm.unsigned_abs() as i32);
        (angle, eccentricity)
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(cd, cm, cmp, cf, l, r) in LONGITUDE_DISTANCE_TERMS.iter() {
        let (angle, k) = argument(cd, cm, cmp, cf);
        sum_l += k * l * angle.sin();
        sum_r += k * r * angle.cos();
    }
    let mut sum_b = 0.0;
    for &(cd, cm, cmp, cf, b) in LATITUDE_TERMS.iter() {
        let (angle, k) = argument(cd, cm, cmp, cf);
        sum_b += k * b * angle.sin();
    }

    sum_l += 3958.0 * a1.sin() + 1962.0 * (lp - f).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * lp.sin() + 382.0 * a3.sin() + 175.0 * (a1 - f).sin()
        + 175.0 * (a1 + f).sin()
        + 127.0 * (lp - mp).sin()
        - 115.0 * (lp + mp).sin();

    let lon = (lp.to_degrees() + sum_l / 1e6).rem_euclid(360.0);
    let lat = sum_b / 1e6;
    let dist = 385_000.56 + sum_r / 1000.0;
    (lon, lat, dist)
}

/// Geocentric position in the J2000 ecliptic frame, AU
pub fn geocentric_position(jde: f64) -> Vector3<f64> {
    let (lon, lat, dist) = of_date(jde);
    let t = (jde - J2000) / JULIAN_CENTURY;
    let lon = (lon - PRECESSION_RATE_DEG * t) * DEG2RAD;
    let lat = lat * DEG2RAD;
    let r = dist / AU_KM;
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_meeus_example_47a() {
        // 1992 April 12, 0h TD
        let (lon, lat, dist) = of_date(2_448_724.5);
        assert_relative_eq!(lon, 133.162_655, epsilon = 0.05);
        assert_relative_eq!(lat, -3.229_126, epsilon = 0.02);
        assert_relative_eq!(dist, 368_409.7, epsilon = 50.0);
    }

    #[test]
    fn test_distance_bounds() {
        for k in 0..200 {
            let p = geocentric_position(J2000 + k as f64 * 1.37);
            let km = p.norm() * AU_KM;
            assert!(km > 355_000.0 && km < 407_500.0, "distance {km}");
            // Lunar orbit is inclined about 5.1 degrees to the ecliptic
            assert!((p.z / p.norm()).asin().to_degrees().abs() < 5.4);
        }
    }

    #[test]
    fn test_precession_reduction() {
        let jde = J2000 + 3652.5;
        let (lon_date, _, _) = of_date(jde);
        let p = geocentric_position(jde);
        let lon_j2000 = p.y.atan2(p.x).to_degrees().rem_euclid(360.0);
        let diff = (lon_date - lon_j2000 + 540.0).rem_euclid(360.0) - 180.0;
        assert_relative_eq!(diff, 0.1396971, epsilon = 1e-9);
    }
}
