//! Time module for astronomical time calculations
//!
//! The ephemeris core works with two flavours of Julian date side by side:
//! civil time (JD, on the UT scale) for Earth-based observational angles, and
//! ephemeris time (JDE, on the TT scale) for orbital dynamics. A [`Time`]
//! always carries both; nothing in the core derives one from the other on its
//! own. [`Timescale`] is where the conversion happens, using a ΔT model.

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Error type for time operations
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Time out of range: {0}")]
    OutOfRange(String),

    #[error("Calendar error: {0}")]
    CalendarError(String),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// Which of the two time flavours a computation runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFlavor {
    /// Civil time, JD(UT)
    Civil,
    /// Ephemeris time, JDE(TT)
    #[default]
    Ephemeris,
}

/// Calendar tuple for representing a date and time
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarTuple {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

/// Converts between the civil and ephemeris flavours of time
#[derive(Debug, Clone, Default)]
pub struct Timescale {
    /// Optional ΔT table: (JDE values, ΔT seconds), sorted by JDE
    delta_t_table: Option<(Vec<f64>, Vec<f64>)>,
}

impl Timescale {
    /// Create a timescale backed by a tabulated ΔT
    pub fn with_delta_t_table(jde: Vec<f64>, delta_t: Vec<f64>) -> Result<Self> {
        if jde.is_empty() || jde.len() != delta_t.len() {
            return Err(TimeError::InvalidFormat(format!(
                "delta T table needs matching non-empty columns (got {} and {})",
                jde.len(),
                delta_t.len()
            )));
        }
        if jde.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TimeError::InvalidFormat(
                "delta T table must be strictly increasing in JDE".into(),
            ));
        }
        Ok(Self {
            delta_t_table: Some((jde, delta_t)),
        })
    }

    /// Time from a civil Julian date, JDE derived through ΔT
    pub fn ut_jd(&self, jd: f64) -> Time {
        // ΔT is a slow function, so one refinement step is plenty
        let first = self.delta_t(jd);
        let delta_t = self.delta_t(jd + first / DAY_S);
        Time {
            jd,
            jde: jd + delta_t / DAY_S,
        }
    }

    /// Time from an ephemeris Julian date, JD derived through ΔT
    pub fn tt_jd(&self, jde: f64) -> Time {
        let delta_t = self.delta_t(jde);
        Time {
            jd: jde - delta_t / DAY_S,
            jde,
        }
    }

    /// Time from a UTC datetime (UTC is treated as UT)
    pub fn from_datetime(&self, dt: DateTime<Utc>) -> Time {
        let second = dt.second() as f64 + dt.nanosecond() as f64 / 1_000_000_000.0;
        let jd = self.calendar_to_jd(&CalendarTuple {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second,
        });
        self.ut_jd(jd)
    }

    /// Time from a UT calendar date and time
    pub fn utc(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Time> {
        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(TimeError::CalendarError(format!(
                "no such date {year:04}-{month:02}-{day:02}"
            )));
        }
        if hour > 23 || minute > 59 || !(0.0..61.0).contains(&second) {
            return Err(TimeError::OutOfRange(format!(
                "time of day {hour:02}:{minute:02}:{second}"
            )));
        }
        let jd = self.calendar_to_jd(&CalendarTuple {
            year,
            month,
            day,
            hour,
            minute,
            second,
        });
        Ok(self.ut_jd(jd))
    }

    /// Calculate delta_t (TT - UT1) in seconds
    pub fn delta_t(&self, jde: f64) -> f64 {
        if let Some((table_jde, table_delta_t)) = &self.delta_t_table {
            Self::interpolate(jde, table_jde, table_delta_t)
        } else {
            let year = (jde - 1_721_045.0) / 365.25;
            delta_t_approx(year)
        }
    }

    /// Linear interpolation, clamped to the table ends
    fn interpolate(x: f64, x_values: &[f64], y_values: &[f64]) -> f64 {
        match x_values.binary_search_by(|val| val.total_cmp(&x)) {
            Ok(i) => y_values[i],
            Err(0) => y_values[0],
            Err(i) if i >= x_values.len() => y_values[y_values.len() - 1],
            Err(i) => {
                let (x0, x1) = (x_values[i - 1], x_values[i]);
                let (y0, y1) = (y_values[i - 1], y_values[i]);
                y0 + (x - x0) / (x1 - x0) * (y1 - y0)
            }
        }
    }

    /// Convert a calendar date (Gregorian) to a Julian date
    pub fn calendar_to_jd(&self, cal: &CalendarTuple) -> f64 {
        let jdn = julian_day(cal.year, cal.month, cal.day);
        let day_fraction =
            (cal.hour as f64 + cal.minute as f64 / 60.0 + cal.second / 3600.0) / 24.0;
        // The day number refers to noon
        jdn as f64 - 0.5 + day_fraction
    }

    /// Convert a Julian date to a Gregorian calendar tuple
    pub fn jd_to_calendar(&self, jd: f64) -> CalendarTuple {
        let jd_plus_half = jd + 0.5;
        let z = jd_plus_half.floor();
        let f = jd_plus_half - z;

        let (year, month, day) = julian_day_to_calendar_date(z as i32);

        let seconds_in_day = f * DAY_S;
        let hour = (seconds_in_day / 3600.0).floor() as u32;
        let minute = ((seconds_in_day - hour as f64 * 3600.0) / 60.0).floor() as u32;
        let second = seconds_in_day - hour as f64 * 3600.0 - minute as f64 * 60.0;

        CalendarTuple {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }
}

/// Julian day number of a Gregorian calendar date.
///
/// This follows the algorithm in the Explanatory Supplement to the
/// Astronomical Almanac 15.11.
fn julian_day(year: i32, month: u32, day: u32) -> i32 {
    let janfeb = month <= 2;
    let g = year + 4716 - if janfeb { 1 } else { 0 };
    let f = (month + 9) % 12;
    let e = 1461 * g / 4 + day as i32 - 1402;
    let j = e + (153 * f as i32 + 2) / 5;
    j + 38 - (g + 184) / 100 * 3 / 4
}

/// Gregorian calendar date of a Julian day number (Explanatory Supplement 15.11)
fn julian_day_to_calendar_date(jd: i32) -> (i32, u32, u32) {
    let f = jd + 1401 + (4 * jd + 274277) / 146097 * 3 / 4 - 38;
    let e = 4 * f + 3;
    let g = (e % 1461) / 4;
    let h = 5 * g + 2;

    let day = (h % 153) / 5 + 1;
    let month = ((h / 153) + 2) % 12 + 1;
    let year = e / 1461 - 4716 + (12 + 2 - month) / 12;

    (year, month as u32, day as u32)
}

/// Espenak & Meeus polynomial approximation of ΔT in seconds for a given year
fn delta_t_approx(year: f64) -> f64 {
    if year < -500.0 {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    } else if year < 500.0 {
        let t = year / 100.0;
        10583.6 - 1014.41 * t + 33.78311 * t * t - 5.952053 * t.powi(3) - 0.1798452 * t.powi(4)
            + 0.022174192 * t.powi(5)
            + 0.0090316521 * t.powi(6)
    } else if year < 1600.0 {
        let t = (year - 1000.0) / 100.0;
        1574.2 - 556.01 * t + 71.23472 * t * t + 0.319781 * t.powi(3)
            - 0.8503463 * t.powi(4)
            - 0.005050998 * t.powi(5)
            + 0.0083572073 * t.powi(6)
    } else if year < 1700.0 {
        let t = year - 1600.0;
        120.0 - 0.9808 * t - 0.01532 * t * t + t.powi(3) / 7129.0
    } else if year < 1800.0 {
        let t = year - 1700.0;
        8.83 + 0.1603 * t - 0.0059285 * t * t + 0.00013336 * t.powi(3) - t.powi(4) / 1174000.0
    } else if year < 1860.0 {
        let t = year - 1800.0;
        13.72 - 0.332447 * t + 0.0068612 * t * t + 0.0041116 * t.powi(3)
            - 0.00037436 * t.powi(4)
            + 0.0000121272 * t.powi(5)
            - 0.0000001699 * t.powi(6)
            + 0.000000000875 * t.powi(7)
    } else if year < 1900.0 {
        let t = year - 1860.0;
        7.62 + 0.5737 * t - 0.251754 * t * t + 0.01680668 * t.powi(3) - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233174.0
    } else if year < 1920.0 {
        let t = year - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t * t + 0.0061966 * t.powi(3) - 0.000197 * t.powi(4)
    } else if year < 1941.0 {
        let t = year - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t * t + 0.0020936 * t.powi(3)
    } else if year < 1961.0 {
        let t = year - 1950.0;
        29.07 + 0.407 * t - t * t / 233.0 + t.powi(3) / 2547.0
    } else if year < 1986.0 {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t * t / 260.0 - t.powi(3) / 718.0
    } else if year < 2005.0 {
        let t = year - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t * t
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if year < 2050.0 {
        let t = year - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t * t
    } else if year < 2150.0 {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - year)
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    }
}

/// An instant, carried in both civil (JD) and ephemeris (JDE) flavours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Time {
    /// Julian date on the UT scale
    jd: f64,
    /// Julian ephemeris date on the TT scale
    jde: f64,
}

impl Time {
    /// Build a time from both flavours supplied by the caller
    pub fn from_jd_pair(jd: f64, jde: f64) -> Self {
        Self { jd, jde }
    }

    /// J2000.0 on the ephemeris scale, with the civil flavour from the default ΔT model
    pub fn j2000() -> Self {
        Timescale::default().tt_jd(J2000)
    }

    /// Civil Julian date, JD(UT)
    pub fn jd(&self) -> f64 {
        self.jd
    }

    /// Ephemeris Julian date, JDE(TT)
    pub fn jde(&self) -> f64 {
        self.jde
    }

    /// Julian date in the requested flavour
    pub fn get(&self, flavor: TimeFlavor) -> f64 {
        match flavor {
            TimeFlavor::Civil => self.jd,
            TimeFlavor::Ephemeris => self.jde,
        }
    }

    /// ΔT = TT - UT in seconds
    pub fn delta_t(&self) -> f64 {
        (self.jde - self.jd) * DAY_S
    }

    /// TT days elapsed since J2000.0
    pub fn days_since_j2000(&self) -> f64 {
        self.jde - J2000
    }

    /// TT Julian centuries elapsed since J2000.0
    pub fn julian_centuries(&self) -> f64 {
        self.days_since_j2000() / JULIAN_CENTURY
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JD {:.6} UT / JDE {:.6} TT", self.jd, self.jde)
    }
}

impl Add<f64> for Time {
    type Output = Time;

    /// Shift both flavours by a number of days
    fn add(self, days: f64) -> Self::Output {
        Time {
            jd: self.jd + days,
            jde: self.jde + days,
        }
    }
}

impl Sub<f64> for Time {
    type Output = Time;

    fn sub(self, days: f64) -> Self::Output {
        Time {
            jd: self.jd - days,
            jde: self.jde - days,
        }
    }
}

impl Sub<Time> for Time {
    type Output = f64;

    /// Difference in ephemeris days
    fn sub(self, other: Time) -> Self::Output {
        self.jde - other.jde
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Timescale::default().from_datetime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn test_julian_date_of_j2000_noon() {
        let ts = Timescale::default();
        let t = ts.utc(2000, 1, 1, 12, 0, 0.0).unwrap();
        assert_relative_eq!(t.jd(), J2000, epsilon = 1e-9);
    }

    #[test]
    fn test_calendar_round_trip() {
        let ts = Timescale::default();
        let cal = ts.jd_to_calendar(2_455_000.25);
        assert_eq!((cal.year, cal.month, cal.day, cal.hour), (2009, 6, 18, 18));
        assert_relative_eq!(ts.calendar_to_jd(&cal), 2_455_000.25, epsilon = 1e-9);
    }

    #[test]
    fn test_flavours_are_kept_apart() {
        let ts = Timescale::default();
        let t = ts.ut_jd(J2000);
        assert_relative_eq!(t.jd(), J2000, epsilon = 1e-12);
        assert!(t.jde() > t.jd());
        assert_relative_eq!(t.delta_t(), 63.8, epsilon = 0.5);
        assert_eq!(t.get(TimeFlavor::Civil), t.jd());
        assert_eq!(t.get(TimeFlavor::Ephemeris), t.jde());
    }

    #[test]
    fn test_explicit_pair_is_not_reinterpreted() {
        let t = Time::from_jd_pair(2_451_000.0, 2_451_000.5);
        assert_eq!(t.jd(), 2_451_000.0);
        assert_eq!(t.jde(), 2_451_000.5);
    }

    #[test]
    fn test_tt_to_ut_inverts_ut_to_tt() {
        let ts = Timescale::default();
        let t = ts.ut_jd(2_460_000.0);
        let back = ts.tt_jd(t.jde());
        assert_relative_eq!(back.jd(), t.jd(), epsilon = 1e-7);
    }

    #[test]
    fn test_delta_t_table_interpolation() {
        let ts = Timescale::with_delta_t_table(vec![0.0, 10.0], vec![50.0, 70.0]).unwrap();
        assert_relative_eq!(ts.delta_t(5.0), 60.0, epsilon = 1e-12);
        assert_relative_eq!(ts.delta_t(-3.0), 50.0, epsilon = 1e-12);
        assert_relative_eq!(ts.delta_t(30.0), 70.0, epsilon = 1e-12);
        assert!(Timescale::with_delta_t_table(vec![1.0, 1.0], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_delta_t_approximation() {
        assert_relative_eq!(delta_t_approx(2000.0), 63.86, epsilon = 0.1);
        assert!(delta_t_approx(1970.0) > 0.0);
        assert!(delta_t_approx(1800.0) > 0.0);
    }

    #[test]
    fn test_time_math() {
        let t1 = Time::from_jd_pair(J2000, J2000 + 0.001);
        let t2 = t1 + 1.0;
        assert_relative_eq!(t2.jd(), J2000 + 1.0, epsilon = 1e-10);
        assert_relative_eq!(t2 - t1, 1.0, epsilon = 1e-10);
        assert_relative_eq!((t2 - 2.0).jde(), J2000 - 0.999, epsilon = 1e-10);
    }

    #[test]
    fn test_from_datetime() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
        let time: Time = dt.into();
        assert_relative_eq!(time.jd(), 2_458_850.0, epsilon = 1e-6);
        let expected_delta_t = 62.92 + 0.32 * (2020.0 - 2000.0);
        assert_relative_eq!(time.delta_t(), expected_delta_t, epsilon = 3.0);
    }

    #[test]
    fn test_invalid_calendar_rejected() {
        let ts = Timescale::default();
        assert!(ts.utc(2020, 13, 1, 0, 0, 0.0).is_err());
        assert!(ts.utc(2020, 1, 1, 24, 0, 0.0).is_err());
    }

    #[rstest]
    #[case(2023, 2, 29)]
    #[case(2024, 2, 30)]
    #[case(1900, 2, 29)]
    #[case(2024, 4, 31)]
    #[case(2024, 1, 0)]
    fn test_nonexistent_day_rejected(#[case] year: i32, #[case] month: u32, #[case] day: u32) {
        let result = Timescale::default().utc(year, month, day, 12, 0, 0.0);
        assert!(matches!(result, Err(TimeError::CalendarError(_))));
    }

    #[test]
    fn test_leap_day_accepted() {
        let ts = Timescale::default();
        let leap = ts.utc(2024, 2, 29, 0, 0, 0.0).unwrap();
        let march = ts.utc(2024, 3, 1, 0, 0, 0.0).unwrap();
        assert_relative_eq!(march.jd() - leap.jd(), 1.0, epsilon = 1e-9);
        assert!(ts.utc(2000, 2, 29, 0, 0, 0.0).is_ok());
    }
}
