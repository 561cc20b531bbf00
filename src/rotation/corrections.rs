//! Periodic corrections to pole and prime-meridian angles (WGCCRE 2009)
//!
//! The fundamental arguments are grouped into families that are refreshed
//! together. A [`CorrectionTable`] is only brought up to date when the caller
//! asks for it; rotation queries read whatever it currently holds.

use crate::constants::{DEG2RAD, J2000, JULIAN_CENTURY};
use log::debug;
use serde::{Deserialize, Serialize};

/// A group of fundamental arguments evaluated together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectionFamily {
    /// E1..E13, used by the Moon
    Earth,
    /// Ja..Je for the planet, J1..J8 for the Galilean moons
    Jupiter,
    /// S1..S6
    Saturn,
    /// U11..U16
    Uranus,
    /// N and N1..N7
    Neptune,
}

impl CorrectionFamily {
    pub const ALL: [CorrectionFamily; 5] = [
        CorrectionFamily::Earth,
        CorrectionFamily::Jupiter,
        CorrectionFamily::Saturn,
        CorrectionFamily::Uranus,
        CorrectionFamily::Neptune,
    ];

    fn index(self) -> usize {
        match self {
            CorrectionFamily::Earth => 0,
            CorrectionFamily::Jupiter => 1,
            CorrectionFamily::Saturn => 2,
            CorrectionFamily::Uranus => 3,
            CorrectionFamily::Neptune => 4,
        }
    }
}

/// Linear argument `a + b·x` in degrees
const fn arg(a: f64, b: f64) -> (f64, f64) {
    (a, b)
}

// Rates per day
const EARTH_ARGS: [(f64, f64); 13] = [
    arg(125.045, -0.0529921),
    arg(250.089, -0.1059842),
    arg(260.008, 13.0120009),
    arg(176.625, 13.3407154),
    arg(357.529, 0.9856003),
    arg(311.589, 26.4057084),
    arg(134.963, 13.0649930),
    arg(276.617, 0.3287146),
    arg(34.226, 1.7484877),
    arg(15.134, -0.1589763),
    arg(119.743, 0.0036096),
    arg(239.961, 0.1643573),
    arg(25.053, 12.9590088),
];

// Rates per Julian century from here on
const JUPITER_AXIS_ARGS: [(f64, f64); 5] = [
    arg(99.360714, 4850.4046),
    arg(175.895369, 1191.9605),
    arg(300.323162, 262.5475),
    arg(114.012305, 6070.2476),
    arg(49.511251, 64.3000),
];

const JUPITER_MOON_ARGS: [(f64, f64); 8] = [
    arg(73.32, 91472.9),
    arg(24.62, 45137.2),
    arg(283.90, 4850.7),
    arg(355.80, 1191.3),
    arg(119.90, 262.1),
    arg(229.80, 64.3),
    arg(352.25, 2382.6),
    arg(113.35, 6070.0),
];

const SATURN_ARGS: [(f64, f64); 6] = [
    arg(353.32, 75706.7),
    arg(28.72, 75706.7),
    arg(177.40, -36505.5),
    arg(300.00, -7225.9),
    arg(316.45, 506.2),
    arg(345.20, -1016.3),
];

const URANUS_ARGS: [(f64, f64); 6] = [
    arg(102.23, -2024.22),
    arg(316.41, 2863.96),
    arg(304.01, -51.94),
    arg(308.71, -93.17),
    arg(340.82, -75.32),
    arg(259.14, -504.81),
];

const NEPTUNE_ARG: (f64, f64) = arg(357.85, 52.316);

const NEPTUNE_MOON_ARGS: [(f64, f64); 7] = [
    arg(323.92, 62606.6),
    arg(220.51, 55064.2),
    arg(354.27, 46564.5),
    arg(75.31, 26109.4),
    arg(35.36, 14325.4),
    arg(142.61, 2824.6),
    arg(177.85, 52.316),
];

fn evaluate<const N: usize>(args: &[(f64, f64); N], x: f64) -> [f64; N] {
    let mut out = [0.0; N];
    for (slot, (a, b)) in out.iter_mut().zip(args.iter()) {
        *slot = ((a + b * x) % 360.0) * DEG2RAD;
    }
    out
}

/// Fundamental arguments (radians) with the JDE each family was computed for
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionTable {
    e: [f64; 13],
    ja: [f64; 5],
    j: [f64; 8],
    s: [f64; 6],
    u: [f64; 6],
    n: f64,
    nm: [f64; 7],
    valid: [Option<f64>; 5],
}

impl Default for CorrectionTable {
    fn default() -> Self {
        Self {
            e: [0.0; 13],
            ja: [0.0; 5],
            j: [0.0; 8],
            s: [0.0; 6],
            u: [0.0; 6],
            n: 0.0,
            nm: [0.0; 7],
            valid: [None; 5],
        }
    }
}

impl CorrectionTable {
    /// A table with every family evaluated at `jde`
    pub fn at(jde: f64) -> Self {
        let mut table = Self::default();
        table.update_all(jde);
        table
    }

    /// JDE the family was last computed for, if ever
    pub fn valid_jde(&self, family: CorrectionFamily) -> Option<f64> {
        self.valid[family.index()]
    }

    /// Recompute one family for `jde` unless it already holds that instant
    pub fn update(&mut self, jde: f64, family: CorrectionFamily) {
        if self.valid[family.index()] == Some(jde) {
            return;
        }
        let d = jde - J2000;
        let t = d / JULIAN_CENTURY;
        match family {
            CorrectionFamily::Earth => self.e = evaluate(&EARTH_ARGS, d),
            CorrectionFamily::Jupiter => {
                self.ja = evaluate(&JUPITER_AXIS_ARGS, t);
                self.j = evaluate(&JUPITER_MOON_ARGS, t);
            }
            CorrectionFamily::Saturn => self.s = evaluate(&SATURN_ARGS, t),
            CorrectionFamily::Uranus => self.u = evaluate(&URANUS_ARGS, t),
            CorrectionFamily::Neptune => {
                self.n = evaluate(&[NEPTUNE_ARG], t)[0];
                self.nm = evaluate(&NEPTUNE_MOON_ARGS, t);
            }
        }
        debug!("refreshed {:?} corrections for JDE {}", family, jde);
        self.valid[family.index()] = Some(jde);
    }

    /// Recompute every family for `jde`
    pub fn update_all(&mut self, jde: f64) {
        for family in CorrectionFamily::ALL {
            self.update(jde, family);
        }
    }
}

/// Which set of periodic terms a body's orientation receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisCorrection {
    #[default]
    None,
    Earth,
    Moon,
    Jupiter,
    Io,
    Europa,
    Ganymede,
    Callisto,
    Mimas,
    Tethys,
    Rhea,
    Miranda,
    Ariel,
    Umbriel,
    Titania,
    Oberon,
    Neptune,
    Proteus,
    Triton,
}

/// Σ c·sin(k·x) over (c, k) pairs
fn sin_sum(x: f64, terms: &[(f64, f64)]) -> f64 {
    terms.iter().map(|(c, k)| c * (k * x).sin()).sum()
}

/// Σ c·cos(k·x) over (c, k) pairs
fn cos_sum(x: f64, terms: &[(f64, f64)]) -> f64 {
    terms.iter().map(|(c, k)| c * (k * x).cos()).sum()
}

impl AxisCorrection {
    /// The argument family the terms are drawn from
    pub fn family(self) -> Option<CorrectionFamily> {
        use AxisCorrection::*;
        match self {
            None | Earth => Option::None,
            Moon => Some(CorrectionFamily::Earth),
            Jupiter | Io | Europa | Ganymede | Callisto => Some(CorrectionFamily::Jupiter),
            Mimas | Tethys | Rhea => Some(CorrectionFamily::Saturn),
            Miranda | Ariel | Umbriel | Titania | Oberon => Some(CorrectionFamily::Uranus),
            Neptune | Proteus | Triton => Some(CorrectionFamily::Neptune),
        }
    }

    /// Periodic offsets of the pole (ΔRA, ΔDec), degrees
    pub fn pole_offset(self, table: &CorrectionTable) -> (f64, f64) {
        use AxisCorrection::*;
        let e = &table.e;
        let ja = &table.ja;
        let j = &table.j;
        let s = &table.s;
        let u = &table.u;
        let n7 = table.nm[6];
        match self {
            None | Earth => (0.0, 0.0),
            Moon => (
                -3.8787 * e[0].sin() - 0.1204 * e[1].sin() + 0.0700 * e[2].sin()
                    - 0.0172 * e[3].sin()
                    + 0.0072 * e[5].sin()
                    - 0.0052 * e[9].sin()
                    + 0.0043 * e[12].sin(),
                1.5419 * e[0].cos() + 0.0239 * e[1].cos() - 0.0278 * e[2].cos()
                    + 0.0068 * e[3].cos()
                    - 0.0029 * e[5].cos()
                    + 0.0009 * e[6].cos()
                    + 0.0008 * e[9].cos()
                    - 0.0009 * e[12].cos(),
            ),
            Jupiter => (
                0.000117 * ja[0].sin()
                    + 0.000938 * ja[1].sin()
                    + 0.001432 * ja[2].sin()
                    + 0.000030 * ja[3].sin()
                    + 0.002150 * ja[4].sin(),
                0.000050 * ja[0].cos()
                    + 0.000404 * ja[1].cos()
                    + 0.000617 * ja[2].cos()
                    - 0.000013 * ja[3].cos()
                    + 0.000926 * ja[4].cos(),
            ),
            Io => (
                0.094 * j[2].sin() + 0.024 * j[3].sin(),
                0.040 * j[2].cos() + 0.011 * j[3].cos(),
            ),
            Europa => (
                1.086 * j[3].sin() + 0.060 * j[4].sin() + 0.015 * j[5].sin() + 0.009 * j[6].sin(),
                0.468 * j[3].cos() + 0.026 * j[4].cos() + 0.007 * j[5].cos() + 0.002 * j[6].cos(),
            ),
            Ganymede => (
                -0.037 * j[3].sin() + 0.431 * j[4].sin() + 0.091 * j[5].sin(),
                -0.016 * j[3].cos() + 0.186 * j[4].cos() + 0.039 * j[5].cos(),
            ),
            Callisto => (
                -0.068 * j[4].sin() + 0.590 * j[5].sin() + 0.010 * j[7].sin(),
                -0.029 * j[4].cos() + 0.254 * j[5].cos() - 0.004 * j[7].cos(),
            ),
            Mimas => (13.56 * s[2].sin(), -1.53 * s[2].cos()),
            Tethys => (9.66 * s[3].sin(), -1.09 * s[3].cos()),
            Rhea => (3.10 * s[5].sin(), -0.35 * s[5].cos()),
            Miranda => (
                sin_sum(u[0], &[(4.41, 1.0), (-0.04, 2.0)]),
                cos_sum(u[0], &[(4.25, 1.0), (0.02, 2.0)]),
            ),
            Ariel => (0.29 * u[2].sin(), 0.28 * u[2].cos()),
            Umbriel => (0.21 * u[3].sin(), 0.20 * u[3].cos()),
            Titania => (0.29 * u[4].sin(), 0.28 * u[4].cos()),
            Oberon => (0.16 * u[5].sin(), 0.16 * u[5].cos()),
            Neptune => (0.70 * table.n.sin(), -0.51 * table.n.cos()),
            Proteus => (
                0.70 * table.n.sin() - 0.05 * table.nm[5].sin(),
                -0.51 * table.n.cos() - 0.04 * table.nm[5].cos(),
            ),
            Triton => (
                sin_sum(
                    n7,
                    &[
                        (-32.35, 1.0),
                        (-6.28, 2.0),
                        (-2.08, 3.0),
                        (-0.74, 4.0),
                        (-0.28, 5.0),
                        (-0.11, 6.0),
                        (-0.07, 7.0),
                        (-0.02, 8.0),
                        (-0.01, 9.0),
                    ],
                ),
                cos_sum(
                    n7,
                    &[
                        (22.55, 1.0),
                        (2.10, 2.0),
                        (0.55, 3.0),
                        (0.16, 4.0),
                        (0.05, 5.0),
                        (0.02, 6.0),
                        (0.01, 7.0),
                    ],
                ),
            ),
        }
    }

    /// Periodic offset of the prime meridian, degrees.
    ///
    /// `d` is the number of days since the rotation epoch in the body's
    /// spin time flavour.
    pub fn meridian_offset(self, table: &CorrectionTable, d: f64) -> f64 {
        use AxisCorrection::*;
        let e = &table.e;
        let j = &table.j;
        let s = &table.s;
        let u = &table.u;
        match self {
            None | Jupiter => 0.0,
            Earth => {
                let t = d / JULIAN_CENTURY;
                0.000387933 * t * t - t * t * t / 38_710_000.0
            }
            Moon => {
                -1.4e-12 * d * d + 3.5610 * e[0].sin() + 0.1208 * e[1].sin()
                    - 0.0642 * e[2].sin()
                    + 0.0158 * e[3].sin()
                    + 0.0252 * e[4].sin()
                    - 0.0066 * e[5].sin()
                    - 0.0047 * e[6].sin()
                    - 0.0046 * e[7].sin()
                    + 0.0028 * e[8].sin()
                    + 0.0052 * e[9].sin()
                    + 0.0040 * e[10].sin()
                    + 0.0019 * e[11].sin()
                    - 0.0044 * e[12].sin()
            }
            Io => -0.085 * j[2].sin() - 0.022 * j[3].sin(),
            Europa => {
                -0.980 * j[3].sin() - 0.054 * j[4].sin() - 0.014 * j[5].sin() - 0.008 * j[6].sin()
            }
            Ganymede => 0.033 * j[3].sin() - 0.389 * j[4].sin() - 0.082 * j[5].sin(),
            Callisto => 0.061 * j[4].sin() - 0.533 * j[5].sin() - 0.009 * j[7].sin(),
            Mimas => -13.48 * s[2].sin() - 44.85 * s[4].sin(),
            Tethys => -9.60 * s[3].sin() + 2.23 * s[4].sin(),
            Rhea => -3.08 * s[5].sin(),
            Miranda => {
                sin_sum(u[1], &[(-1.27, 1.0), (0.15, 2.0)])
                    + sin_sum(u[0], &[(1.15, 1.0), (-0.09, 2.0)])
            }
            Ariel => 0.05 * u[1].sin() + 0.08 * u[2].sin(),
            Umbriel => -0.09 * u[1].sin() + 0.06 * u[3].sin(),
            Titania => 0.08 * u[4].sin(),
            Oberon => 0.04 * u[5].sin(),
            Neptune => -0.48 * table.n.sin(),
            Proteus => 0.48 * table.n.sin() - 0.04 * table.nm[5].sin(),
            Triton => sin_sum(
                table.nm[6],
                &[
                    (22.25, 1.0),
                    (6.73, 2.0),
                    (2.05, 3.0),
                    (0.74, 4.0),
                    (0.28, 5.0),
                    (0.11, 6.0),
                    (0.05, 7.0),
                    (0.02, 8.0),
                    (0.01, 9.0),
                ],
            ),
        }
    }
}
