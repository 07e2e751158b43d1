// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time math for the Mandelbrot and Julia sets.
//!
//! A point is iterated under `z -> z^2 + c` until its modulus passes
//! the escape radius or the iteration cap runs out.  Points that never
//! escape are "interior" and come back as `None`; everything else comes
//! back as the iteration count refined by one of the smoothing modes.

use crate::errors::{AutomataError, Result};
use num::Complex;
use std::f64::consts::LN_2;
use std::fmt;
use std::str::FromStr;

/// Which recurrence to iterate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FractalKind {
    /// `c` is the point, `z` starts at zero.
    Mandelbrot,
    /// `c` is the seed, `z` starts at the point.
    Julia {
        /// The constant added on every iteration.
        seed: Complex<f64>,
    },
}

/// The seed used when a Julia set is asked for by name alone.
pub const DEFAULT_JULIA_SEED: Complex<f64> = Complex {
    re: -0.8,
    im: 0.156,
};

/// How the raw iteration count is refined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Smoothing {
    /// The integer iteration count.
    None,
    /// Blend by how far past the radius the last step landed.
    Linear,
    /// The normalized iteration count.  Uses a larger escape radius to
    /// cut down on banding.
    Logarithmic,
    /// A distance estimate to the set's boundary instead of a count.
    Distance,
}

impl Smoothing {
    /// Escape radius, squared.
    pub fn radius_sqr(self) -> f64 {
        match self {
            Smoothing::Logarithmic => 16.0,
            _ => 4.0,
        }
    }
}

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// The two halves of the `and` expression are false if the point is
/// guaranteed to be inside the Mandelbrot set: the first is the main
/// cardioid, the second the period-2 bulb.  It does *not* guarantee a
/// point is outside.
pub fn maybe_outside(point: Complex<f64>) -> bool {
    let y = point.im * point.im;
    let q = y + (point.re - D4) * (point.re - D4);
    q * (q + point.re - D4) > (y * D4) && (point.re + 1.0) * (point.re + 1.0) + y > D16
}

/// A fixed remap applied to an escape value before palette lookup.
/// Spreads the iteration bands out evenly across the ramp.
pub fn normalize_iteration(value: f64) -> f64 {
    let v = value.max(0.0);
    if v == 0.0 {
        return 0.0;
    }
    v * (v + 1.0).ln() / v.sqrt()
}

/// Everything that stays fixed across a tile, resolved once so the
/// per-pixel loop only iterates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Escaper {
    kind: FractalKind,
    smoothing: Smoothing,
    max_iter: u32,
    radius_sqr: f64,
}

impl Escaper {
    /// Constructor.
    pub fn new(kind: FractalKind, smoothing: Smoothing, max_iter: u32) -> Escaper {
        Escaper {
            kind,
            smoothing,
            max_iter,
            radius_sqr: smoothing.radius_sqr(),
        }
    }

    /// The smoothing mode this escaper refines with.
    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Iterates one point.  `None` means it never escaped.
    pub fn escape(&self, point: Complex<f64>) -> Option<f64> {
        let zero = Complex::new(0.0, 0.0);
        let one = Complex::new(1.0, 0.0);
        // (z0, c, dz0, the constant term of the derivative)
        let (mut z, c, mut dz, dc) = match self.kind {
            FractalKind::Mandelbrot => {
                if !maybe_outside(point) {
                    return None;
                }
                (zero, point, zero, one)
            }
            FractalKind::Julia { seed } => (point, seed, one, zero),
        };
        let track_derivative = self.smoothing == Smoothing::Distance;

        let mut before = z;
        let mut iteration = 0;
        while z.norm_sqr() < self.radius_sqr && iteration < self.max_iter {
            before = z;
            if track_derivative {
                dz = z * dz * 2.0 + dc;
            }
            z = z * z + c;
            iteration += 1;
        }
        if z.norm_sqr() < self.radius_sqr {
            return None;
        }
        Some(self.refine(iteration, z, before, dz))
    }

    fn refine(&self, iteration: u32, z: Complex<f64>, before: Complex<f64>, dz: Complex<f64>) -> f64 {
        let n = f64::from(iteration);
        match self.smoothing {
            Smoothing::None => n,
            Smoothing::Linear => {
                if iteration == 0 {
                    return 0.0;
                }
                let radius = self.radius_sqr.sqrt();
                let ratio = (z.norm() - radius) / (radius - before.norm());
                n + 1.0 / (ratio + 1.0)
            }
            Smoothing::Logarithmic => {
                let log_zn = z.norm().ln();
                n + 1.0 - (log_zn / LN_2).ln() / LN_2
            }
            Smoothing::Distance => {
                let modulus = z.norm();
                let derivative = dz.norm();
                if derivative == 0.0 {
                    return std::f64::INFINITY;
                }
                z.norm_sqr() * modulus.ln() / derivative
            }
        }
    }
}

/// Iterates a single point.  A convenience for debugging and tests;
/// tiles build one `Escaper` and reuse it.
pub fn escape_value(
    point: Complex<f64>,
    smoothing: Smoothing,
    max_iter: u32,
    kind: FractalKind,
) -> Option<f64> {
    Escaper::new(kind, smoothing, max_iter).escape(point)
}

impl FromStr for Smoothing {
    type Err = AutomataError;

    fn from_str(s: &str) -> Result<Smoothing> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Smoothing::None),
            "linear" => Ok(Smoothing::Linear),
            "logarithmic" | "log" => Ok(Smoothing::Logarithmic),
            "distance" => Ok(Smoothing::Distance),
            _ => Err(AutomataError::invalid(format!("unknown smoothing '{}'", s))),
        }
    }
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Smoothing::None => "none",
            Smoothing::Linear => "linear",
            Smoothing::Logarithmic => "logarithmic",
            Smoothing::Distance => "distance",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for FractalKind {
    type Err = AutomataError;

    fn from_str(s: &str) -> Result<FractalKind> {
        match s.to_lowercase().as_str() {
            "mandelbrot" => Ok(FractalKind::Mandelbrot),
            "julia" => Ok(FractalKind::Julia {
                seed: DEFAULT_JULIA_SEED,
            }),
            _ => Err(AutomataError::invalid(format!("unknown fractal '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [Smoothing; 4] = [
        Smoothing::None,
        Smoothing::Linear,
        Smoothing::Logarithmic,
        Smoothing::Distance,
    ];

    #[test]
    fn origin_is_always_interior() {
        for &mode in MODES.iter() {
            for &cap in &[1, 2, 50, 1000] {
                assert_eq!(
                    escape_value(Complex::new(0.0, 0.0), mode, cap, FractalKind::Mandelbrot),
                    None
                );
            }
        }
    }

    #[test]
    fn far_points_escape_at_once() {
        let far = Complex::new(2.0, 2.0);
        assert_eq!(
            escape_value(far, Smoothing::None, 1, FractalKind::Mandelbrot),
            Some(1.0)
        );
        for &mode in MODES.iter() {
            let v = escape_value(far, mode, 100, FractalKind::Mandelbrot);
            assert!(v.map_or(false, |v| v.is_finite()), "{}", mode);
        }
        let linear = escape_value(far, Smoothing::Linear, 100, FractalKind::Mandelbrot).unwrap();
        assert!(linear > 1.0 && linear <= 2.0);
    }

    #[test]
    fn bulbs_short_circuit() {
        assert!(!maybe_outside(Complex::new(-1.0, 0.0)));
        assert!(!maybe_outside(Complex::new(0.2, 0.1)));
        assert!(maybe_outside(Complex::new(0.5, 0.5)));
        assert_eq!(
            escape_value(Complex::new(-1.0, 0.0), Smoothing::None, 1_000_000, FractalKind::Mandelbrot),
            None
        );
    }

    #[test]
    fn the_cap_decides_slow_points() {
        let neck = Complex::new(-0.75, 0.05);
        assert_eq!(
            escape_value(neck, Smoothing::None, 5, FractalKind::Mandelbrot),
            None
        );
        assert!(escape_value(neck, Smoothing::None, 10_000, FractalKind::Mandelbrot).is_some());
    }

    #[test]
    fn distance_shrinks_near_the_boundary() {
        let near = escape_value(
            Complex::new(-0.75, 0.05),
            Smoothing::Distance,
            10_000,
            FractalKind::Mandelbrot,
        )
        .unwrap();
        let far = escape_value(
            Complex::new(2.0, 2.0),
            Smoothing::Distance,
            10_000,
            FractalKind::Mandelbrot,
        )
        .unwrap();
        assert!(near > 0.0 && near < far);
    }

    #[test]
    fn julia_with_zero_seed_is_the_unit_disk() {
        let kind = FractalKind::Julia {
            seed: Complex::new(0.0, 0.0),
        };
        assert_eq!(escape_value(Complex::new(0.5, 0.0), Smoothing::None, 100, kind), None);
        assert_eq!(
            escape_value(Complex::new(1.5, 0.0), Smoothing::None, 100, kind),
            Some(1.0)
        );
        assert!(escape_value(Complex::new(1.5, 0.0), Smoothing::Distance, 100, kind).is_some());
    }

    #[test]
    fn logarithmic_uses_the_wider_radius() {
        // |c|^2 = 8: past 4 but short of 16, so one more step is needed.
        let far = Complex::new(2.0, 2.0);
        let log = escape_value(far, Smoothing::Logarithmic, 1, FractalKind::Mandelbrot);
        assert_eq!(log, None);
        assert!(escape_value(far, Smoothing::Logarithmic, 2, FractalKind::Mandelbrot).is_some());
    }

    #[test]
    fn smoothing_values_at_a_far_point() {
        let far = Complex::new(2.0, 2.0);
        let value = |mode| escape_value(far, mode, 100, FractalKind::Mandelbrot).unwrap();
        // One step to |z| = sqrt(8) from z = 0.
        let linear = 1.0 + 1.0 / 2.0_f64.sqrt();
        assert!((value(Smoothing::Linear) - linear).abs() < 1e-12);
        // dz = 1 after the first step.
        let distance = 8.0 * 8.0_f64.sqrt().ln();
        assert!((value(Smoothing::Distance) - distance).abs() < 1e-12);
        // Two steps to z = 2 + 10i under the wider radius.
        let log = 3.0 - (104.0_f64.sqrt().ln() / LN_2).ln() / LN_2;
        assert!((value(Smoothing::Logarithmic) - log).abs() < 1e-12);
        assert!((value(Smoothing::Logarithmic) - 1.2557442240765397).abs() < 1e-12);
        assert_eq!(value(Smoothing::None), 1.0);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_iteration(0.0), 0.0);
        assert_eq!(normalize_iteration(-3.0), 0.0);
        assert!((normalize_iteration(1.0) - LN_2).abs() < 1e-12);
        assert!((normalize_iteration(4.0) - 4.0 * 5.0_f64.ln() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn names_parse() {
        assert_eq!("Distance".parse::<Smoothing>().unwrap(), Smoothing::Distance);
        assert_eq!("log".parse::<Smoothing>().unwrap(), Smoothing::Logarithmic);
        assert!("cubic".parse::<Smoothing>().is_err());
        assert_eq!("mandelbrot".parse::<FractalKind>().unwrap(), FractalKind::Mandelbrot);
        assert!("burning ship".parse::<FractalKind>().is_err());
    }
}
