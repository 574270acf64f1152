// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pluggable easing for [`InterpolationMode::Curve`] segments.
//!
//! Linear and step segments are evaluated by the track itself. Curve segments
//! are handed to an [`Interpolator`], so the easing model can be swapped
//! without touching track data.
//!
//! [`InterpolationMode::Curve`]: crate::keyframe::InterpolationMode::Curve

use crate::keyframe::{Interpolation, Keyframe};

/// Handle used when a keyframe carries none; lies on the diagonal, so the
/// resulting curve is linear.
const DEFAULT_HANDLE: [f32; 2] = [0.5, 0.5];

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const SOLVE_EPSILON: f32 = 1e-6;

/// Strategy computing the value of a curve segment
pub trait Interpolator {
    /// Value at `frac` (in `[0, 1]`) of the way from `from` to `to`
    fn interpolate(&self, frac: f32, from: &Keyframe, to: &Keyframe) -> f32;
}

impl<F> Interpolator for F
where
    F: Fn(f32, &Keyframe, &Keyframe) -> f32,
{
    fn interpolate(&self, frac: f32, from: &Keyframe, to: &Keyframe) -> f32 {
        self(frac, from, to)
    }
}

/// CSS-style cubic bezier easing defined by the segment's handles
///
/// The curve runs from `(0, 0)` to `(1, 1)` through `from.out_handle` and
/// `to.in_handle`. The x axis is time, the y axis is the blend factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicBezier;

impl CubicBezier {
    /// Blend factor for a time fraction, given the two inner control points
    pub fn ease(frac: f32, p1: [f32; 2], p2: [f32; 2]) -> f32 {
        let frac = frac.clamp(0.0, 1.0);
        // x must stay monotonic for the curve to be a function of time
        let x1 = p1[0].clamp(0.0, 1.0);
        let x2 = p2[0].clamp(0.0, 1.0);
        let s = Self::solve_for_x(frac, x1, x2);
        Interpolation::bezier(0.0, p1[1], p2[1], 1.0, s)
    }

    fn solve_for_x(x: f32, x1: f32, x2: f32) -> f32 {
        let mut s = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = Interpolation::bezier(0.0, x1, x2, 1.0, s) - x;
            if err.abs() < SOLVE_EPSILON {
                return s;
            }
            let slope = Interpolation::bezier_slope(0.0, x1, x2, 1.0, s);
            if slope.abs() < SOLVE_EPSILON {
                break;
            }
            s -= err / slope;
        }

        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        s = x;
        for _ in 0..BISECTION_ITERATIONS {
            let value = Interpolation::bezier(0.0, x1, x2, 1.0, s);
            if (value - x).abs() < SOLVE_EPSILON {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        s
    }
}

impl Interpolator for CubicBezier {
    fn interpolate(&self, frac: f32, from: &Keyframe, to: &Keyframe) -> f32 {
        let p1 = from.out_handle.unwrap_or(DEFAULT_HANDLE);
        let p2 = to.in_handle.unwrap_or(DEFAULT_HANDLE);
        Interpolation::lerp(from.value, to.value, Self::ease(frac, p1, p2))
    }
}

/// Smoothstep easing, ignoring handles
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothStep;

impl Interpolator for SmoothStep {
    fn interpolate(&self, frac: f32, from: &Keyframe, to: &Keyframe) -> f32 {
        Interpolation::lerp(from.value, to.value, Interpolation::smoothstep(frac))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Keyframe, Keyframe) {
        (Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 10.0))
    }

    #[test]
    fn test_bezier_without_handles_is_linear() {
        let (a, b) = pair();
        for frac in [0.0, 0.1, 0.25, 0.5, 0.9, 1.0] {
            let v = CubicBezier.interpolate(frac, &a, &b);
            assert!((v - frac * 10.0).abs() < 1e-3, "frac {frac} gave {v}");
        }
    }

    #[test]
    fn test_bezier_ease_in_starts_slow() {
        let (a, b) = pair();
        let a = a.with_handles([0.0, 0.0], [0.42, 0.0]);
        let b = b.with_handles([1.0, 1.0], [1.0, 1.0]);
        let early = CubicBezier.interpolate(0.2, &a, &b);
        assert!(early < 2.0);
        assert!(early > 0.0);
        assert!((CubicBezier.interpolate(1.0, &a, &b) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_bezier_ease_is_monotonic() {
        let mut last = 0.0;
        for i in 0..=100 {
            let y = CubicBezier::ease(i as f32 / 100.0, [0.25, 0.1], [0.25, 1.0]);
            assert!(y + 1e-4 >= last);
            last = y;
        }
    }

    #[test]
    fn test_smoothstep_midpoint() {
        let (a, b) = pair();
        assert!((SmoothStep.interpolate(0.5, &a, &b) - 5.0).abs() < 1e-6);
        assert!(SmoothStep.interpolate(0.1, &a, &b) < 1.0);
    }

    #[test]
    fn test_closure_interpolator() {
        let (a, b) = pair();
        let halfway = |_: f32, from: &Keyframe, to: &Keyframe| (from.value + to.value) / 2.0;
        assert_eq!(halfway.interpolate(0.9, &a, &b), 5.0);
    }
}
