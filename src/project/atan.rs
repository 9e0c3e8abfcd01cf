use std::f32::consts::{FRAC_PI_2, PI};

const A1: f32 = 0.999_977_26;
const A3: f32 = -0.332_623_47;
const A5: f32 = 0.193_543_46;
const A7: f32 = -0.116_432_87;
const A9: f32 = 0.052_653_32;
const A11: f32 = -0.011_721_2;

/// Degree-11 odd minimax approximation of `atan(x)` on `[-1, 1]`.
///
/// Absolute error stays below `2e-5` radians on that interval; outside it the
/// polynomial diverges and callers must reduce the argument first.
#[inline]
pub fn atan_approx(x: f32) -> f32 {
    let x_sq = x * x;
    let poly = x_sq.mul_add(A11, A9);
    let poly = x_sq.mul_add(poly, A7);
    let poly = x_sq.mul_add(poly, A5);
    let poly = x_sq.mul_add(poly, A3);
    let poly = x_sq.mul_add(poly, A1);
    x * poly
}

/// Approximate `y.atan2(x)` using [`atan_approx`].
///
/// The quotient is always taken as smaller over larger magnitude so the
/// polynomial only sees `[-1, 1]`. Returns `0` for the origin. On the y axis
/// the result is `±pi/2` by the sign of `y` alone, whatever the sign of a
/// zero `x`.
#[inline]
pub fn atan2_approx(y: f32, x: f32) -> f32 {
    if x == 0.0 {
        return if y == 0.0 { 0.0 } else { FRAC_PI_2.copysign(y) };
    }
    let swap = x.abs() < y.abs();
    let input = if swap { x / y } else { y / x };
    let mut res = atan_approx(input);
    if swap {
        res = FRAC_PI_2.copysign(input) - res;
    }
    if x < 0.0 {
        res += PI.copysign(y);
    }
    res
}

#[cfg(test)]
#[path = "../../tests/unit/project/atan.rs"]
mod tests;
