//! The escape-time kernel.  Given a point `c`, iterate `z = z² + c`
//! from zero and count the steps until `|z|²` exceeds 4.  If the cap
//! is reached first, the point is presumed to be in the set.

use num::Complex;

/// Past this squared magnitude an orbit is guaranteed to diverge.
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

/// Returns the number of iterations it took `c` to escape, or
/// `max_iterations` if it never did.
///
/// The squares of both components are carried from one step to the
/// next rather than recomputed, so each step costs three
/// multiplications.  A squared magnitude of exactly 4 does not count
/// as escaped; the orbit is iterated once more.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iterations: usize) -> usize {
    let (mut zr, mut zi) = (0.0_f64, 0.0_f64);
    let (mut zr2, mut zi2) = (0.0_f64, 0.0_f64);
    let mut iterations = 0;
    while zr2 + zi2 <= ESCAPE_RADIUS_SQR && iterations < max_iterations {
        zi = 2.0 * zr * zi + c.im;
        zr = zr2 - zi2 + c.re;
        zr2 = zr * zr;
        zi2 = zi * zi;
        iterations += 1;
    }
    iterations
}
