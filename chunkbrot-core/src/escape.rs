use crate::complex::Complex;
use crate::fractal::{FractalMode, FractalParams};

/// Count escape-time iterations of `z ↦ z² + c` for one point.
///
/// In [`FractalMode::Mandelbrot`] the pixel `point` is `c` and `other` (the
/// seed) is `z₀`; in [`FractalMode::Julia`] the roles are swapped. The loop
/// runs while `|z|² < escape_radius_sq` and fewer than `max_iterations`
/// steps have been taken. A return of `max_iterations` means the orbit never
/// escaped.
#[inline]
pub fn evaluate(
    point: Complex,
    other: Complex,
    mode: FractalMode,
    max_iterations: u32,
    escape_radius_sq: f64,
) -> u32 {
    let (c, z0) = match mode {
        FractalMode::Mandelbrot => (point, other),
        FractalMode::Julia => (other, point),
    };

    let (mut zr, mut zi) = (z0.re, z0.im);
    let mut n = 0;
    while n < max_iterations && zr * zr + zi * zi < escape_radius_sq {
        let next_re = zr * zr - zi * zi + c.re;
        zi = 2.0 * zr * zi + c.im;
        zr = next_re;
        n += 1;
    }
    n
}

/// [`evaluate`] with the cap and radius taken from `params`.
#[inline]
pub fn evaluate_with(
    point: Complex,
    other: Complex,
    mode: FractalMode,
    params: &FractalParams,
) -> u32 {
    evaluate(
        point,
        other,
        mode,
        params.max_iterations,
        params.escape_radius_sq,
    )
}
