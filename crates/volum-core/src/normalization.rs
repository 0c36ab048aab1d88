//! Normalization formulas shared by the CPU glyph path and the glyph shader.
//!
//! The Rust functions and the [`WGSL`] source below are the only place these
//! formulas live. The CPU builder calls the functions, the shader generator
//! splices in the WGSL. Edit both together.

/// Maps `value` from `[min, max]` to `[0, 1]`.
///
/// An empty range (`max <= min`, e.g. all vector magnitudes equal) maps every
/// value to `0` instead of dividing by zero.
#[inline]
#[must_use]
pub fn normalize(value: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span > 0.0 {
        (value - min) / span
    } else {
        0.0
    }
}

/// Maps a normalized magnitude to a visual glyph length.
#[inline]
#[must_use]
pub fn remap_length(t: f32, min_length: f32, max_length: f32) -> f32 {
    min_length + t * (max_length - min_length)
}

/// Relative position of `coord` along a bounds axis, as `|coord - min| / (max - min)`.
///
/// A flat axis (`max == min`) yields `0`.
#[inline]
#[must_use]
pub fn axis_fraction(coord: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span == 0.0 {
        0.0
    } else {
        ((coord - min) / span).abs()
    }
}

/// WGSL versions of [`normalize`] and [`remap_length`].
pub const WGSL: &str = r"
fn volum_normalize(value: f32, lo: f32, hi: f32) -> f32 {
    let span = hi - lo;
    if (span > 0.0) {
        return (value - lo) / span;
    }
    return 0.0;
}

fn volum_remap_length(t: f32, min_length: f32, max_length: f32) -> f32 {
    return min_length + t * (max_length - min_length);
}
";
