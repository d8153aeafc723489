//! Bundled rendering templates. Every preset in the registry is one of these
//! drawn with different knobs.

pub mod layered_rings;
pub mod mirror_bars;
pub mod particle_field;
pub mod radial_bars;
pub mod waterfall;

/// How many bars to draw for `num_bands` at `density`.
pub(crate) fn bar_count(num_bands: usize, density: f32) -> usize {
    ((num_bands as f32 * density.min(1.0)).round() as usize).clamp(1, num_bands.max(1))
}

/// Band value for bar `i` of `count`, resampling when fewer bars than bands.
pub(crate) fn band_at(bands: &[f32], i: usize, count: usize) -> f32 {
    if bands.is_empty() {
        return 0.0;
    }
    let idx = (i * bands.len() / count.max(1)).min(bands.len() - 1);
    bands[idx].clamp(0.0, 1.0)
}

pub(crate) fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}
