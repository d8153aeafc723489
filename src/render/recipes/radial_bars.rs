use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::{band_at, bar_count};
use crate::render::canvas::{CanvasSize, PixelBuffer};
use crate::render::recipe::RecipeParams;

/// Bars radiating outward from a ring around the canvas center.
pub fn render(
    params: &RecipeParams,
    bands: &[f32],
    size: CanvasSize,
    rng: &mut impl Rng,
) -> PixelBuffer {
    let mut canvas = PixelBuffer::filled(size, params.background_rgba());
    let (cx, cy) = size.center();
    let shorter = size.shorter_side();

    let inner = shorter * params.radius;
    let max_len = (shorter * 0.48 - inner).max(1.0);
    let count = bar_count(bands.len(), params.density);
    let step = TAU / count as f32;
    let thickness = (step * inner.max(shorter * 0.05) * params.thickness).max(1.0);

    for i in 0..count {
        let level = band_at(bands, i, count);
        let jitter = rng.gen_range(-1.0f32..=1.0) * params.jitter * step;
        let angle = i as f32 * step - FRAC_PI_2 + jitter;
        let len = (level * max_len).max(1.0);
        let (sin, cos) = angle.sin_cos();

        let t = i as f32 / count as f32;
        canvas.draw_line(
            cx + cos * inner,
            cy + sin * inner,
            cx + cos * (inner + len),
            cy + sin * (inner + len),
            thickness,
            params.palette.color(t, level),
        );
    }

    canvas
}
