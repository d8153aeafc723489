use super::{band_at, bar_count};
use crate::render::canvas::{CanvasSize, PixelBuffer};
use crate::render::recipe::RecipeParams;

/// Vertical bars mirrored about the horizontal center line.
pub fn render(params: &RecipeParams, bands: &[f32], size: CanvasSize) -> PixelBuffer {
    let mut canvas = PixelBuffer::filled(size, params.background_rgba());
    let count = bar_count(bands.len(), params.density);
    let slot = size.width as f32 / count as f32;
    let bar_width = (slot * params.thickness).max(1.0);
    let gap = (slot - bar_width) * 0.5;
    let mid_y = size.height as f32 * 0.5;
    let max_half = mid_y * 0.95;

    for i in 0..count {
        let level = band_at(bands, i, count);
        let half = (level * max_half).max(1.0);
        let x0 = i as f32 * slot + gap;
        let color = params.palette.color(i as f32 / count as f32, level);
        canvas.fill_rect(x0, mid_y - half, x0 + bar_width, mid_y + half, color);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_are_symmetric() {
        let size = CanvasSize::new(60, 40);
        let params = RecipeParams::default();
        let bands: Vec<f32> = (0..60).map(|i| (i % 7) as f32 / 6.0).collect();
        let buf = render(&params, &bands, size);
        for y in 0..20 {
            for x in 0..60 {
                assert_eq!(buf.pixel(x, y), buf.pixel(x, 39 - y), "({x},{y})");
            }
        }
    }
}
