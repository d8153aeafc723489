use rand::Rng;

use super::mean;
use crate::render::canvas::{CanvasSize, PixelBuffer};
use crate::render::recipe::RecipeParams;

/// Concentric rings, one per band group, each pulsing with its group's mean.
pub fn render(
    params: &RecipeParams,
    bands: &[f32],
    size: CanvasSize,
    rng: &mut impl Rng,
) -> PixelBuffer {
    let mut canvas = PixelBuffer::filled(size, params.background_rgba());
    let (cx, cy) = size.center();
    let shorter = size.shorter_side();

    let layers = ((4.0 * params.density).round() as usize).clamp(1, bands.len().max(1));
    let inner = shorter * params.radius;
    let outer = shorter * 0.48;
    let spacing = (outer - inner).max(1.0) / layers as f32;

    // Outermost first so inner rings stay on top.
    for layer in (0..layers).rev() {
        let start = layer * bands.len() / layers;
        let end = ((layer + 1) * bands.len() / layers).max(start);
        let level = mean(&bands[start..end]).clamp(0.0, 1.0);

        let base = inner + spacing * (layer as f32 + 0.5);
        let radius = base * (0.75 + 0.25 * level);
        let thickness = (spacing * params.thickness * (0.3 + 0.7 * level)).max(1.0);
        let wobble = shorter * 0.02 * params.jitter;
        let ox = rng.gen_range(-1.0f32..=1.0) * wobble;
        let oy = rng.gen_range(-1.0f32..=1.0) * wobble;

        let t = layer as f32 / layers as f32;
        canvas.stroke_circle(cx + ox, cy + oy, radius, thickness, params.palette.color(t, level));
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn same_seed_same_frame() {
        let size = CanvasSize::new(50, 50);
        let mut params = RecipeParams::default();
        params.jitter = 1.0;
        let bands = vec![0.6; 60];

        let a = render(&params, &bands, size, &mut ChaCha8Rng::seed_from_u64(3));
        let b = render(&params, &bands, size, &mut ChaCha8Rng::seed_from_u64(3));
        let c = render(&params, &bands, size, &mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn handles_fewer_bands_than_layers() {
        let size = CanvasSize::new(20, 20);
        let mut params = RecipeParams::default();
        params.density = 4.0;
        let buf = render(&params, &[1.0, 0.5], size, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(buf.data.len(), 20 * 20 * 4);
    }
}
