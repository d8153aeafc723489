use crate::render::canvas::{CanvasSize, PixelBuffer};
use crate::render::recipe::Recipe;
use crate::render::state::RenderState;

/// The last N band vectors stacked as rows, newest at the bottom, older rows
/// fading by `decay` per step of age.
pub fn render(
    recipe: &Recipe,
    bands: &[f32],
    state: &mut RenderState,
    size: CanvasSize,
) -> PixelBuffer {
    let params = &recipe.params;
    let trail = state.trail(&recipe.id);
    trail.push(bands.to_vec());

    let mut canvas = PixelBuffer::filled(size, params.background_rgba());
    if trail.is_empty() {
        return canvas;
    }
    let depth = trail.depth();
    let row_height = size.height as f32 / depth as f32;
    let newest = trail.len() - 1;

    for (i, row) in trail.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let age = newest - i;
        let fade = params.decay.powi(age as i32);
        let y1 = size.height as f32 - age as f32 * row_height;
        let y0 = y1 - row_height;
        let cell = size.width as f32 / row.len() as f32;

        for (b, &level) in row.iter().enumerate() {
            let level = level.clamp(0.0, 1.0);
            let mut color = params.palette.color(b as f32 / row.len() as f32, level);
            color[3] = (255.0 * fade * level).round() as u8;
            let x0 = b as f32 * cell;
            canvas.fill_rect(x0, y0, x0 + cell, y1, color);
        }
    }

    canvas
}
