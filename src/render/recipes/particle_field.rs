use rand::Rng;
use std::f32::consts::TAU;

use super::mean;
use crate::render::canvas::{CanvasSize, PixelBuffer};
use crate::render::recipe::Recipe;
use crate::render::state::{Particle, RenderState};

/// Upper bound on live particles per recipe.
pub const MAX_PARTICLES: usize = 1500;
const SPAWN_PER_FRAME: f32 = 24.0;

/// Particles burst from the center with low-band energy, drift with damping,
/// and fade out over their lifetime. State persists in the recipe's slot.
pub fn render(
    recipe: &Recipe,
    bands: &[f32],
    state: &mut RenderState,
    size: CanvasSize,
) -> PixelBuffer {
    let params = &recipe.params;
    let scale = size.shorter_side() / 400.0;

    let mut particles = std::mem::take(state.particles(&recipe.id));
    step(&mut particles, params.decay);

    let low = &bands[..(bands.len() / 4).max(1).min(bands.len())];
    let energy = mean(low).clamp(0.0, 1.0);
    let wanted = (energy * SPAWN_PER_FRAME * params.density).round() as usize;
    let spawn = wanted.min(MAX_PARTICLES.saturating_sub(particles.len()));

    let (cx, cy) = size.center();
    let rng = state.rng();
    for _ in 0..spawn {
        let band = if bands.is_empty() {
            0.0
        } else {
            rng.gen_range(0..bands.len()) as f32 / bands.len() as f32
        };
        let angle = rng.gen_range(0.0..TAU);
        let speed = (1.0 + 6.0 * energy) * scale * rng.gen_range(0.5f32..1.5);
        let life = rng.gen_range(20..60);
        let spread = size.shorter_side() * params.radius * 0.25 * params.jitter;
        particles.push(Particle {
            x: cx + rng.gen_range(-1.0f32..=1.0) * spread,
            y: cy + rng.gen_range(-1.0f32..=1.0) * spread,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            life,
            max_life: life,
            size: rng.gen_range(1.5f32..4.0) * scale.max(0.25),
            band,
        });
    }

    let mut canvas = PixelBuffer::filled(size, params.background_rgba());
    for p in &particles {
        let fade = p.life as f32 / p.max_life.max(1) as f32;
        let mut color = params.palette.color(p.band, fade);
        color[3] = (255.0 * fade).round() as u8;
        canvas.fill_circle(p.x, p.y, p.size, color);
    }

    *state.particles(&recipe.id) = particles;
    canvas
}

/// Advance positions, damp velocities, and drop expired particles.
fn step(particles: &mut Vec<Particle>, decay: f32) {
    for p in particles.iter_mut() {
        p.x += p.vx;
        p.y += p.vy;
        p.vx *= decay;
        p.vy *= decay;
        p.life = p.life.saturating_sub(1);
    }
    particles.retain(|p| p.life > 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recipe::{RecipeParams, Template};

    fn recipe(density: f32) -> Recipe {
        let params = RecipeParams {
            density,
            ..RecipeParams::default()
        };
        Recipe::new("particles", Template::ParticleField, params)
    }

    #[test]
    fn loud_frames_spawn_particles() {
        let mut state = RenderState::new(1, 10);
        let size = CanvasSize::new(64, 64);
        render(&recipe(1.0), &[1.0; 60], &mut state, size);
        assert_eq!(state.particles("particles").len(), 24);
    }

    #[test]
    fn silence_lets_particles_die_out() {
        let mut state = RenderState::new(1, 10);
        let size = CanvasSize::new(64, 64);
        let r = recipe(1.0);
        render(&r, &[1.0; 60], &mut state, size);
        for _ in 0..60 {
            render(&r, &[0.0; 60], &mut state, size);
        }
        assert!(state.particles("particles").is_empty());
    }

    #[test]
    fn population_is_capped() {
        let mut state = RenderState::new(1, 10);
        let size = CanvasSize::new(32, 32);
        let r = recipe(4.0);
        for _ in 0..200 {
            render(&r, &[1.0; 60], &mut state, size);
            assert!(state.particles("particles").len() <= MAX_PARTICLES);
        }
    }

    #[test]
    fn same_seed_is_reproducible() {
        let size = CanvasSize::new(48, 48);
        let r = recipe(1.0);
        let run = || {
            let mut state = RenderState::new(77, 10);
            (0..5)
                .map(|i| render(&r, &[i as f32 / 4.0; 60], &mut state, size))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
