use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

use super::history::History;
use crate::audio::bands::BandVector;

pub const DEFAULT_HISTORY_DEPTH: usize = 10;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Frames left to live.
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
    /// Band position the particle was emitted from (0.0-1.0), used for color.
    pub band: f32,
}

/// Continuity storage owned by one recipe.
#[derive(Clone, Debug)]
pub enum RecipeSlot {
    Particles(Vec<Particle>),
    Trail(History<BandVector>),
}

/// Per-run mutable context threaded through every rendered frame.
///
/// Only the smoother and the active recipe mutate it; a fresh value is built
/// for each run.
#[derive(Clone, Debug)]
pub struct RenderState {
    previous: Option<BandVector>,
    frame: u64,
    seed: u64,
    rng: ChaCha8Rng,
    history_depth: usize,
    slots: HashMap<String, RecipeSlot>,
}

impl RenderState {
    pub fn new(seed: u64, history_depth: usize) -> Self {
        Self {
            previous: None,
            frame: 0,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            history_depth: history_depth.max(1),
            slots: HashMap::new(),
        }
    }

    pub fn previous_bands(&self) -> Option<&[f32]> {
        self.previous.as_deref()
    }

    pub(crate) fn set_previous_bands(&mut self, bands: BandVector) {
        self.previous = Some(bands);
    }

    /// Number of frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn advance(&mut self) {
        self.frame += 1;
    }

    /// Sequential random source for stateful recipes.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Sub-seed for the current frame, see [`frame_seed`].
    pub fn frame_seed(&self) -> u64 {
        frame_seed(self.seed, self.frame)
    }

    /// Trail buffer owned by `recipe`, created on first use.
    pub fn trail(&mut self, recipe: &str) -> &mut History<BandVector> {
        let depth = self.history_depth;
        let slot = self
            .slots
            .entry(recipe.to_string())
            .or_insert_with(|| RecipeSlot::Trail(History::with_depth(depth)));
        if !matches!(slot, RecipeSlot::Trail(_)) {
            *slot = RecipeSlot::Trail(History::with_depth(depth));
        }
        match slot {
            RecipeSlot::Trail(history) => history,
            RecipeSlot::Particles(_) => unreachable!("slot was just replaced"),
        }
    }

    /// Particle list owned by `recipe`, created on first use.
    pub fn particles(&mut self, recipe: &str) -> &mut Vec<Particle> {
        let slot = self
            .slots
            .entry(recipe.to_string())
            .or_insert_with(|| RecipeSlot::Particles(Vec::new()));
        if !matches!(slot, RecipeSlot::Particles(_)) {
            *slot = RecipeSlot::Particles(Vec::new());
        }
        match slot {
            RecipeSlot::Particles(particles) => particles,
            RecipeSlot::Trail(_) => unreachable!("slot was just replaced"),
        }
    }
}

/// Derive an independent per-frame seed (splitmix64 finalizer), so stateless
/// frames render identically whether produced in order or on worker threads.
pub fn frame_seed(seed: u64, frame: u64) -> u64 {
    let mut z = seed.wrapping_add(frame.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
