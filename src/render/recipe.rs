use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::canvas::{CanvasSize, PixelBuffer, Rgba};
use super::palette::{parse_hex_rgb, Palette};
use super::recipes::{layered_rings, mirror_bars, particle_field, radial_bars, waterfall};
use super::state::RenderState;

/// Whether a recipe reads/mutates [`RenderState`] between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Pure function of the band vector and canvas size; frames may render in
    /// any order.
    Stateless,
    /// Keeps per-recipe state; frames must render in increasing order.
    Stateful,
}

/// Contract every visual recipe satisfies.
pub trait RecipeRenderer: Sync {
    fn id(&self) -> &str;

    fn capability(&self) -> Capability;

    /// Render one frame. Called exactly once per output frame, in order.
    fn render(&self, bands: &[f32], state: &mut RenderState, size: CanvasSize) -> PixelBuffer;

    /// Render without touching [`RenderState`]. Stateless recipes return
    /// `Some` and must produce the same pixels as [`RecipeRenderer::render`]
    /// given the same frame seed.
    fn render_stateless(
        &self,
        _bands: &[f32],
        _size: CanvasSize,
        _frame_seed: u64,
    ) -> Option<PixelBuffer> {
        None
    }
}

/// The rendering strategies every preset is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    RadialBars,
    MirrorBars,
    LayeredRings,
    ParticleField,
    Waterfall,
}

impl Template {
    pub fn capability(self) -> Capability {
        match self {
            Template::RadialBars | Template::MirrorBars | Template::LayeredRings => {
                Capability::Stateless
            }
            Template::ParticleField | Template::Waterfall => Capability::Stateful,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Template::RadialBars => "radial-bars",
            Template::MirrorBars => "mirror-bars",
            Template::LayeredRings => "layered-rings",
            Template::ParticleField => "particle-field",
            Template::Waterfall => "waterfall",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "radial-bars" => Ok(Template::RadialBars),
            "mirror-bars" => Ok(Template::MirrorBars),
            "layered-rings" => Ok(Template::LayeredRings),
            "particle-field" => Ok(Template::ParticleField),
            "waterfall" => Ok(Template::Waterfall),
            other => Err(format!("unknown template '{other}'")),
        }
    }
}

/// Numeric knobs shared by all templates. Each template reads the ones that
/// apply to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeParams {
    pub palette: Palette,
    /// Share of bands drawn (bars) or spawn-rate multiplier (particles).
    pub density: f32,
    /// Inner radius as a fraction of the shorter canvas side.
    pub radius: f32,
    /// Random angular/positional offset, 0.0 = none.
    pub jitter: f32,
    /// Stroke width as a fraction of the per-band slot.
    pub thickness: f32,
    /// Per-frame fade/damping for trails and particles.
    pub decay: f32,
    /// Clear color; also the color keyed out when transparency is requested.
    pub background: [u8; 3],
}

impl Default for RecipeParams {
    fn default() -> Self {
        Self {
            palette: Palette::Spectrum,
            density: 1.0,
            radius: 0.2,
            jitter: 0.0,
            thickness: 0.6,
            decay: 0.9,
            background: [0, 0, 0],
        }
    }
}

impl RecipeParams {
    pub fn background_rgba(&self) -> Rgba {
        let [r, g, b] = self.background;
        [r, g, b, 255]
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let number = || {
            value
                .trim()
                .parse::<f32>()
                .map_err(|_| format!("'{key}' expects a number, got '{value}'"))
        };
        match key {
            "palette" => self.palette = value.parse()?,
            "density" => self.density = number()?.clamp(0.01, 4.0),
            "radius" => self.radius = number()?.clamp(0.0, 0.5),
            "jitter" => self.jitter = number()?.clamp(0.0, 1.0),
            "thickness" => self.thickness = number()?.clamp(0.05, 1.0),
            "decay" => self.decay = number()?.clamp(0.0, 0.999),
            "background" => {
                self.background =
                    parse_hex_rgb(value).ok_or_else(|| format!("bad color '{value}'"))?
            }
            other => return Err(format!("unknown parameter '{other}'")),
        }
        Ok(())
    }

    /// Apply `key=value` overrides, skipping (and logging) bad entries.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) {
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            if let Err(err) = self.set(key, &overrides[key]) {
                log::warn!("Ignoring parameter override: {}", err);
            }
        }
    }
}

/// A named preset: one template plus its knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct Recipe {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub template: Template,
    pub params: RecipeParams,
}

impl Recipe {
    pub fn new(id: impl Into<String>, template: Template, params: RecipeParams) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            description: String::new(),
            id,
            template,
            params,
        }
    }
}

impl RecipeRenderer for Recipe {
    fn id(&self) -> &str {
        &self.id
    }

    fn capability(&self) -> Capability {
        self.template.capability()
    }

    fn render(&self, bands: &[f32], state: &mut RenderState, size: CanvasSize) -> PixelBuffer {
        match self.template {
            Template::ParticleField => particle_field::render(self, bands, state, size),
            Template::Waterfall => waterfall::render(self, bands, state, size),
            Template::RadialBars | Template::MirrorBars | Template::LayeredRings => self
                .render_stateless(bands, size, state.frame_seed())
                .unwrap_or_else(|| PixelBuffer::filled(size, self.params.background_rgba())),
        }
    }

    fn render_stateless(
        &self,
        bands: &[f32],
        size: CanvasSize,
        frame_seed: u64,
    ) -> Option<PixelBuffer> {
        let mut rng = ChaCha8Rng::seed_from_u64(frame_seed);
        let canvas = match self.template {
            Template::RadialBars => radial_bars::render(&self.params, bands, size, &mut rng),
            Template::MirrorBars => mirror_bars::render(&self.params, bands, size),
            Template::LayeredRings => layered_rings::render(&self.params, bands, size, &mut rng),
            Template::ParticleField | Template::Waterfall => return None,
        };
        Some(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> Vec<f32> {
        (0..60).map(|i| i as f32 / 59.0).collect()
    }

    #[test]
    fn every_template_renders_canvas_size() {
        let size = CanvasSize::new(64, 48);
        for template in [
            Template::RadialBars,
            Template::MirrorBars,
            Template::LayeredRings,
            Template::ParticleField,
            Template::Waterfall,
        ] {
            let recipe = Recipe::new(template.name(), template, RecipeParams::default());
            let mut state = RenderState::new(1, 10);
            let frame = recipe.render(&bands(), &mut state, size);
            assert_eq!((frame.width, frame.height), (64, 48), "{template}");
            assert_eq!(frame.data.len(), frame.expected_len(), "{template}");
        }
    }

    #[test]
    fn stateless_render_matches_state_render() {
        let size = CanvasSize::new(80, 80);
        let mut params = RecipeParams::default();
        params.jitter = 0.5;
        let recipe = Recipe::new("jittery", Template::RadialBars, params);

        let mut state = RenderState::new(9, 10);
        state.advance();
        state.advance();
        let via_state = recipe.render(&bands(), &mut state, size);
        let direct = recipe
            .render_stateless(&bands(), size, state.frame_seed())
            .unwrap();
        assert_eq!(via_state, direct);
    }

    #[test]
    fn stateful_templates_refuse_stateless_render() {
        let recipe = Recipe::new("p", Template::ParticleField, RecipeParams::default());
        assert_eq!(recipe.capability(), Capability::Stateful);
        assert!(recipe
            .render_stateless(&bands(), CanvasSize::new(8, 8), 0)
            .is_none());
    }

    #[test]
    fn silent_bands_leave_mostly_background() {
        let size = CanvasSize::new(32, 32);
        let mut params = RecipeParams::default();
        params.background = [0, 255, 0];
        let recipe = Recipe::new("m", Template::MirrorBars, params);
        let frame = recipe.render_stateless(&[0.0; 60], size, 0).unwrap();
        let keyed = frame
            .data
            .chunks_exact(4)
            .filter(|px| px[..3] == [0, 255, 0])
            .count();
        assert!(keyed > 32 * 32 * 3 / 4);
    }

    #[test]
    fn template_names_round_trip() {
        assert_eq!("particle_field".parse::<Template>(), Ok(Template::ParticleField));
        assert_eq!(Template::LayeredRings.to_string(), "layered-rings");
        assert!("spiral".parse::<Template>().is_err());
    }

    #[test]
    fn param_overrides() {
        let mut params = RecipeParams::default();
        let overrides: HashMap<String, String> = [
            ("density", "0.5"),
            ("palette", "ice"),
            ("background", "#00ff00"),
            ("radius", "oops"),
            ("sparkle", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        params.apply_overrides(&overrides);

        assert_eq!(params.density, 0.5);
        assert_eq!(params.palette, Palette::Ice);
        assert_eq!(params.background, [0, 255, 0]);
        assert_eq!(params.radius, RecipeParams::default().radius);
    }
}
