use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::analysis::{AnalysisSettings, DEFAULT_FFT_SIZE, DEFAULT_TOP_DB};
use crate::audio::bands::DEFAULT_NUM_BANDS;
use crate::cli::Cli;
use crate::encode::ffmpeg::{DEFAULT_FFMPEG, DEFAULT_MUX_TIMEOUT};
use crate::encode::job::EncodeSettings;
use crate::render::orchestrator::RenderSettings;
use crate::render::registry::DEFAULT_RECIPE;
use crate::render::state::{DEFAULT_HISTORY_DEPTH, DEFAULT_SEED};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub encode: EncodeConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    #[serde(default)]
    pub bitrate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_bands")]
    pub bands: usize,
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_top_db")]
    pub top_db: f32,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_recipe")]
    pub recipe: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    /// Hex color, overrides the recipe's own background.
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub recipes_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct EncodeConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_mux_timeout_secs")]
    pub mux_timeout_secs: u64,
    #[serde(default = "default_key_similarity")]
    pub key_similarity: f32,
    #[serde(default = "default_key_blend")]
    pub key_blend: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
            bitrate: None,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
            bands: default_bands(),
            fft_size: default_fft_size(),
            top_db: default_top_db(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            recipe: default_recipe(),
            seed: default_seed(),
            history_depth: default_history_depth(),
            background: None,
            transparent: false,
            parallel: true,
            recipes_dir: None,
        }
    }
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            mux_timeout_secs: default_mux_timeout_secs(),
            key_similarity: default_key_similarity(),
            key_blend: default_key_blend(),
        }
    }
}

fn default_width() -> u32 { 1920 }
fn default_height() -> u32 { 1080 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }
fn default_smoothing() -> f32 { 0.85 }
fn default_bands() -> usize { DEFAULT_NUM_BANDS }
fn default_fft_size() -> usize { DEFAULT_FFT_SIZE }
fn default_top_db() -> f32 { DEFAULT_TOP_DB }
fn default_recipe() -> String { DEFAULT_RECIPE.into() }
fn default_seed() -> u64 { DEFAULT_SEED }
fn default_history_depth() -> usize { DEFAULT_HISTORY_DEPTH }
fn default_true() -> bool { true }
fn default_ffmpeg() -> String { DEFAULT_FFMPEG.into() }
fn default_mux_timeout_secs() -> u64 { DEFAULT_MUX_TIMEOUT.as_secs() }
fn default_key_similarity() -> f32 { 0.1 }
fn default_key_blend() -> f32 { 0.05 }

/// Explicit path, else `audiogram.toml` in the working directory, else the
/// per-user config file.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("audiogram.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("audiogram").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("audiogram").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

pub fn parse_config(toml_str: &str) -> Result<Config> {
    Ok(toml::from_str(toml_str)?)
}

impl Config {
    /// Overlay every flag the user passed on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(width) = cli.width { self.output.width = width; }
        if let Some(height) = cli.height { self.output.height = height; }
        if let Some(fps) = cli.fps { self.output.fps = fps; }
        if let Some(crf) = cli.crf { self.output.crf = crf; }
        if let Some(ref codec) = cli.codec { self.output.codec = codec.clone(); }
        if let Some(ref pix_fmt) = cli.pix_fmt { self.output.pix_fmt = pix_fmt.clone(); }
        if cli.bitrate.is_some() { self.output.bitrate = cli.bitrate.clone(); }

        if let Some(smoothing) = cli.smoothing { self.audio.smoothing = smoothing; }
        if let Some(bands) = cli.bands { self.audio.bands = bands; }
        if let Some(fft_size) = cli.fft_size { self.audio.fft_size = fft_size; }
        if let Some(top_db) = cli.top_db { self.audio.top_db = top_db; }

        if let Some(ref recipe) = cli.recipe { self.render.recipe = recipe.clone(); }
        if let Some(seed) = cli.seed { self.render.seed = seed; }
        if let Some(depth) = cli.history_depth { self.render.history_depth = depth; }
        if cli.background.is_some() { self.render.background = cli.background.clone(); }
        if cli.transparent { self.render.transparent = true; }
        if let Some(parallel) = cli.parallel { self.render.parallel = parallel; }
        if cli.recipes_dir.is_some() { self.render.recipes_dir = cli.recipes_dir.clone(); }

        if let Some(ref ffmpeg) = cli.ffmpeg { self.encode.ffmpeg = ffmpeg.clone(); }
        if let Some(secs) = cli.mux_timeout { self.encode.mux_timeout_secs = secs; }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let out = &self.output;
        anyhow::ensure!(out.fps > 0, "fps must be greater than 0");
        anyhow::ensure!(
            out.width > 0 && out.height > 0,
            "resolution must be non-zero, got {}x{}",
            out.width,
            out.height
        );
        anyhow::ensure!(
            out.width % 2 == 0 && out.height % 2 == 0,
            "width and height must be even, got {}x{}",
            out.width,
            out.height
        );

        let audio = &self.audio;
        anyhow::ensure!(audio.bands >= 1, "bands must be at least 1");
        anyhow::ensure!(
            (0.0..1.0).contains(&audio.smoothing),
            "smoothing must be in [0, 1), got {}",
            audio.smoothing
        );
        anyhow::ensure!(
            audio.fft_size >= 256 && audio.fft_size.is_power_of_two(),
            "fft_size must be a power of two >= 256, got {}",
            audio.fft_size
        );
        anyhow::ensure!(audio.top_db > 0.0, "top_db must be positive");

        anyhow::ensure!(self.render.history_depth >= 1, "history_depth must be at least 1");
        anyhow::ensure!(self.encode.mux_timeout_secs > 0, "mux_timeout_secs must be positive");
        Ok(())
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            fps: self.output.fps,
            fft_size: self.audio.fft_size,
            top_db: self.audio.top_db,
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            fps: self.output.fps,
            width: self.output.width,
            height: self.output.height,
            num_bands: self.audio.bands,
            smoothing: self.audio.smoothing,
            parallel: self.render.parallel,
            ..RenderSettings::default()
        }
    }

    /// Encoder settings keying out `key_color`, the active recipe's
    /// background.
    pub fn encode_settings(&self, key_color: [u8; 3]) -> EncodeSettings {
        EncodeSettings {
            width: self.output.width,
            height: self.output.height,
            fps: self.output.fps,
            channels: 4,
            codec: self.output.codec.clone(),
            pix_fmt: self.output.pix_fmt.clone(),
            crf: self.output.crf,
            bitrate: self.output.bitrate.clone(),
            key_color,
            key_similarity: self.encode.key_similarity,
            key_blend: self.encode.key_blend,
        }
    }

    pub fn mux_timeout(&self) -> Duration {
        Duration::from_secs(self.encode.mux_timeout_secs)
    }
}
