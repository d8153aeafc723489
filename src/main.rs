mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod pipeline;
mod render;
mod templates;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use config::Config;
use encode::ffmpeg::{is_ffmpeg_on_path, FfmpegMuxer};
use render::recipe::RecipeRenderer;
use render::registry::RecipeRegistry;
use templates::loader;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::find_config(cli.config.as_deref()) {
        Some(path) => {
            let cfg = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };
    cfg.apply_cli(&cli);
    cfg.validate().context("Invalid configuration")?;

    let mut registry = RecipeRegistry::builtin();
    if let Some(dir) = cfg.render.recipes_dir.clone().or_else(loader::find_recipes_dir) {
        let loaded = registry
            .load_dir(&dir)
            .with_context(|| format!("Failed to load recipes from {}", dir.display()))?;
        log::info!("Loaded {} recipe(s) from {}", loaded, dir.display());
    }

    anyhow::ensure!(!registry.is_empty(), "No recipes available");

    // List recipes mode
    if cli.list_recipes {
        println!("Available recipes:");
        for (index, recipe) in registry.iter().enumerate() {
            println!(
                "  {:>2}  {:<20} {:<10} {}",
                index,
                recipe.id,
                format!("{:?}", recipe.capability()).to_lowercase(),
                recipe.description
            );
        }
        return Ok(());
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;

    let mut overrides = loader::parse_param_overrides(&cli.params);
    if let Some(ref background) = cfg.render.background {
        overrides
            .entry("background".to_string())
            .or_insert_with(|| background.clone());
    }
    let recipe = registry
        .resolve_with(&cfg.render.recipe, &overrides)
        .context("No recipes available")?;

    log::info!("audiogram - audio visualizer");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Recipe: {} ({})", recipe.display_name, recipe.template);
    log::info!(
        "Resolution: {}x{} @ {}fps, {} bands",
        cfg.output.width,
        cfg.output.height,
        cfg.output.fps,
        cfg.audio.bands
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    if !is_ffmpeg_on_path(&cfg.encode.ffmpeg) {
        log::warn!(
            "'{}' did not answer -version; encoding will fail if it cannot be started",
            cfg.encode.ffmpeg
        );
    }
    let muxer = FfmpegMuxer::new(&cfg.encode.ffmpeg, cfg.mux_timeout());
    let outcome = pipeline::run(input, &cli.output, &recipe, &cfg, muxer, &pb).map_err(|err| {
        let stage = err.stage();
        anyhow::Error::new(err).context(format!("{stage} stage failed"))
    })?;

    if cfg.render.transparent && !outcome.transparent {
        log::warn!("Transparency was not available for this output; wrote an opaque video");
    }
    log::info!("Done! Output: {}", outcome.output.display());
    Ok(())
}
