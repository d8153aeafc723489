use indicatif::ProgressBar;
use std::path::Path;

use crate::audio::{analysis, decode};
use crate::config::Config;
use crate::encode::encoder::{EncodeOutcome, VideoEncoder};
use crate::encode::ffmpeg::Muxer;
use crate::encode::job::EncodingJob;
use crate::error::PipelineResult;
use crate::render::orchestrator;
use crate::render::recipe::Recipe;
use crate::render::state::RenderState;

/// Decode `input`, render it with `recipe` and mux the result into `output`.
pub fn run<M: Muxer>(
    input: &Path,
    output: &Path,
    recipe: &Recipe,
    config: &Config,
    muxer: M,
    progress: &ProgressBar,
) -> PipelineResult<EncodeOutcome> {
    log::info!("Decoding audio...");
    let signal = decode::load(input)?;

    let job = EncodingJob::new(
        output,
        input,
        config.render.transparent,
        config.encode_settings(recipe.params.background),
    )?;
    let mut encoder = VideoEncoder::open(job, muxer)?;
    if let Some(dir) = encoder.job().temp_dir() {
        log::debug!("Intermediate video in {}", dir.display());
    }

    log::info!("Analyzing audio...");
    let spectrogram = analysis::analyze(&signal, &config.analysis_settings());

    let mut state = RenderState::new(config.render.seed, config.render.history_depth);
    orchestrator::run(
        &spectrogram,
        signal.duration,
        &config.render_settings(),
        recipe,
        &mut state,
        &mut encoder,
        progress,
    )?;

    log::info!("Finishing encoding...");
    let outcome = encoder.finalize();
    log::debug!(
        "Encoder {:?} after {} frames",
        encoder.state(),
        encoder.frames_written()
    );
    outcome
}
