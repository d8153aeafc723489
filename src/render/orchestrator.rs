use indicatif::ProgressBar;
use rayon::prelude::*;

use super::canvas::{CanvasSize, PixelBuffer};
use super::recipe::{Capability, RecipeRenderer};
use super::state::RenderState;
use crate::audio::bands::{self, BandVector, DEFAULT_NUM_BANDS};
use crate::audio::features::Spectrogram;
use crate::audio::smoothing::smooth;
use crate::encode::encoder::FrameSink;
use crate::error::{PipelineError, PipelineResult};

const PROGRESS_EVERY: usize = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub num_bands: usize,
    pub smoothing: f32,
    /// Render stateless recipes on the rayon pool.
    pub parallel: bool,
    /// Frames rendered per parallel batch.
    pub chunk_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            width: 1920,
            height: 1080,
            num_bands: DEFAULT_NUM_BANDS,
            smoothing: 0.85,
            parallel: true,
            chunk_size: 64,
        }
    }
}

impl RenderSettings {
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

/// Frames needed to cover `duration` seconds at `fps`. Never zero.
pub fn output_frame_count(duration: f32, fps: u32) -> usize {
    ((duration as f64 * fps as f64).round() as usize).max(1)
}

/// Analysis frame shown at output frame `k`.
///
/// Endpoints are pinned: frame 0 reads analysis frame 0 and the last output
/// frame reads the last analysis frame. In between, frames are duplicated or
/// skipped as the rates require.
pub fn analysis_index(k: usize, num_analysis: usize, num_output: usize) -> usize {
    let last = num_analysis.saturating_sub(1);
    if num_output <= 1 {
        return last;
    }
    let index = (k as u64 * last as u64) / (num_output as u64 - 1);
    (index as usize).min(last)
}

/// Render every output frame of the run into `sink`, in order.
///
/// On error the sink is aborted before the error is returned. Returns the
/// number of frames written.
pub fn run<R, S>(
    spectrogram: &Spectrogram,
    duration: f32,
    settings: &RenderSettings,
    recipe: &R,
    state: &mut RenderState,
    sink: &mut S,
    progress: &ProgressBar,
) -> PipelineResult<usize>
where
    R: RecipeRenderer + ?Sized,
    S: FrameSink + ?Sized,
{
    let total = output_frame_count(duration, settings.fps);
    progress.set_length(total as u64);

    let parallel = settings.parallel && recipe.capability() == Capability::Stateless;
    log::info!(
        "Rendering {} frames with '{}' ({} analysis frames, {})",
        total,
        recipe.id(),
        spectrogram.len(),
        if parallel { "parallel" } else { "sequential" }
    );

    let result = if spectrogram.is_empty() {
        Err(PipelineError::render(0, "spectrogram has no analysis frames"))
    } else if parallel {
        render_parallel(spectrogram, total, settings, recipe, state, sink, progress)
    } else {
        render_sequential(spectrogram, total, settings, recipe, state, sink, progress)
    };

    match result {
        Ok(()) => {
            progress.finish();
            Ok(total)
        }
        Err(err) => {
            progress.abandon();
            sink.abort();
            Err(err)
        }
    }
}

fn render_sequential<R, S>(
    spectrogram: &Spectrogram,
    total: usize,
    settings: &RenderSettings,
    recipe: &R,
    state: &mut RenderState,
    sink: &mut S,
    progress: &ProgressBar,
) -> PipelineResult<()>
where
    R: RecipeRenderer + ?Sized,
    S: FrameSink + ?Sized,
{
    let size = settings.canvas();
    for k in 0..total {
        let bands = frame_bands(spectrogram, k, total, settings, state)?;
        let frame = recipe.render(&bands, state, size);
        sink.write_frame(&frame)?;
        state.advance();
        report(k, total, progress);
    }
    Ok(())
}

/// Smoothing runs in order on this thread; only the pure render step of each
/// batch fans out. Batches are written back in frame order.
fn render_parallel<R, S>(
    spectrogram: &Spectrogram,
    total: usize,
    settings: &RenderSettings,
    recipe: &R,
    state: &mut RenderState,
    sink: &mut S,
    progress: &ProgressBar,
) -> PipelineResult<()>
where
    R: RecipeRenderer + ?Sized,
    S: FrameSink + ?Sized,
{
    let size = settings.canvas();
    let chunk = settings.chunk_size.max(1);
    let mut start = 0;

    while start < total {
        let end = (start + chunk).min(total);
        let mut inputs: Vec<(usize, BandVector, u64)> = Vec::with_capacity(end - start);
        for k in start..end {
            let bands = frame_bands(spectrogram, k, total, settings, state)?;
            inputs.push((k, bands, state.frame_seed()));
            state.advance();
        }

        let frames: Vec<PixelBuffer> = inputs
            .par_iter()
            .map(|(k, bands, seed)| {
                recipe
                    .render_stateless(bands, size, *seed)
                    .ok_or_else(|| PipelineError::render(*k, "recipe has no stateless renderer"))
            })
            .collect::<PipelineResult<_>>()?;

        for (k, frame) in (start..end).zip(frames.iter()) {
            sink.write_frame(frame)?;
            report(k, total, progress);
        }
        start = end;
    }
    Ok(())
}

fn frame_bands(
    spectrogram: &Spectrogram,
    k: usize,
    total: usize,
    settings: &RenderSettings,
    state: &mut RenderState,
) -> PipelineResult<BandVector> {
    let index = analysis_index(k, spectrogram.len(), total);
    let frame = spectrogram
        .frame(index)
        .ok_or_else(|| PipelineError::render(k, format!("no analysis frame {index}")))?;
    let raw = bands::map(frame, settings.num_bands);
    Ok(smooth(&raw, state, settings.smoothing))
}

fn report(k: usize, total: usize, progress: &ProgressBar) {
    let done = k + 1;
    progress.set_position(done as u64);
    if done % PROGRESS_EVERY == 0 || done == total {
        log::debug!("Rendered {}/{} frames", done, total);
    }
}
