use std::ffi::OsString;
use std::path::PathBuf;

use super::ffmpeg::{ensure_parent_dir, FrameStream, Muxer, ToolError, ToolExit};
use super::job::EncodingJob;
use crate::error::{MuxPath, PipelineError, PipelineResult};
use crate::render::canvas::PixelBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderState {
    Opened,
    Writing,
    Finalizing(MuxPath),
    Done(MuxPath),
    Failed,
}

/// Consumer of rendered frames, in order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &PixelBuffer) -> PipelineResult<()>;

    /// Discard everything written so far.
    fn abort(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub output: PathBuf,
    pub path: MuxPath,
    pub frames: usize,
    /// False when the fallback path dropped the alpha channel.
    pub transparent: bool,
}

/// Streams frames into an intermediate file, then muxes it with the source
/// audio. A failed primary mux is retried once without transparency.
pub struct VideoEncoder<M: Muxer> {
    job: EncodingJob,
    muxer: M,
    stream: Option<Box<dyn FrameStream>>,
    state: EncoderState,
    frames: usize,
    /// Set once a mux process has started writing to the output path.
    output_touched: bool,
}

impl<M: Muxer> VideoEncoder<M> {
    pub fn open(mut job: EncodingJob, muxer: M) -> PipelineResult<Self> {
        let stream = ensure_parent_dir(&job.output)
            .map_err(PipelineError::from)
            .and_then(|_| {
                muxer
                    .spawn_stream(&job.intermediate_args())
                    .map_err(PipelineError::from)
            });
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                job.cleanup();
                return Err(err);
            }
        };

        log::info!(
            "Encoder opened: {}x{} @ {}fps -> {} ({:?}, transparent={})",
            job.settings.width,
            job.settings.height,
            job.settings.fps,
            job.output.display(),
            job.container,
            job.transparent
        );

        Ok(Self {
            job,
            muxer,
            stream: Some(stream),
            state: EncoderState::Opened,
            frames: 0,
            output_touched: false,
        })
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    pub fn job(&self) -> &EncodingJob {
        &self.job
    }

    /// Close the intermediate stream and run the mux. Temporary files are gone
    /// when this returns, whatever the result.
    pub fn finalize(&mut self) -> PipelineResult<EncodeOutcome> {
        let result = match self.stream.take() {
            Some(stream) => self.mux(stream),
            None => Err(not_accepting(self.state)),
        };
        self.job.cleanup();

        match &result {
            Ok(outcome) => {
                self.state = EncoderState::Done(outcome.path);
                log::info!(
                    "Wrote {} frames to {} via {} path",
                    outcome.frames,
                    outcome.output.display(),
                    outcome.path
                );
            }
            Err(_) => {
                self.state = EncoderState::Failed;
                self.remove_partial_output();
            }
        }
        result
    }

    fn mux(&mut self, stream: Box<dyn FrameStream>) -> PipelineResult<EncodeOutcome> {
        let exit = stream.finish()?;
        if !exit.success() {
            return Err(PipelineError::EncodingFailed {
                path: MuxPath::Intermediate,
                code: exit.code,
            });
        }

        self.state = EncoderState::Finalizing(MuxPath::Primary);
        let primary = self.run_mux(&self.job.primary_args())?;
        if primary.success() {
            return Ok(self.outcome(MuxPath::Primary));
        }

        log::warn!(
            "{}; re-muxing without transparency",
            PipelineError::EncodingFailed {
                path: MuxPath::Primary,
                code: primary.code,
            }
        );
        self.state = EncoderState::Finalizing(MuxPath::Fallback);
        let fallback = self.run_mux(&self.job.fallback_args())?;
        if fallback.success() {
            Ok(self.outcome(MuxPath::Fallback))
        } else {
            Err(PipelineError::EncodingFailed {
                path: MuxPath::Fallback,
                code: fallback.code,
            })
        }
    }

    fn run_mux(&mut self, args: &[OsString]) -> PipelineResult<ToolExit> {
        match self.muxer.run(args) {
            Err(ToolError::NotFound(tool)) => Err(ToolError::NotFound(tool).into()),
            result => {
                self.output_touched = true;
                Ok(result?)
            }
        }
    }

    fn outcome(&self, path: MuxPath) -> EncodeOutcome {
        EncodeOutcome {
            output: self.job.output.clone(),
            path,
            frames: self.frames,
            transparent: self.job.transparent && path == MuxPath::Primary,
        }
    }

    /// Only a file written by this job's mux is removed.
    fn remove_partial_output(&self) {
        let output = &self.job.output;
        if self.output_touched && output.exists() {
            if let Err(err) = std::fs::remove_file(output) {
                log::warn!("Failed to remove partial output {}: {}", output.display(), err);
            }
        }
    }
}

impl<M: Muxer> FrameSink for VideoEncoder<M> {
    fn write_frame(&mut self, frame: &PixelBuffer) -> PipelineResult<()> {
        let settings = &self.job.settings;
        if frame.width != settings.width
            || frame.height != settings.height
            || frame.channels != settings.channels
            || frame.data.len() != frame.expected_len()
        {
            return Err(PipelineError::render(
                self.frames,
                format!(
                    "frame is {}x{}x{} ({} bytes), encoder expects {}x{}x{}",
                    frame.width,
                    frame.height,
                    frame.channels,
                    frame.data.len(),
                    settings.width,
                    settings.height,
                    settings.channels
                ),
            ));
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(not_accepting(self.state));
        };
        stream.write_frame(&frame.data)?;
        self.frames += 1;
        self.state = EncoderState::Writing;
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.kill();
        }
        self.job.cleanup();
        if !matches!(self.state, EncoderState::Done(_)) {
            self.state = EncoderState::Failed;
        }
        log::debug!("Encoder aborted after {} frames", self.frames);
    }
}

impl<M: Muxer> Drop for VideoEncoder<M> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.kill();
        }
    }
}

fn not_accepting(state: EncoderState) -> PipelineError {
    PipelineError::Io(std::io::Error::other(format!(
        "encoder is not accepting frames in state {state:?}"
    )))
}
