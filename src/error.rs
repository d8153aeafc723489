use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Which muxing attempt produced a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuxPath {
    /// Writing raw frames into the temporary intermediate file.
    Intermediate,
    Primary,
    Fallback,
}

impl fmt::Display for MuxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MuxPath::Intermediate => "intermediate",
            MuxPath::Primary => "primary",
            MuxPath::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Pipeline stage a fatal error is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Render,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Render => "render",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("failed to decode audio '{}': {reason}", path.display())]
    AudioDecode { path: PathBuf, reason: String },

    #[error("muxing tool '{tool}' was not found (is ffmpeg installed and on PATH?)")]
    EncoderUnavailable { tool: String },

    #[error("{path} muxing step failed with exit code {}", display_code(code))]
    EncodingFailed { path: MuxPath, code: Option<i32> },

    #[error("muxing tool did not exit within {timeout:?}")]
    EncoderTimeout { timeout: Duration },

    #[error("render failed at frame {frame}: {reason}")]
    Render { frame: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn audio_decode(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::AudioDecode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn render(frame: usize, reason: impl Into<String>) -> Self {
        Self::Render {
            frame,
            reason: reason.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::AudioDecode { .. } => Stage::Decode,
            PipelineError::Render { .. } => Stage::Render,
            PipelineError::EncoderUnavailable { .. }
            | PipelineError::EncodingFailed { .. }
            | PipelineError::EncoderTimeout { .. }
            | PipelineError::Io(_) => Stage::Encode,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_attributed() {
        assert_eq!(
            PipelineError::audio_decode("a.wav", "empty").stage(),
            Stage::Decode
        );
        assert_eq!(PipelineError::render(3, "bad size").stage(), Stage::Render);
        assert_eq!(
            PipelineError::EncodingFailed {
                path: MuxPath::Fallback,
                code: Some(1)
            }
            .stage(),
            Stage::Encode
        );
    }

    #[test]
    fn messages_name_the_failure() {
        let err = PipelineError::audio_decode("/tmp/missing.mp3", "file not found");
        assert!(err.to_string().contains("/tmp/missing.mp3"));

        let err = PipelineError::EncodingFailed {
            path: MuxPath::Primary,
            code: None,
        };
        assert_eq!(err.to_string(), "primary muxing step failed with exit code none");
    }
}
