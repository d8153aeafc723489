//! In-process stand-in for the muxing tool.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::ffmpeg::{FrameStream, Muxer, ToolError, ToolExit};

/// Records every invocation, writes the files a real tool would write and
/// exits with the configured codes.
#[derive(Clone, Debug, Default)]
pub struct FakeMuxer {
    pub calls: Arc<Mutex<Vec<Vec<OsString>>>>,
    pub bytes_streamed: Arc<Mutex<usize>>,
    /// Tool absent from the start.
    pub missing: bool,
    /// Frames stream fine but the tool disappears before muxing.
    pub missing_at_mux: bool,
    pub stream_code: i32,
    pub primary_code: i32,
    pub fallback_code: i32,
}

impl FakeMuxer {
    pub fn calls(&self) -> Vec<Vec<OsString>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mux_calls(&self) -> usize {
        self.calls().len().saturating_sub(1)
    }

    fn record(&self, args: &[OsString]) {
        self.calls.lock().unwrap().push(args.to_vec());
    }
}

fn output_of(args: &[OsString]) -> PathBuf {
    args.last().map(PathBuf::from).unwrap_or_default()
}

impl Muxer for FakeMuxer {
    fn tool_name(&self) -> &str {
        "fake-ffmpeg"
    }

    fn spawn_stream(&self, args: &[OsString]) -> Result<Box<dyn FrameStream>, ToolError> {
        if self.missing {
            return Err(ToolError::NotFound(self.tool_name().to_string()));
        }
        self.record(args);
        Ok(Box::new(FakeStream {
            output: output_of(args),
            written: Vec::new(),
            total: Arc::clone(&self.bytes_streamed),
            code: self.stream_code,
        }))
    }

    fn run(&self, args: &[OsString]) -> Result<ToolExit, ToolError> {
        if self.missing || self.missing_at_mux {
            return Err(ToolError::NotFound(self.tool_name().to_string()));
        }
        self.record(args);
        let fallback = args.iter().any(|a| a == "copy");
        let code = if fallback {
            self.fallback_code
        } else {
            self.primary_code
        };
        // a failing run still leaves a truncated file behind
        std::fs::write(output_of(args), if code == 0 { "video" } else { "partial" })?;
        Ok(ToolExit { code: Some(code) })
    }
}

struct FakeStream {
    output: PathBuf,
    written: Vec<u8>,
    total: Arc<Mutex<usize>>,
    code: i32,
}

impl FrameStream for FakeStream {
    fn write_frame(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(data);
        *self.total.lock().unwrap() += data.len();
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<ToolExit, ToolError> {
        std::fs::write(&self.output, &self.written)?;
        Ok(ToolExit {
            code: Some(self.code),
        })
    }

    fn kill(self: Box<Self>) {}
}
