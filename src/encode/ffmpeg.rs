use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::PipelineError;

pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_MUX_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exit status of an external tool. `code` is `None` when it was killed by a
/// signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolExit {
    pub code: Option<i32>,
}

impl ToolExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("'{0}' was not found")]
    NotFound(String),

    #[error("process did not exit within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ToolError> for PipelineError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(tool) => PipelineError::EncoderUnavailable { tool },
            ToolError::Timeout(timeout) => PipelineError::EncoderTimeout { timeout },
            ToolError::Io(err) => PipelineError::Io(err),
        }
    }
}

/// A running process consuming raw frames on stdin.
pub trait FrameStream: Send {
    fn write_frame(&mut self, data: &[u8]) -> io::Result<()>;

    /// Close stdin and wait for the process to exit.
    fn finish(self: Box<Self>) -> Result<ToolExit, ToolError>;

    /// Stop the process without waiting for it to flush.
    fn kill(self: Box<Self>);
}

/// Synchronous capability for the external muxing tool. Only exit codes feed
/// control flow; diagnostics are logged.
pub trait Muxer {
    fn tool_name(&self) -> &str;

    /// Start the tool with stdin piped for frame data.
    fn spawn_stream(&self, args: &[OsString]) -> Result<Box<dyn FrameStream>, ToolError>;

    /// Run the tool to completion.
    fn run(&self, args: &[OsString]) -> Result<ToolExit, ToolError>;
}

/// Muxer backed by an ffmpeg binary.
#[derive(Clone, Debug)]
pub struct FfmpegMuxer {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG, DEFAULT_MUX_TIMEOUT)
    }
}

impl FfmpegMuxer {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn spawn(&self, args: &[OsString], stdin: Stdio) -> Result<Child, ToolError> {
        log::debug!("Running {} {:?}", self.binary.display(), args);
        Command::new(&self.binary)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => ToolError::NotFound(self.tool_name().to_string()),
                _ => ToolError::Io(err),
            })
    }
}

impl Muxer for FfmpegMuxer {
    fn tool_name(&self) -> &str {
        self.binary.to_str().unwrap_or(DEFAULT_FFMPEG)
    }

    fn spawn_stream(&self, args: &[OsString]) -> Result<Box<dyn FrameStream>, ToolError> {
        let mut child = self.spawn(args, Stdio::piped())?;
        let stdin = child.stdin.take();
        let stderr = drain_stderr(&mut child, self.tool_name());
        Ok(Box::new(ProcessStream {
            child,
            stdin,
            stderr,
            timeout: self.timeout,
        }))
    }

    fn run(&self, args: &[OsString]) -> Result<ToolExit, ToolError> {
        let mut child = self.spawn(args, Stdio::null())?;
        let stderr = drain_stderr(&mut child, self.tool_name());
        let exit = wait_bounded(&mut child, self.timeout);
        settle_drain(stderr, &exit);
        exit
    }
}

struct ProcessStream {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl FrameStream for ProcessStream {
    fn write_frame(&mut self, data: &[u8]) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin already closed"))?;
        stdin.write_all(data)
    }

    fn finish(mut self: Box<Self>) -> Result<ToolExit, ToolError> {
        // EOF tells ffmpeg to flush and exit
        drop(self.stdin.take());
        let exit = wait_bounded(&mut self.child, self.timeout);
        settle_drain(self.stderr.take(), &exit);
        exit
    }

    fn kill(mut self: Box<Self>) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        // a grandchild may still hold the pipe open
        drop(self.stderr.take());
    }
}

/// Poll until the child exits; kill it once `timeout` has passed.
fn wait_bounded(child: &mut Child, timeout: Duration) -> Result<ToolExit, ToolError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(ToolExit {
                code: status.code(),
            });
        }
        if Instant::now() >= deadline {
            log::warn!("Killing process {} after {:?}", child.id(), timeout);
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolError::Timeout(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Forward stderr to the debug log so the pipe never fills and blocks the
/// child.
fn drain_stderr(child: &mut Child, tool: &str) -> Option<JoinHandle<()>> {
    let stderr = child.stderr.take()?;
    let tool = tool.to_string();
    Some(std::thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            log::debug!("{}: {}", tool, line);
        }
    }))
}

/// Join the drain thread after a clean exit. After a timeout kill the pipe can
/// outlive the child, so the thread is detached instead.
fn settle_drain(handle: Option<JoinHandle<()>>, exit: &Result<ToolExit, ToolError>) {
    match (handle, exit) {
        (Some(handle), Ok(_)) => {
            let _ = handle.join();
        }
        (Some(_), Err(_)) => log::debug!("Detaching stderr reader of killed process"),
        (None, _) => {}
    }
}

pub fn is_ffmpeg_on_path(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
