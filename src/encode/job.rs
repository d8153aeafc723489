use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VP9_ALPHA_FLAGS: &[&str] = &["-b:v", "0", "-crf", "30"];
const PRORES_4444_FLAGS: &[&str] = &["-profile:v", "4444"];
const VP9_LOSSLESS_FLAGS: &[&str] = &[
    "-c:v",
    "libvpx-vp9",
    "-lossless",
    "1",
    "-pix_fmt",
    "yuv444p",
];
const MJPEG_FLAGS: &[&str] = &["-c:v", "mjpeg", "-q:v", "2", "-pix_fmt", "yuvj420p"];

/// Output container, picked from the output file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Mov,
    Mkv,
    Webm,
    Other,
}

impl Container {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("mp4") | Some("m4v") => Container::Mp4,
            Some("mov") => Container::Mov,
            Some("mkv") => Container::Mkv,
            Some("webm") => Container::Webm,
            _ => Container::Other,
        }
    }

    /// Codec, pixel format and extra flags for an alpha-capable encode.
    /// MP4 has no widely supported alpha codec; ProRes is requested anyway and
    /// the muxer's refusal sends the job down the fallback path.
    fn alpha_video(self) -> (&'static str, &'static str, &'static [&'static str]) {
        match self {
            Container::Webm => ("libvpx-vp9", "yuva420p", VP9_ALPHA_FLAGS),
            Container::Mkv => ("ffv1", "yuva420p", &[]),
            Container::Mov | Container::Mp4 | Container::Other => {
                ("prores_ks", "yuva444p10le", PRORES_4444_FLAGS)
            }
        }
    }

    fn audio_codec(self) -> &'static str {
        match self {
            Container::Webm => "libopus",
            _ => "aac",
        }
    }

    /// Extension and codec flags for the intermediate; chosen so that copying
    /// it verbatim into this container is always legal.
    fn intermediate(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Container::Webm => ("mkv", VP9_LOSSLESS_FLAGS),
            _ => ("avi", MJPEG_FLAGS),
        }
    }
}

/// Knobs for the intermediate stream and the opaque (non-keyed) encode.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Bytes per pixel written by the renderer: 3 (rgb24) or 4 (rgba).
    pub channels: u8,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    /// When set, uses `-b:v` instead of `-crf`.
    pub bitrate: Option<String>,
    /// Background color keyed to alpha.
    pub key_color: [u8; 3],
    pub key_similarity: f32,
    pub key_blend: f32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            channels: 4,
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 18,
            bitrate: None,
            key_color: [0, 0, 0],
            key_similarity: 0.1,
            key_blend: 0.05,
        }
    }
}

/// Everything needed for one encode. Owns the scratch directory holding the
/// intermediate file; the directory is removed when the job is cleaned up or
/// dropped.
#[derive(Debug)]
pub struct EncodingJob {
    pub output: PathBuf,
    pub audio: PathBuf,
    pub transparent: bool,
    pub settings: EncodeSettings,
    pub container: Container,
    pub intermediate: PathBuf,
    temp_dir: Option<TempDir>,
}

impl EncodingJob {
    pub fn new(
        output: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        transparent: bool,
        settings: EncodeSettings,
    ) -> std::io::Result<Self> {
        let output = output.into();
        let container = Container::from_path(&output);
        let temp_dir = tempfile::Builder::new().prefix("audiogram-").tempdir()?;
        let (ext, _) = container.intermediate();
        let intermediate = temp_dir.path().join(format!("intermediate.{ext}"));

        Ok(Self {
            output,
            audio: audio.into(),
            transparent,
            settings,
            container,
            intermediate,
            temp_dir: Some(temp_dir),
        })
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(|d| d.path())
    }

    /// Delete the scratch directory and everything in it.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.temp_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                log::warn!("Failed to remove temporary dir {}: {}", path.display(), err);
            }
        }
    }

    /// Arguments for the process that turns raw frames on stdin into the
    /// intermediate file.
    pub fn intermediate_args(&self) -> Vec<OsString> {
        let s = &self.settings;
        let pixel_format = if s.channels == 3 { "rgb24" } else { "rgba" };
        let mut args = strings(&[
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pixel_format",
            pixel_format,
        ]);
        args.extend(strings(&["-video_size"]));
        args.push(format!("{}x{}", s.width, s.height).into());
        args.extend(strings(&["-framerate"]));
        args.push(s.fps.to_string().into());
        args.extend(strings(&["-i", "pipe:0", "-an"]));
        args.extend(strings(self.container.intermediate().1));
        args.push(self.intermediate.clone().into_os_string());
        args
    }

    /// Re-encode with the audio track; keyed to alpha when transparency was
    /// requested.
    pub fn primary_args(&self) -> Vec<OsString> {
        let s = &self.settings;
        let mut args = self.mux_inputs();

        if self.transparent {
            let (codec, pix_fmt, extra) = self.container.alpha_video();
            let [r, g, b] = s.key_color;
            let filter = format!(
                "[0:v]colorkey=0x{r:02x}{g:02x}{b:02x}:{:.3}:{:.3},format={pix_fmt}[keyed]",
                s.key_similarity, s.key_blend
            );
            args.extend(strings(&["-filter_complex"]));
            args.push(filter.into());
            args.extend(strings(&["-map", "[keyed]", "-map", "1:a:0", "-c:v", codec]));
            args.extend(strings(extra));
            args.extend(strings(&["-pix_fmt", pix_fmt]));
        } else {
            args.extend(strings(&["-map", "0:v:0", "-map", "1:a:0", "-c:v"]));
            args.push(s.codec.clone().into());
            args.extend(strings(&["-pix_fmt"]));
            args.push(s.pix_fmt.clone().into());
            if let Some(br) = &s.bitrate {
                args.extend(strings(&["-b:v"]));
                args.push(br.into());
            } else {
                args.extend(strings(&["-crf"]));
                args.push(s.crf.to_string().into());
            }
        }

        self.finish_args(args)
    }

    /// Copy the intermediate video stream verbatim and mux in the audio.
    pub fn fallback_args(&self) -> Vec<OsString> {
        let mut args = self.mux_inputs();
        args.extend(strings(&["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"]));
        self.finish_args(args)
    }

    fn mux_inputs(&self) -> Vec<OsString> {
        let mut args = strings(&["-y", "-loglevel", "error", "-i"]);
        args.push(self.intermediate.clone().into_os_string());
        args.push("-i".into());
        args.push(self.audio.clone().into_os_string());
        args
    }

    fn finish_args(&self, mut args: Vec<OsString>) -> Vec<OsString> {
        args.extend(strings(&["-c:a", self.container.audio_codec(), "-b:a", "192k", "-shortest"]));
        args.push(self.output.clone().into_os_string());
        args
    }
}

fn strings(items: &[&str]) -> Vec<OsString> {
    items.iter().map(OsString::from).collect()
}
