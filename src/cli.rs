use clap::Parser;
use std::path::PathBuf;

/// Flags left unset fall back to the config file, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "audiogram", about = "Render an audio file into a visualizer video")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: Option<PathBuf>,

    /// Output video file; the extension picks the container
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Recipe name or index (see --list-recipes) [default: radial-bars]
    #[arg(short, long)]
    pub recipe: Option<String>,

    /// Recipe knob override, e.g. --param density=0.5 (repeatable)
    #[arg(short, long = "param")]
    pub params: Vec<String>,

    /// Extra directory of JSON recipe manifests
    #[arg(long)]
    pub recipes_dir: Option<PathBuf>,

    /// List available recipes and exit
    #[arg(long)]
    pub list_recipes: bool,

    /// Config file (default: ./audiogram.toml or ~/.config/audiogram/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Video width in pixels [default: 1920]
    #[arg(long)]
    pub width: Option<u32>,

    /// Video height in pixels [default: 1080]
    #[arg(long)]
    pub height: Option<u32>,

    /// Frames per second [default: 30]
    #[arg(long)]
    pub fps: Option<u32>,

    /// CRF quality for opaque output (lower = better). Ignored when --bitrate is set. [default: 18]
    #[arg(long)]
    pub crf: Option<u32>,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// FFmpeg video codec for opaque output [default: libx264]
    #[arg(long)]
    pub codec: Option<String>,

    /// FFmpeg pixel format for opaque output [default: yuv420p]
    #[arg(long)]
    pub pix_fmt: Option<String>,

    /// Temporal smoothing factor in [0, 1) [default: 0.85]
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Number of frequency bands [default: 60]
    #[arg(long)]
    pub bands: Option<usize>,

    /// FFT window size, a power of two [default: 2048]
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Dynamic range below the loudest bin, in dB [default: 80]
    #[arg(long)]
    pub top_db: Option<f32>,

    /// Seed for recipe randomness [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Frames kept by trail recipes [default: 10]
    #[arg(long)]
    pub history_depth: Option<usize>,

    /// Background color as hex, e.g. #00ff00; keyed out with --transparent
    #[arg(long)]
    pub background: Option<String>,

    /// Key the background color to alpha
    #[arg(long)]
    pub transparent: bool,

    /// Render stateless recipes on all cores [default: true]
    #[arg(long)]
    pub parallel: Option<bool>,

    /// Path to the ffmpeg binary [default: ffmpeg]
    #[arg(long)]
    pub ffmpeg: Option<String>,

    /// Seconds to wait for the muxing step before giving up [default: 600]
    #[arg(long)]
    pub mux_timeout: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_stay_none() {
        let cli = Cli::parse_from(["audiogram", "song.mp3"]);
        assert_eq!(cli.input, Some(PathBuf::from("song.mp3")));
        assert_eq!(cli.output, PathBuf::from("output.mp4"));
        assert!(cli.fps.is_none());
        assert!(cli.recipe.is_none());
        assert!(!cli.transparent);
    }

    #[test]
    fn repeatable_params() {
        let cli = Cli::parse_from([
            "audiogram",
            "song.mp3",
            "-r",
            "3",
            "-p",
            "density=0.5",
            "--param",
            "palette=fire",
            "--parallel",
            "false",
        ]);
        assert_eq!(cli.recipe.as_deref(), Some("3"));
        assert_eq!(cli.params, vec!["density=0.5", "palette=fire"]);
        assert_eq!(cli.parallel, Some(false));
    }
}
