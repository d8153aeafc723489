use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::decode::AudioSignal;
use super::features::{SpectralFrame, Spectrogram};

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_TOP_DB: f32 = 80.0;

/// Magnitude floor before taking the log.
const AMIN: f32 = 1e-5;

#[derive(Clone, Copy, Debug)]
pub struct AnalysisSettings {
    pub fps: u32,
    pub fft_size: usize,
    /// dB below the global peak at which values are floored.
    pub top_db: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            fft_size: DEFAULT_FFT_SIZE,
            top_db: DEFAULT_TOP_DB,
        }
    }
}

/// Samples between consecutive analysis frames so that one hop spans roughly
/// one output frame.
pub fn hop_length(sample_rate: u32, fps: u32) -> usize {
    ((sample_rate as f32 / fps.max(1) as f32).round() as usize).max(1)
}

/// Number of centered analysis frames covering `num_samples`.
pub fn analysis_frame_count(num_samples: usize, hop: usize) -> usize {
    1 + num_samples / hop.max(1)
}

/// Compute the normalized spectrogram of `signal`.
///
/// Magnitudes are taken from Hann-windowed frames centered on multiples of the
/// hop, converted to dB relative to the loudest bin in the whole signal
/// (floored at `-top_db`), then min-max rescaled over the whole matrix so
/// the quietest value maps to 0 and the loudest to 1.
pub fn analyze(signal: &AudioSignal, settings: &AnalysisSettings) -> Spectrogram {
    let fft_size = settings.fft_size;
    let hop = hop_length(signal.sample_rate, settings.fps);
    let total_frames = analysis_frame_count(signal.samples.len(), hop);

    log::info!(
        "Pass 1: Per-frame FFT ({} frames, window={}, hop={})...",
        total_frames,
        fft_size,
        hop
    );
    let mut magnitudes = pass1_magnitudes(&signal.samples, fft_size, hop, total_frames);

    let reference = magnitudes
        .par_iter()
        .flat_map_iter(|frame| frame.iter().copied())
        .reduce(|| 0.0f32, f32::max);

    log::info!(
        "Pass 2: dB conversion & normalization (ref={:.4}, top_db={:.1})...",
        reference,
        settings.top_db
    );
    pass2_normalize(&mut magnitudes, reference, settings.top_db);

    let frames = magnitudes
        .into_iter()
        .enumerate()
        .map(|(index, bins)| SpectralFrame { index, bins })
        .collect();

    let spectrogram = Spectrogram {
        frames,
        fft_size,
        hop_length: hop,
        sample_rate: signal.sample_rate,
    };
    log::info!(
        "Spectrogram: {} frames x {} bins ({:.2} frames/s)",
        spectrogram.len(),
        spectrogram.num_bins(),
        spectrogram.frame_rate()
    );
    spectrogram
}

fn pass1_magnitudes(
    samples: &[f32],
    fft_size: usize,
    hop: usize,
    total_frames: usize,
) -> Vec<Vec<f32>> {
    let hann = hann_window(fft_size);
    let half = fft_size / 2;

    (0..total_frames)
        .into_par_iter()
        .map_init(
            || FftPlanner::<f32>::new().plan_fft_forward(fft_size),
            |fft, frame_idx| {
                let center = frame_idx * hop;
                let mut fft_input = vec![Complex::new(0.0f32, 0.0); fft_size];

                // Zero-padded outside the signal.
                for (i, slot) in fft_input.iter_mut().enumerate() {
                    let pos = (center + i).checked_sub(half);
                    if let Some(&s) = pos.and_then(|p| samples.get(p)) {
                        *slot = Complex::new(s * hann[i], 0.0);
                    }
                }

                fft.process(&mut fft_input);
                fft_input[..=half].iter().map(|c| c.norm()).collect()
            },
        )
        .collect()
}

fn pass2_normalize(frames: &mut [Vec<f32>], reference: f32, top_db: f32) {
    let ref_db = 20.0 * reference.max(AMIN).log10();
    let floor_db = -top_db.abs();

    frames.par_iter_mut().for_each(|bins| {
        for value in bins.iter_mut() {
            let db = 20.0 * value.max(AMIN).log10() - ref_db;
            *value = db.max(floor_db);
        }
    });

    let (min_db, max_db) = frames
        .par_iter()
        .flat_map_iter(|frame| frame.iter().copied())
        .fold(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)),
        );

    let range = max_db - min_db;
    frames.par_iter_mut().for_each(|bins| {
        for value in bins.iter_mut() {
            *value = if range > f32::EPSILON {
                ((*value - min_db) / range).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
    });
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> AudioSignal {
        let n = (sample_rate as f32 * seconds) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        AudioSignal::new(samples, sample_rate)
    }

    #[test]
    fn hop_tracks_frame_rate() {
        assert_eq!(hop_length(44_100, 30), 1470);
        assert_eq!(hop_length(48_000, 24), 2000);
        assert_eq!(hop_length(10, 60), 1);
    }

    #[test]
    fn frame_count_and_bin_count() {
        let signal = sine(440.0, 8_000, 1.0);
        let settings = AnalysisSettings {
            fps: 25,
            fft_size: 512,
            top_db: DEFAULT_TOP_DB,
        };
        let spectrogram = analyze(&signal, &settings);

        assert_eq!(spectrogram.hop_length, 320);
        assert_eq!(spectrogram.len(), 1 + 8_000 / 320);
        assert!(spectrogram.frames.iter().all(|f| f.bins.len() == 257));
        assert_eq!(spectrogram.num_bins(), 257);
        assert!(spectrogram.frames.iter().enumerate().all(|(i, f)| f.index == i));
    }

    #[test]
    fn output_spans_full_unit_range() {
        let signal = sine(1_000.0, 16_000, 0.5);
        let spectrogram = analyze(
            &signal,
            &AnalysisSettings {
                fps: 30,
                fft_size: 1024,
                top_db: DEFAULT_TOP_DB,
            },
        );

        let all = spectrogram.frames.iter().flat_map(|f| f.bins.iter().copied());
        let (lo, hi) = all.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        assert_eq!(lo, 0.0);
        assert!((hi - 1.0).abs() < 1e-6);
        assert!(spectrogram
            .frames
            .iter()
            .flat_map(|f| f.bins.iter())
            .all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn peak_lands_in_the_tone_bin() {
        let sample_rate = 8_000;
        let fft_size = 1024;
        let freq = 1_000.0;
        let signal = sine(freq, sample_rate, 1.0);
        let spectrogram = analyze(
            &signal,
            &AnalysisSettings {
                fps: 10,
                fft_size,
                top_db: DEFAULT_TOP_DB,
            },
        );

        let mid = &spectrogram.frames[spectrogram.len() / 2];
        let (peak_bin, _) = mid
            .bins
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        let expected = (freq * fft_size as f32 / sample_rate as f32).round() as usize;
        assert!(peak_bin.abs_diff(expected) <= 1, "peak at {peak_bin}, expected {expected}");
    }

    #[test]
    fn loudness_does_not_change_normalized_output() {
        let settings = AnalysisSettings {
            fps: 20,
            fft_size: 512,
            top_db: DEFAULT_TOP_DB,
        };
        let loud = sine(500.0, 8_000, 0.5);
        let mut quiet = loud.clone();
        quiet.samples.iter_mut().for_each(|s| *s *= 0.01);

        let a = analyze(&loud, &settings);
        let b = analyze(&quiet, &settings);
        for (fa, fb) in a.frames.iter().zip(b.frames.iter()) {
            for (x, y) in fa.bins.iter().zip(fb.bins.iter()) {
                assert!((x - y).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn silence_normalizes_to_zero() {
        let signal = AudioSignal::new(vec![0.0; 4_000], 8_000);
        let spectrogram = analyze(
            &signal,
            &AnalysisSettings {
                fps: 30,
                fft_size: 256,
                top_db: DEFAULT_TOP_DB,
            },
        );
        assert!(spectrogram.frames.iter().flat_map(|f| f.bins.iter()).all(|&v| v == 0.0));
    }
}
