use super::features::SpectralFrame;

pub const DEFAULT_NUM_BANDS: usize = 60;

/// Share of the frequency axis kept for banding; the top 40% is discarded.
const USABLE_FRACTION: f32 = 0.6;
/// Exponent > 1 gives low frequencies more bands.
const SPACING_EXPONENT: f32 = 1.5;

/// Per-output-frame band values, each in 0.0-1.0.
pub type BandVector = Vec<f32>;

/// Reduce one spectral frame to `num_bands` power-law spaced band values.
pub fn map(frame: &SpectralFrame, num_bands: usize) -> BandVector {
    map_bins(&frame.bins, num_bands)
}

pub fn map_bins(bins: &[f32], num_bands: usize) -> BandVector {
    if bins.is_empty() || num_bands == 0 {
        return vec![0.0; num_bands];
    }

    let usable = ((bins.len() as f32 * USABLE_FRACTION) as usize).clamp(1, bins.len());
    let usable_bins = &bins[..usable];
    let window = (usable / (2 * num_bands)).max(1);

    (0..num_bands)
        .map(|i| {
            let t = i as f32 / num_bands as f32;
            let position = (usable as f32 * t.powf(SPACING_EXPONENT)) as usize;
            band_value(usable_bins, position, window).clamp(0.0, 1.0)
        })
        .collect()
}

/// Mean of the window centered on `position`; a window that collapses or
/// falls off the end clamps to the nearest valid bin.
fn band_value(bins: &[f32], position: usize, window: usize) -> f32 {
    let last = bins.len() - 1;
    let start = position.saturating_sub(window / 2);
    let end = (start + window).min(bins.len());

    if start >= end {
        return bins[position.min(last)];
    }

    let slice = &bins[start..end];
    slice.iter().sum::<f32>() / slice.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn frame(bins: Vec<f32>) -> SpectralFrame {
        SpectralFrame { index: 0, bins }
    }

    #[test]
    fn produces_requested_length() {
        let f = frame(vec![0.5; 1025]);
        assert_eq!(map(&f, 60).len(), 60);
        assert_eq!(map(&f, 1).len(), 1);
        assert!(map(&f, 0).is_empty());
    }

    #[test]
    fn values_stay_in_unit_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let len = rng.gen_range(1..2049);
            let bins: Vec<f32> = (0..len).map(|_| rng.gen_range(0.0..=1.0)).collect();
            let bands = map(&frame(bins), rng.gen_range(1..128));
            assert!(bands.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn upper_frequencies_are_ignored() {
        let mut bins = vec![0.0; 1025];
        let usable = (1025.0 * 0.6) as usize;
        for b in &mut bins[usable..] {
            *b = 1.0;
        }
        assert!(map(&frame(bins), 60).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn low_frequencies_get_more_bands() {
        // Energy only in the bottom tenth of the usable axis.
        let mut bins = vec![0.0; 1025];
        let usable = (1025.0 * 0.6) as usize;
        for b in &mut bins[..usable / 10] {
            *b = 1.0;
        }
        let bands = map(&frame(bins), 60);
        let lit = bands.iter().filter(|&&v| v > 0.0).count();
        // A linear spacing would give 7 bands; t^1.5 gives 14.
        assert!(lit > 10, "only {lit} bands lit");
    }

    #[test]
    fn collapsed_window_uses_single_bin() {
        // 3 usable bins, 8 bands: window collapses to one bin.
        let bins = vec![0.1, 0.2, 0.3, 0.9, 0.9];
        let bands = map(&frame(bins), 8);
        assert_eq!(bands.len(), 8);
        assert_eq!(bands[0], 0.1);
        assert!(bands.iter().all(|v| [0.1, 0.2, 0.3].contains(v)));
    }

    #[test]
    fn single_bin_spectrum_is_clamped() {
        let bands = map(&frame(vec![0.4]), 4);
        assert_eq!(bands, vec![0.4; 4]);
    }

    #[test]
    fn window_averages_neighbours() {
        // 100 usable bins, 2 bands => window of 25 bins.
        let bins: Vec<f32> = (0..167).map(|i| if i < 25 { 1.0 } else { 0.0 }).collect();
        let bands = map(&frame(bins), 2);
        assert_eq!(bands[0], 1.0);
        // Second band spans bins 23..48, two of which are lit.
        assert!((bands[1] - 2.0 / 25.0).abs() < 1e-6);
    }
}
