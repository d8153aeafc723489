use super::bands::BandVector;
use crate::render::state::RenderState;

/// Blend `raw` with the previous smoothed vector held in `state`:
/// `factor * previous + (1 - factor) * raw`.
///
/// The first call (or a change in band count) passes `raw` through unchanged.
/// Must be called once per output frame, in frame order.
pub fn smooth(raw: &[f32], state: &mut RenderState, factor: f32) -> BandVector {
    let factor = factor.clamp(0.0, 1.0);

    let smoothed: BandVector = match state.previous_bands() {
        Some(prev) if prev.len() == raw.len() => prev
            .iter()
            .zip(raw.iter())
            .map(|(&p, &r)| (factor * p + (1.0 - factor) * r).clamp(0.0, 1.0))
            .collect(),
        _ => raw.to_vec(),
    };

    state.set_previous_bands(smoothed.clone());
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn first_frame_has_no_lag() {
        let mut state = RenderState::new(1, 10);
        let out = smooth(&[0.3, 0.9], &mut state, 0.85);
        assert_eq!(out, vec![0.3, 0.9]);
        assert_eq!(state.previous_bands(), Some(&[0.3, 0.9][..]));
    }

    #[test]
    fn blends_with_previous() {
        let mut state = RenderState::new(1, 10);
        smooth(&[0.2], &mut state, 0.7);
        let out = smooth(&[1.0], &mut state, 0.7);
        assert!((out[0] - 0.44).abs() < 1e-6, "got {}", out[0]);
        assert_eq!(state.previous_bands(), Some(&out[..]));
    }

    #[test]
    fn zero_factor_is_passthrough() {
        let mut state = RenderState::new(1, 10);
        smooth(&[0.8, 0.1], &mut state, 0.0);
        assert_eq!(smooth(&[0.1, 0.8], &mut state, 0.0), vec![0.1, 0.8]);
    }

    #[test]
    fn result_is_between_previous_and_raw() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..20 {
            let factor: f32 = rng.gen_range(0.0..1.0);
            let mut state = RenderState::new(0, 10);
            let mut prev: Vec<f32> = (0..16).map(|_| rng.gen()).collect();
            smooth(&prev, &mut state, factor);

            for _ in 0..50 {
                let raw: Vec<f32> = (0..16).map(|_| rng.gen()).collect();
                let out = smooth(&raw, &mut state, factor);
                for ((&o, &p), &r) in out.iter().zip(prev.iter()).zip(raw.iter()) {
                    let (lo, hi) = if p < r { (p, r) } else { (r, p) };
                    assert!(o >= lo - 1e-6 && o <= hi + 1e-6);
                }
                prev = out;
            }
        }
    }

    #[test]
    fn band_count_change_restarts_history() {
        let mut state = RenderState::new(1, 10);
        smooth(&[0.5, 0.5], &mut state, 0.9);
        assert_eq!(smooth(&[1.0, 1.0, 1.0], &mut state, 0.9), vec![1.0; 3]);
    }
}
