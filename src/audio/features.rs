/// One analysis hop: magnitudes per FFT bin, normalized to 0.0-1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralFrame {
    pub index: usize,
    /// `fft_size / 2 + 1` values.
    pub bins: Vec<f32>,
}

/// The full time-frequency matrix for a signal, indexed by analysis frame.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    pub frames: Vec<SpectralFrame>,
    pub fft_size: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn frame(&self, index: usize) -> Option<&SpectralFrame> {
        self.frames.get(index)
    }

    /// Analysis frames per second of audio.
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_length.max(1) as f32
    }
}
