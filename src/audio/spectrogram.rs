//! Short-Time Fourier Transform over the ring-buffer window, producing a
//! frame-major magnitude spectrogram.
//!
//! FFT planning and Hann windowing follow `audio/fft.rs`'s `AudioAnalyzer`
//! (`rustfft::FftPlanner` + a precomputed window, magnitude-only output); the
//! difference here is that one call produces a whole grid of per-hop frames
//! rather than a single spectrum, to hand onward to HPSS's median filtering.
//!
//! Storage is frame-major: `bins[frame * n_bins + bin]`. HPSS, chroma, and
//! brightness all want a contiguous slice for "the latest frame", which this
//! layout gives for free; a bin-major layout would make that a strided copy
//! instead.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub struct Spectrogram {
    pub n_bins: usize,
    pub n_frames: usize,
    pub bins: Vec<f32>,
}

impl Spectrogram {
    /// The contiguous magnitude slice for frame `i`.
    pub fn frame(&self, i: usize) -> &[f32] {
        let start = i * self.n_bins;
        &self.bins[start..start + self.n_bins]
    }

    pub fn frame_mut(&mut self, i: usize) -> &mut [f32] {
        let start = i * self.n_bins;
        &mut self.bins[start..start + self.n_bins]
    }

    pub fn last_frame(&self) -> &[f32] {
        self.frame(self.n_frames - 1)
    }
}

pub struct StftAnalyzer {
    fft_size: usize,
    hop: usize,
    n_bins: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl StftAnalyzer {
    pub fn new(fft_size: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let window = hann_window(fft_size);

        Self {
            fft_size,
            hop,
            n_bins: fft_size / 2 + 1,
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Slide a `fft_size`-wide, Hann-windowed FFT across `samples` in steps of
    /// `hop`, zero-padding the tail frame if it runs short, and collect
    /// magnitude spectra into a frame-major `Spectrogram`.
    pub fn analyze(&mut self, samples: &[f32]) -> Spectrogram {
        let n_frames = if samples.len() >= self.fft_size {
            (samples.len() - self.fft_size) / self.hop + 1
        } else {
            1
        };

        let mut bins = vec![0.0f32; n_frames * self.n_bins];

        for f in 0..n_frames {
            let start = f * self.hop;
            let end = (start + self.fft_size).min(samples.len());

            for (i, slot) in self.scratch.iter_mut().enumerate() {
                let sample = if start + i < end {
                    samples[start + i] * self.window[i]
                } else {
                    0.0
                };
                *slot = Complex::new(sample, 0.0);
            }

            self.fft.process(&mut self.scratch);

            let out = &mut bins[f * self.n_bins..(f + 1) * self.n_bins];
            for (bin, c) in out.iter_mut().zip(self.scratch[..self.n_bins].iter()) {
                *bin = c.norm() * 2.0 / self.fft_size as f32;
            }
        }

        Spectrogram { n_bins: self.n_bins, n_frames, bins }
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn bin_count_matches_half_fft_size_plus_one() {
        let mut a = StftAnalyzer::new(2048, 1024);
        let samples = vec![0.0; 2048];
        let spec = a.analyze(&samples);
        assert_eq!(spec.n_bins, 1025);
        assert_eq!(a.n_bins(), 1025);
    }

    #[test]
    fn pure_tone_peaks_at_its_own_bin() {
        let sample_rate = 48_000.0;
        let fft_size = 2048;
        let mut a = StftAnalyzer::new(fft_size, 1024);
        let samples = sine(1000.0, sample_rate, fft_size);
        let spec = a.analyze(&samples);
        let frame = spec.last_frame();

        let bin_width = sample_rate / fft_size as f32;
        let expected_bin = (1000.0 / bin_width).round() as usize;

        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!(
            (peak_bin as isize - expected_bin as isize).abs() <= 1,
            "expected peak near bin {expected_bin}, got {peak_bin}"
        );
    }

    #[test]
    fn short_tail_is_zero_padded_not_dropped() {
        let mut a = StftAnalyzer::new(2048, 1024);
        let samples = vec![1.0; 100];
        let spec = a.analyze(&samples);
        assert_eq!(spec.n_frames, 1);
    }

    #[test]
    fn multiple_hops_produce_multiple_frames() {
        let mut a = StftAnalyzer::new(2048, 1024);
        let samples = vec![0.0; 2048 + 1024 * 3];
        let spec = a.analyze(&samples);
        assert_eq!(spec.n_frames, 4);
    }
}
