//! Spectral flux: half-wave-rectified frame-to-frame spectral energy
//! increase, normalized against a rolling average of recent flux values
//! so loud and quiet passages report comparable flux.
//!
//! Grounded on `audio/fft.rs`'s `calculate_spectral_flux` (sum of positive
//! bin-to-bin differences against a stored previous spectrum) plus its
//! `volume_history`-style rolling buffer for normalization, capacity 20 per
//! default.

use std::collections::VecDeque;

pub struct FluxDetector {
    previous: Option<Vec<f32>>,
    history: VecDeque<f32>,
    capacity: usize,
}

impl FluxDetector {
    pub fn new(capacity: usize) -> Self {
        Self {
            previous: None,
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Raw (un-normalized) flux: sum of positive-going bin differences.
    fn raw_flux(previous: &[f32], spectrum: &[f32]) -> f32 {
        spectrum
            .iter()
            .zip(previous.iter())
            .map(|(&cur, &prev)| (cur - prev).max(0.0))
            .sum()
    }

    /// Update state from `spectrum` and return flux normalized against the
    /// rolling average of recent raw flux values. On the first call, with no
    /// prior column to difference against, returns 0.
    pub fn update(&mut self, spectrum: &[f32]) -> f32 {
        let raw = match &self.previous {
            Some(previous) => Self::raw_flux(previous, spectrum),
            None => 0.0,
        };
        self.previous = Some(spectrum.to_vec());

        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(raw);

        let avg = self.history.iter().sum::<f32>() / self.history.len() as f32;
        (raw / (avg + 1e-9)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_always_reports_zero_flux() {
        let mut det = FluxDetector::new(20);
        assert_eq!(det.update(&vec![5.0; 8]), 0.0);
    }

    #[test]
    fn identical_spectra_produce_zero_flux() {
        let mut det = FluxDetector::new(20);
        let spectrum = vec![0.5; 8];
        det.update(&spectrum);
        assert_eq!(det.update(&spectrum), 0.0);
    }

    #[test]
    fn sudden_increase_produces_positive_flux() {
        let mut det = FluxDetector::new(20);
        det.update(&vec![0.1; 8]);
        det.update(&vec![0.1; 8]);
        det.update(&vec![0.1; 8]);
        let flux = det.update(&vec![5.0; 8]);
        assert!(flux > 0.0);
    }

    #[test]
    fn decrease_alone_produces_zero_flux() {
        let mut det = FluxDetector::new(20);
        det.update(&vec![5.0; 8]);
        let flux = det.update(&vec![0.1; 8]);
        assert_eq!(flux, 0.0);
    }

    #[test]
    fn a_sharp_spike_against_a_quiet_history_can_exceed_unity() {
        let mut det = FluxDetector::new(20);
        for _ in 0..10 {
            det.update(&vec![0.01; 4]);
        }
        let flux = det.update(&vec![10.0; 4]);
        assert!(flux > 1.0, "expected an unclamped flux spike, got {flux}");
    }
}
