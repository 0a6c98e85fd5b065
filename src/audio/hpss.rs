//! Harmonic/Percussive Source Separation by separable median filtering
//! a harmonic estimate from median-filtering along time (each
//! frequency bin's own history) and a percussive estimate from
//! median-filtering along frequency (each frame's own spectrum), both with
//! kernel size 31 and nearest-edge clamping at the array boundary.
//!
//! No single existing module does HPSS — `audio/fft.rs` only tracks a single
//! previous spectrum for flux, not a running window — so this is built from
//! the algorithm definition directly, in the same free-function-plus-
//! small-struct style `audio/fft.rs` uses (`extract_frequency_bands`,
//! `calculate_spectral_flux`, etc. are all standalone numeric passes over a
//! spectrum, not trait objects or generic combinators).

use super::spectrogram::Spectrogram;

pub const KERNEL_SIZE: usize = 31;

pub struct HpssResult {
    pub harmonic: Spectrogram,
    pub percussive: Spectrogram,
}

/// Median-filter `spec` along both axes and return the harmonic (time-axis)
/// and percussive (frequency-axis) components.
pub fn separate(spec: &Spectrogram) -> HpssResult {
    HpssResult {
        harmonic: median_filter_time_axis(spec),
        percussive: median_filter_frequency_axis(spec),
    }
}

/// For each bin, median-filter across frames (its own time history).
fn median_filter_time_axis(spec: &Spectrogram) -> Spectrogram {
    let mut out = vec![0.0f32; spec.bins.len()];
    let half = (KERNEL_SIZE / 2) as isize;
    let mut window = Vec::with_capacity(KERNEL_SIZE);

    for bin in 0..spec.n_bins {
        for frame in 0..spec.n_frames {
            window.clear();
            for k in -half..=half {
                let f = clamp_index(frame as isize + k, spec.n_frames);
                window.push(spec.bins[f * spec.n_bins + bin]);
            }
            out[frame * spec.n_bins + bin] = median(&mut window);
        }
    }

    Spectrogram { n_bins: spec.n_bins, n_frames: spec.n_frames, bins: out }
}

/// For each frame, median-filter across bins (its own spectral neighborhood).
fn median_filter_frequency_axis(spec: &Spectrogram) -> Spectrogram {
    let mut out = vec![0.0f32; spec.bins.len()];
    let half = (KERNEL_SIZE / 2) as isize;
    let mut window = Vec::with_capacity(KERNEL_SIZE);

    for frame in 0..spec.n_frames {
        let row = spec.frame(frame);
        for bin in 0..spec.n_bins {
            window.clear();
            for k in -half..=half {
                let b = clamp_index(bin as isize + k, spec.n_bins);
                window.push(row[b]);
            }
            out[frame * spec.n_bins + bin] = median(&mut window);
        }
    }

    Spectrogram { n_bins: spec.n_bins, n_frames: spec.n_frames, bins: out }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

fn median(window: &mut [f32]) -> f32 {
    window.sort_by(|a, b| a.partial_cmp(b).unwrap());
    window[window.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_spectrogram(n_bins: usize, n_frames: usize, value: f32) -> Spectrogram {
        Spectrogram { n_bins, n_frames, bins: vec![value; n_bins * n_frames] }
    }

    #[test]
    fn constant_spectrogram_is_unchanged_by_either_filter() {
        let spec = flat_spectrogram(8, 10, 0.5);
        let result = separate(&spec);
        assert!(result.harmonic.bins.iter().all(|&v| (v - 0.5).abs() < 1e-6));
        assert!(result.percussive.bins.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn isolated_time_spike_is_suppressed_by_harmonic_filter() {
        let mut spec = flat_spectrogram(4, 40, 0.0);
        // A single loud frame at index 20, all bins.
        for bin in 0..4 {
            spec.bins[20 * 4 + bin] = 10.0;
        }
        let result = separate(&spec);
        // Harmonic (time-median) should suppress the isolated spike.
        assert!(result.harmonic.frame(20)[0] < 1.0);
    }

    #[test]
    fn isolated_frequency_spike_is_suppressed_by_percussive_filter() {
        let mut spec = flat_spectrogram(40, 4, 0.0);
        for frame in 0..4 {
            spec.bins[frame * 40 + 20] = 10.0;
        }
        let result = separate(&spec);
        assert!(result.percussive.frame(0)[20] < 1.0);
    }

    #[test]
    fn boundary_frames_use_clamped_edge_values() {
        let spec = flat_spectrogram(2, 2, 1.0);
        let result = separate(&spec);
        assert!(result.harmonic.bins.iter().all(|v| v.is_finite()));
        assert!(result.percussive.bins.iter().all(|v| v.is_finite()));
    }
}
