//! Maps the harmonic spectrum's bins onto the 12 pitch classes and emits one
//! of three normalization modes: `fixed` (dBFS window against a constant
//! reference), `competitive` (divide by a decaying "spotlight peak", then
//! square), `statistical` (log-ratio against the note AGC's reference).
//!
//! Bin-to-pitch-class mapping follows the standard MIDI/FFT relationship
//! (`midi = 69 + 12*log2(f/440)`). No existing module computes chroma
//! directly, so this is built directly from the functional description,
//! confirmed against `analyzer.py`'s chroma normalization branch.

use crate::params::NormMode;

pub const N_PITCH_CLASSES: usize = 12;

/// Precomputed bin -> pitch-class table, built once per sample rate/FFT size.
pub struct ChromaMapper {
    bin_to_class: Vec<Option<usize>>,
}

impl ChromaMapper {
    pub fn new(n_bins: usize, fft_size: usize, sample_rate: f32) -> Self {
        let bin_width = sample_rate / fft_size as f32;
        let bin_to_class = (0..n_bins)
            .map(|bin| {
                let freq = bin as f32 * bin_width;
                pitch_class_of(freq)
            })
            .collect();
        Self { bin_to_class }
    }

    /// Sum magnitude into its pitch class; bin 0 (DC) and bins below audible
    /// pitch range have no mapped class and are skipped.
    pub fn aggregate(&self, spectrum: &[f32]) -> [f32; N_PITCH_CLASSES] {
        let mut classes = [0.0f32; N_PITCH_CLASSES];
        for (bin, &mag) in spectrum.iter().enumerate() {
            if let Some(Some(class)) = self.bin_to_class.get(bin) {
                classes[*class] += mag;
            }
        }
        classes
    }
}

/// `None` for frequencies too low to carry a meaningful pitch (below ~20 Hz,
/// where the MIDI mapping formula degenerates).
fn pitch_class_of(freq: f32) -> Option<usize> {
    if freq < 20.0 {
        return None;
    }
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    let class = (midi.round() as i64).rem_euclid(12) as usize;
    Some(class)
}

/// dBFS window the `fixed` mode clips to before mapping linearly to `[0, 1]`.
const FIXED_MIN_DB: f32 = -60.0;
const FIXED_MAX_DB: f32 = -12.0;

/// Per-frame decay applied to the `competitive` mode's spotlight peak when
/// the current frame doesn't raise it.
const SPOTLIGHT_DECAY: f32 = 0.85;
const SPOTLIGHT_FLOOR: f32 = 1e-6;

/// `fixed` mode's dBFS reference: half of `n_fft`, the energy-domain
/// normalization the magnitude spectrum was built against.
pub struct ChromaNormalizer {
    fixed_reference: f32,
    spotlight_peak: f32,
}

impl ChromaNormalizer {
    pub fn new(n_fft: usize) -> Self {
        Self {
            fixed_reference: n_fft as f32 / 2.0,
            spotlight_peak: SPOTLIGHT_FLOOR,
        }
    }

    /// `note_agc_reference` is the note AGC's current reference ceiling
    /// (`AgcTracker::update`'s return value for this frame), the ceiling the
    /// `statistical` mode normalizes against.
    pub fn normalize(
        &mut self,
        classes: &[f32; N_PITCH_CLASSES],
        mode: NormMode,
        note_agc_reference: f32,
    ) -> [f32; N_PITCH_CLASSES] {
        match mode {
            NormMode::Fixed => {
                let mut out = [0.0; N_PITCH_CLASSES];
                for (o, &v) in out.iter_mut().zip(classes.iter()) {
                    let db = 20.0 * (v.max(1e-9) / self.fixed_reference).log10();
                    let clipped = db.clamp(FIXED_MIN_DB, FIXED_MAX_DB);
                    *o = (clipped - FIXED_MIN_DB) / (FIXED_MAX_DB - FIXED_MIN_DB);
                }
                out
            }
            NormMode::Competitive => {
                let frame_max = classes.iter().cloned().fold(0.0f32, f32::max);
                self.spotlight_peak = frame_max.max(self.spotlight_peak * SPOTLIGHT_DECAY).max(SPOTLIGHT_FLOOR);
                let mut out = [0.0; N_PITCH_CLASSES];
                for (o, &v) in out.iter_mut().zip(classes.iter()) {
                    let ratio = (v / self.spotlight_peak).clamp(0.0, 1.0);
                    *o = ratio * ratio;
                }
                out
            }
            NormMode::Statistical => {
                let reference = note_agc_reference.max(1e-6);
                let mut out = [0.0; N_PITCH_CLASSES];
                for (o, &v) in out.iter_mut().zip(classes.iter()) {
                    let rel = (v + 1e-6) / reference;
                    let norm = (rel.log10() + 1.5) / 1.5;
                    *o = norm.clamp(0.0, 1.0).powi(4);
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_440hz_maps_to_pitch_class_a() {
        // A440 is MIDI note 69, pitch class 9 (A).
        assert_eq!(pitch_class_of(440.0), Some(9));
    }

    #[test]
    fn c4_maps_to_pitch_class_c() {
        // C4 ~261.63 Hz, pitch class 0.
        assert_eq!(pitch_class_of(261.63), Some(0));
    }

    #[test]
    fn dc_and_subsonic_bins_have_no_class() {
        assert_eq!(pitch_class_of(0.0), None);
        assert_eq!(pitch_class_of(5.0), None);
    }

    #[test]
    fn octave_equivalence_maps_to_same_class() {
        assert_eq!(pitch_class_of(220.0), pitch_class_of(440.0));
        assert_eq!(pitch_class_of(880.0), pitch_class_of(440.0));
    }

    #[test]
    fn competitive_mode_always_has_a_unit_peak() {
        let mut norm = ChromaNormalizer::new(1024);
        let mut classes = [0.0; N_PITCH_CLASSES];
        classes[3] = 0.7;
        classes[9] = 0.35;
        let out = norm.normalize(&classes, NormMode::Competitive, 1.0);
        assert!((out[3] - 1.0).abs() < 1e-6);
        // Half the peak, squared for contrast: (0.5)^2 = 0.25.
        assert!((out[9] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn fixed_mode_loud_bin_saturates_at_one() {
        let mut norm = ChromaNormalizer::new(1024);
        let mut classes = [0.0; N_PITCH_CLASSES];
        classes[0] = 200.0;
        let out = norm.normalize(&classes, NormMode::Fixed, 1.0);
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn fixed_mode_quiet_bin_floors_at_zero() {
        let mut norm = ChromaNormalizer::new(1024);
        let mut classes = [0.0; N_PITCH_CLASSES];
        classes[0] = 1e-12;
        let out = norm.normalize(&classes, NormMode::Fixed, 1.0);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn statistical_mode_favors_a_dominant_class_over_the_agc_reference() {
        let mut norm = ChromaNormalizer::new(1024);
        let mut classes = [0.0; N_PITCH_CLASSES];
        classes[0] = 1.0;
        classes[1] = 0.01;
        let out = norm.normalize(&classes, NormMode::Statistical, 1.0);
        assert!(out[0] > 0.5, "dominant class should read strongly above midscale: {}", out[0]);
        assert!(out[0] > 2.0 * out[1]);
    }
}
