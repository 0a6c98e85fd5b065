//! Three fixed 4th-order IIR band filters (low/mid/high), each a cascade of
//! two biquad sections for numerical stability, operating on the newest frame
//! only. Filter state carries across frames to avoid boundary artifacts.
//!
//! Biquad coefficient formulas and the Transposed Direct Form II structure are
//! grounded on `rf-dsp/src/biquad.rs`; here they're scalar `f32` (the engine
//! runs single-threaded on one frame at a time, so the SIMD variant there buys
//! nothing) and limited to the low/high-pass shapes the filterbank needs.

use std::f32::consts::PI;

const SQRT2_OVER_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy)]
struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl BiquadCoeffs {
    fn lowpass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    fn highpass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Transposed Direct Form II biquad section.
#[derive(Debug, Clone, Copy)]
struct BiquadTdf2 {
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
}

impl BiquadTdf2 {
    fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }
}

/// A two-section cascade realizing a 4th-order filter (matching
/// `scipy.signal.butter(4, ..., output="sos")`'s two second-order sections).
struct Cascade {
    sections: Vec<BiquadTdf2>,
}

impl Cascade {
    fn lowpass(freq: f32, sample_rate: f32) -> Self {
        Self {
            sections: vec![
                BiquadTdf2::new(BiquadCoeffs::lowpass(freq, SQRT2_OVER_2, sample_rate)),
                BiquadTdf2::new(BiquadCoeffs::lowpass(freq, SQRT2_OVER_2, sample_rate)),
            ],
        }
    }

    fn highpass(freq: f32, sample_rate: f32) -> Self {
        Self {
            sections: vec![
                BiquadTdf2::new(BiquadCoeffs::highpass(freq, SQRT2_OVER_2, sample_rate)),
                BiquadTdf2::new(BiquadCoeffs::highpass(freq, SQRT2_OVER_2, sample_rate)),
            ],
        }
    }

    /// Band-pass built as low-cut cascaded with high-cut, giving a flat
    /// passband between the two cutoffs.
    fn bandpass(low_freq: f32, high_freq: f32, sample_rate: f32) -> Self {
        Self {
            sections: vec![
                BiquadTdf2::new(BiquadCoeffs::highpass(low_freq, SQRT2_OVER_2, sample_rate)),
                BiquadTdf2::new(BiquadCoeffs::lowpass(high_freq, SQRT2_OVER_2, sample_rate)),
            ],
        }
    }

    fn process(&mut self, samples: &[f32], out: &mut [f32]) {
        for (i, &x) in samples.iter().enumerate() {
            let mut v = x;
            for section in &mut self.sections {
                v = section.process_sample(v);
            }
            out[i] = v;
        }
    }
}

/// The three fixed band filters plus per-frame RMS extraction.
pub struct Filterbank {
    low: Cascade,
    mid: Cascade,
    high: Cascade,
    scratch: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawBandEnergy {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl Filterbank {
    pub fn new(chunk: usize, sample_rate: f32) -> Self {
        Self {
            low: Cascade::lowpass(150.0, sample_rate),
            mid: Cascade::bandpass(150.0, 4000.0, sample_rate),
            high: Cascade::highpass(4000.0, sample_rate),
            scratch: vec![0.0; chunk],
        }
    }

    /// RMS of each band filter's response to the newest frame.
    pub fn process_bands(&mut self, frame: &[f32]) -> RawBandEnergy {
        debug_assert_eq!(frame.len(), self.scratch.len());

        self.low.process(frame, &mut self.scratch);
        let low = rms(&self.scratch);

        self.mid.process(frame, &mut self.scratch);
        let mid = rms(&self.scratch);

        self.high.process(frame, &mut self.scratch);
        let high = rms(&self.scratch);

        RawBandEnergy { low, mid, high }
    }
}

fn rms(samples: &[f32]) -> f32 {
    let sum_sq: f32 = samples.iter().map(|x| x * x).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
