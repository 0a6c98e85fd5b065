//! Parameter Store: a fixed-schema table of tunable scalars, shared
//! single-writer (Command Listener) / single-reader (Pipeline Driver).
//!
//! Backed by `atomic_float::AtomicF32` per key, the same crate
//! `Cmdv-nih_plug_spectrum_analyser` uses for lock-free audio-thread-safe
//! parameter reads — a coarse `RwLock<HashMap<..>>` would also work here,
//! but per-key atomics are the preferred shape it names.

use std::sync::atomic::{AtomicU8, Ordering};

use atomic_float::AtomicF32;

const RELAXED: Ordering = Ordering::Relaxed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormMode {
    Fixed,
    Competitive,
    Statistical,
}

impl NormMode {
    fn from_code(code: u8) -> Self {
        match code {
            0 => NormMode::Fixed,
            1 => NormMode::Competitive,
            _ => NormMode::Statistical,
        }
    }

    fn to_code(self) -> u8 {
        match self {
            NormMode::Fixed => 0,
            NormMode::Competitive => 1,
            NormMode::Statistical => 2,
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(NormMode::Fixed),
            "competitive" => Some(NormMode::Competitive),
            "statistical" => Some(NormMode::Statistical),
            _ => None,
        }
    }
}

struct GainParam {
    value: AtomicF32,
    min: f32,
    max: f32,
}

impl GainParam {
    fn new(default: f32, min: f32, max: f32) -> Self {
        Self {
            value: AtomicF32::new(default),
            min,
            max,
        }
    }

    fn get(&self) -> f32 {
        self.value.load(RELAXED)
    }

    fn set(&self, v: f32) {
        self.value.store(v.clamp(self.min, self.max), RELAXED);
    }
}

/// The shared, wait-free table of recognized parameter keys.
pub struct ParameterStore {
    low_gain: GainParam,
    mid_gain: GainParam,
    high_gain: GainParam,
    flux_sens: GainParam,
    norm_mode: AtomicU8,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            low_gain: GainParam::new(0.8, 0.0, 10.0),
            mid_gain: GainParam::new(0.8, 0.0, 10.0),
            high_gain: GainParam::new(0.8, 0.0, 10.0),
            flux_sens: GainParam::new(1.0, 0.0, 10.0),
            norm_mode: AtomicU8::new(NormMode::Statistical.to_code()),
        }
    }

    pub fn low_gain(&self) -> f32 {
        self.low_gain.get()
    }

    pub fn mid_gain(&self) -> f32 {
        self.mid_gain.get()
    }

    pub fn high_gain(&self) -> f32 {
        self.high_gain.get()
    }

    pub fn flux_sens(&self) -> f32 {
        self.flux_sens.get()
    }

    pub fn norm_mode(&self) -> NormMode {
        NormMode::from_code(self.norm_mode.load(RELAXED))
    }

    /// Apply one parsed JSON key/value pair. Unknown keys are ignored;
    /// out-of-range values are clamped; type mismatches are ignored silently —
    /// this is the only write path into the store.
    pub fn apply(&self, key: &str, value: &serde_json::Value) {
        match key {
            "low_gain" => {
                if let Some(v) = value.as_f64() {
                    self.low_gain.set(v as f32);
                }
            }
            "mid_gain" => {
                if let Some(v) = value.as_f64() {
                    self.mid_gain.set(v as f32);
                }
            }
            "high_gain" => {
                if let Some(v) = value.as_f64() {
                    self.high_gain.set(v as f32);
                }
            }
            "flux_sens" => {
                if let Some(v) = value.as_f64() {
                    self.flux_sens.set(v as f32);
                }
            }
            "norm_mode" => {
                if let Some(s) = value.as_str() {
                    if let Some(mode) = NormMode::from_str(s) {
                        self.norm_mode.store(mode.to_code(), RELAXED);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_spec_table() {
        let store = ParameterStore::new();
        assert_eq!(store.low_gain(), 0.8);
        assert_eq!(store.mid_gain(), 0.8);
        assert_eq!(store.high_gain(), 0.8);
        assert_eq!(store.flux_sens(), 1.0);
        assert_eq!(store.norm_mode(), NormMode::Statistical);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let store = ParameterStore::new();
        store.apply("low_gain", &json!(50.0));
        assert_eq!(store.low_gain(), 10.0);
        store.apply("low_gain", &json!(-5.0));
        assert_eq!(store.low_gain(), 0.0);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let store = ParameterStore::new();
        store.apply("not_a_real_key", &json!(1.0));
        assert_eq!(store.low_gain(), 0.8);
    }

    #[test]
    fn norm_mode_accepts_only_the_three_strings() {
        let store = ParameterStore::new();
        store.apply("norm_mode", &json!("fixed"));
        assert_eq!(store.norm_mode(), NormMode::Fixed);
        store.apply("norm_mode", &json!("bogus"));
        assert_eq!(store.norm_mode(), NormMode::Fixed);
        store.apply("norm_mode", &json!("competitive"));
        assert_eq!(store.norm_mode(), NormMode::Competitive);
    }

    #[test]
    fn wrong_typed_value_is_ignored() {
        let store = ParameterStore::new();
        store.apply("low_gain", &json!("not a number"));
        assert_eq!(store.low_gain(), 0.8);
    }
}
