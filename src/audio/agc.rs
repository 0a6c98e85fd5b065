//! Automatic Gain Control: a per-tracker bounded history of recent peaks, a
//! slowly-decaying reference ceiling, and fast-attack/slow-decay update rule
//!
//!
//! No equivalent survives in `original_source` (the AGC step was one of the
//! features the distillation added relative to the plain Python engine), so
//! this is grounded structurally on `audio/feature_normalizer.rs`'s
//! `ObservedRanges` — a running-statistics tracker updated once per frame from
//! raw feature values — generalized from "track an observed max" to "track a
//! percentile of recent peaks with asymmetric attack/decay".

use std::collections::VecDeque;

pub struct AgcTracker {
    history: VecDeque<f32>,
    history_len: usize,
    percentile: u32,
    peak_decay: f32,
    attack_rate: f32,
    peak_floor: f32,
    reference: f32,
    scratch: Vec<f32>,
}

impl AgcTracker {
    /// `fps` is the engine frame rate (`sample_rate / chunk`), used to convert
    /// the human-facing time constants into per-frame rates.
    pub fn new(percentile: u32, half_life_seconds: f32, attack_time_seconds: f32, history_seconds: f32, fps: f32) -> Self {
        let history_len = (history_seconds * fps).floor().max(1.0) as usize;
        let peak_decay = 0.5f32.powf(1.0 / (half_life_seconds * fps));
        let attack_rate = (1.0 / (attack_time_seconds * fps)).min(1.0);
        let peak_floor = 0.01;

        Self {
            history: VecDeque::with_capacity(history_len),
            history_len,
            percentile,
            peak_decay,
            attack_rate,
            peak_floor,
            reference: peak_floor,
            scratch: Vec::with_capacity(history_len),
        }
    }

    /// Convenience constructor matching the named instances, which
    /// pass an integer `history_seconds`.
    pub fn with_history_secs(percentile: u32, half_life_seconds: f32, attack_time_seconds: f32, history_seconds: u32, fps: f32) -> Self {
        Self::new(percentile, half_life_seconds, attack_time_seconds, history_seconds as f32, fps)
    }

    /// Push `max(v)` into the history FIFO and update the reference ceiling.
    /// Returns the new reference.
    pub fn update(&mut self, v: &[f32]) -> f32 {
        let peak = v.iter().cloned().fold(f32::MIN, f32::max);
        self.push_peak(peak);

        let target = self.percentile_of_history(self.percentile).max(self.peak_floor);

        if target > self.reference {
            self.reference += (target - self.reference) * self.attack_rate;
        } else {
            self.reference = (self.reference * self.peak_decay).max(self.peak_floor);
        }
        self.reference
    }

    pub fn reference(&self) -> f32 {
        self.reference
    }

    fn push_peak(&mut self, peak: f32) {
        if self.history.len() >= self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(peak);
    }

    fn percentile_of_history(&mut self, percentile: u32) -> f32 {
        if self.history.is_empty() {
            return self.peak_floor;
        }
        self.scratch.clear();
        self.scratch.extend(self.history.iter().copied());
        self.scratch.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let n = self.scratch.len();
        let rank = ((percentile as f32 / 100.0) * (n - 1) as f32).round() as usize;
        self.scratch[rank.min(n - 1)]
    }
}
