//! Onset-based beat and tempo detection: an onset fires when
//! flux-derived energy exceeds an adaptive threshold and enough time has
//! passed since the last onset; a rolling window of recent inter-onset
//! intervals is averaged into a BPM estimate.
//!
//! Onset thresholding (rolling mean + scaled std-dev, minimum interval gate)
//! is grounded on `audio/beat_detector.rs`'s `BeatDetector::detect_beat`;
//! interval-to-BPM averaging is grounded on `audio/fft.rs`'s `TempoDetector`.
//! Unlike `TempoDetector`, which seeds `estimated_bpm` at a guessed 120.0,
//! `bpm()` here reports `0.0` until the first real interval lands — a
//! fabricated default would otherwise be indistinguishable from a genuine
//! detection by any downstream consumer.

use std::collections::VecDeque;

pub struct TempoTracker {
    energy_history: VecDeque<f32>,
    history_size: usize,
    min_beat_interval: f32,
    max_beat_interval: f32,
    time: f32,
    last_beat_time: Option<f32>,
    beat_intervals: VecDeque<f32>,
    interval_window: usize,
    bpm: f32,
}

impl TempoTracker {
    pub fn new(fps: f32) -> Self {
        let history_size = (fps * 0.5).max(10.0) as usize;
        Self {
            energy_history: VecDeque::with_capacity(history_size),
            history_size,
            min_beat_interval: 0.25, // 240 BPM ceiling
            max_beat_interval: 2.0,  // 30 BPM floor
            time: 0.0,
            last_beat_time: None,
            beat_intervals: VecDeque::with_capacity(8),
            interval_window: 8,
            bpm: 0.0,
        }
    }

    /// `onset_energy` is a non-negative scalar (spectral flux works well);
    /// `dt` is the time elapsed since the previous call. Returns whether this
    /// frame registered a beat.
    pub fn update(&mut self, onset_energy: f32, dt: f32) -> bool {
        self.time += dt;

        if self.energy_history.len() >= self.history_size {
            self.energy_history.pop_front();
        }
        self.energy_history.push_back(onset_energy);

        if self.energy_history.len() < 10 {
            return false;
        }

        let mean = self.energy_history.iter().sum::<f32>() / self.energy_history.len() as f32;
        let variance = self
            .energy_history
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f32>()
            / self.energy_history.len() as f32;
        let threshold = mean + variance.sqrt() * 1.5;

        let since_last = self
            .last_beat_time
            .map(|t| self.time - t)
            .unwrap_or(f32::INFINITY);

        let is_onset = onset_energy > threshold && onset_energy > 1e-4 && since_last > self.min_beat_interval;

        if is_onset {
            if let Some(last) = self.last_beat_time {
                let interval = self.time - last;
                if interval >= self.min_beat_interval && interval <= self.max_beat_interval {
                    if self.beat_intervals.len() >= self.interval_window {
                        self.beat_intervals.pop_front();
                    }
                    self.beat_intervals.push_back(interval);

                    let avg: f32 =
                        self.beat_intervals.iter().sum::<f32>() / self.beat_intervals.len() as f32;
                    self.bpm = 60.0 / avg;
                }
            }
            self.last_beat_time = Some(self.time);
        }

        // A beat only reports as such once a real BPM has been established —
        // the very first onset has no prior interval to confirm it.
        is_onset && self.bpm > 0.0
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warm_up(tracker: &mut TempoTracker, dt: f32) {
        for _ in 0..15 {
            tracker.update(0.01, dt);
        }
    }

    #[test]
    fn silence_never_reports_a_beat() {
        let mut tracker = TempoTracker::new(46.875);
        for _ in 0..200 {
            assert!(!tracker.update(0.0, 1.0 / 46.875));
        }
        assert_eq!(tracker.bpm(), 0.0);
    }

    #[test]
    fn regular_pulses_converge_to_their_true_bpm() {
        let dt = 1.0 / 46.875;
        let mut tracker = TempoTracker::new(46.875);
        warm_up(&mut tracker, dt);

        // 120 BPM => 0.5s between pulses.
        let pulse_interval = 0.5;
        let mut elapsed = 0.0;
        let mut beats = 0;
        for _ in 0..400 {
            elapsed += dt;
            let energy = if elapsed >= pulse_interval {
                elapsed = 0.0;
                1.0
            } else {
                0.01
            };
            if tracker.update(energy, dt) {
                beats += 1;
            }
        }
        assert!(beats > 0, "expected at least one confirmed beat");
        assert!((tracker.bpm() - 120.0).abs() < 10.0, "bpm = {}", tracker.bpm());
    }

    #[test]
    fn first_onset_never_reports_as_a_beat() {
        let dt = 1.0 / 46.875;
        let mut tracker = TempoTracker::new(46.875);
        warm_up(&mut tracker, dt);
        assert!(!tracker.update(1.0, dt));
    }

    #[test]
    fn onsets_closer_than_minimum_interval_are_ignored() {
        let dt = 1.0 / 46.875;
        let mut tracker = TempoTracker::new(46.875);
        warm_up(&mut tracker, dt);
        tracker.update(1.0, dt);
        // Immediately pulse again, well inside the minimum interval.
        let beat = tracker.update(1.0, dt);
        assert!(!beat);
    }
}
