//! Debug Monitor: tracks frame timing, input signal health, beat/chroma
//! quality, and AGC reference peaks, and emits one summary log line every
//! `summary_interval` seconds.
//!
//! Grounded directly on `engine_v2/debug_monitor.py`'s `DebugMonitor`: same
//! rolling-deque metrics (frame times capped at 256, RMS/chroma samples
//! capped at 128), same counters reset after each summary, same discrete
//! `BEAT`/`CLIP` event log lines. The Python version used `print`; this
//! engine has a real logger, so summaries go out at `info!` and discrete
//! events at `debug!` rather than being gated behind a separate
//! `enable_event_logging` flag — turning them on or off is `RUST_LOG`'s job.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::packet::FeaturePacket;

const FRAME_TIME_CAPACITY: usize = 256;
const HEALTH_SAMPLE_CAPACITY: usize = 128;
const SILENCE_THRESHOLD_DB: f32 = -40.0;
const CLIP_THRESHOLD_DB: f32 = -3.0;
const CLIP_OUTPUT_THRESHOLD: f32 = 0.99;

pub struct DebugMonitor {
    summary_interval: Duration,
    last_summary: Instant,

    frame_times: VecDeque<Duration>,
    input_rms_samples: VecDeque<f32>,
    max_chroma_energies: VecDeque<f32>,
    chroma_sparsity_samples: VecDeque<f32>,

    beat_count: u32,
    clip_count: u32,
    silence_count: u32,
    command_count: u32,
    current_bpm: f32,
}

impl DebugMonitor {
    pub fn new(summary_interval_secs: f32) -> Self {
        Self {
            summary_interval: Duration::from_secs_f32(summary_interval_secs),
            last_summary: Instant::now(),
            frame_times: VecDeque::with_capacity(FRAME_TIME_CAPACITY),
            input_rms_samples: VecDeque::with_capacity(HEALTH_SAMPLE_CAPACITY),
            max_chroma_energies: VecDeque::with_capacity(HEALTH_SAMPLE_CAPACITY),
            chroma_sparsity_samples: VecDeque::with_capacity(HEALTH_SAMPLE_CAPACITY),
            beat_count: 0,
            clip_count: 0,
            silence_count: 0,
            command_count: 0,
            current_bpm: 0.0,
        }
    }

    /// Feed one processed frame's worth of results into the monitor, logging
    /// discrete events and, if the interval has elapsed, a summary line.
    pub fn update(&mut self, frame_time: Duration, packet: &FeaturePacket, raw_audio: &[f32], agc: AgcSnapshot) {
        self.current_bpm = packet.bpm;
        push_bounded(&mut self.frame_times, frame_time, FRAME_TIME_CAPACITY);

        let input_rms = rms(raw_audio);
        push_bounded(&mut self.input_rms_samples, input_rms, HEALTH_SAMPLE_CAPACITY);
        let input_db = to_db(input_rms);

        if input_db < SILENCE_THRESHOLD_DB {
            self.silence_count += 1;
        }

        if packet.low > CLIP_OUTPUT_THRESHOLD || packet.mid > CLIP_OUTPUT_THRESHOLD || packet.high > CLIP_OUTPUT_THRESHOLD {
            self.clip_count += 1;
            debug!(
                "CLIP | L:{:.2} M:{:.2} H:{:.2}",
                packet.low, packet.mid, packet.high
            );
        }

        if packet.is_beat {
            self.beat_count += 1;
            debug!("BEAT | BPM {:.1}", packet.bpm);
        }

        let max_chroma = packet.notes.iter().cloned().fold(0.0f32, f32::max);
        push_bounded(&mut self.max_chroma_energies, max_chroma, HEALTH_SAMPLE_CAPACITY);
        let sparsity = packet.notes.iter().filter(|&&n| n < 0.1).count() as f32 / 12.0 * 100.0;
        push_bounded(&mut self.chroma_sparsity_samples, sparsity, HEALTH_SAMPLE_CAPACITY);

        if self.last_summary.elapsed() >= self.summary_interval {
            self.print_summary(input_db, agc);
            self.reset_window_counters();
            self.last_summary = Instant::now();
        }
    }

    pub fn log_command(&mut self, key: &str, value: &serde_json::Value) {
        self.command_count += 1;
        debug!("CMD | {key}={value}");
    }

    fn print_summary(&self, input_db: f32, agc: AgcSnapshot) {
        let (fps, avg_latency_ms, max_latency_ms) = self.latency_stats();
        let beat_freq = self.beat_count as f32 / self.summary_interval.as_secs_f32();
        let max_chroma = average(&self.max_chroma_energies);
        let avg_sparsity = average(&self.chroma_sparsity_samples);

        let status = if input_db > CLIP_THRESHOLD_DB {
            "CLIP"
        } else if input_db < SILENCE_THRESHOLD_DB {
            "SILENCE"
        } else {
            "OK"
        };

        info!(
            "FPS: {fps:5.1} | Latency: {avg_latency_ms:5.1}ms (max {max_latency_ms:5.1}ms) | \
             Input: {input_db:6.1}dB | Beats: {beat_freq:4.1}/s (BPM: {:.0}) | \
             Notes: max={max_chroma:.2} sparse={avg_sparsity:5.1}% | \
             AGC: L:{:.2} M:{:.2} H:{:.2} | Cmds: {} | Status: {status}",
            self.current_bpm, agc.low, agc.mid, agc.high, self.command_count,
        );
    }

    fn latency_stats(&self) -> (f32, f32, f32) {
        if self.frame_times.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let total_ms: f32 = self.frame_times.iter().map(|d| d.as_secs_f32() * 1000.0).sum();
        let fps = self.frame_times.len() as f32 / (total_ms / 1000.0);
        let avg = total_ms / self.frame_times.len() as f32;
        let max = self
            .frame_times
            .iter()
            .map(|d| d.as_secs_f32() * 1000.0)
            .fold(0.0f32, f32::max);
        (fps, avg, max)
    }

    fn reset_window_counters(&mut self) {
        self.silence_count = 0;
        self.clip_count = 0;
        self.beat_count = 0;
        self.command_count = 0;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AgcSnapshot {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

fn push_bounded<T>(deque: &mut VecDeque<T>, value: T, capacity: usize) {
    if deque.len() >= capacity {
        deque.pop_front();
    }
    deque.push_back(value);
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|x| x * x).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

fn to_db(rms: f32) -> f32 {
    20.0 * rms.max(1e-10).log10()
}

fn average(samples: &VecDeque<f32>) -> f32 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f32>() / samples.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_packet() -> FeaturePacket {
        FeaturePacket {
            brightness: 0.0,
            flux: 0.0,
            low: 0.0,
            mid: 0.0,
            high: 0.0,
            bpm: 0.0,
            is_beat: false,
            notes: [0.0; 12],
        }
    }

    #[test]
    fn silence_is_detected_from_low_input_rms() {
        let mut monitor = DebugMonitor::new(100.0); // never auto-summarize in this test
        let quiet = vec![0.0; 1024];
        monitor.update(Duration::from_millis(1), &silent_packet(), &quiet, AgcSnapshot::default());
        assert_eq!(monitor.silence_count, 1);
    }

    #[test]
    fn clipping_output_increments_clip_count() {
        let mut monitor = DebugMonitor::new(100.0);
        let mut packet = silent_packet();
        packet.low = 1.0;
        monitor.update(Duration::from_millis(1), &packet, &vec![0.1; 16], AgcSnapshot::default());
        assert_eq!(monitor.clip_count, 1);
    }

    #[test]
    fn beat_packets_increment_beat_count() {
        let mut monitor = DebugMonitor::new(100.0);
        let mut packet = silent_packet();
        packet.is_beat = true;
        packet.bpm = 128.0;
        monitor.update(Duration::from_millis(1), &packet, &vec![0.1; 16], AgcSnapshot::default());
        assert_eq!(monitor.beat_count, 1);
    }

    #[test]
    fn counters_reset_after_a_summary_is_printed() {
        let mut monitor = DebugMonitor::new(0.0); // interval already elapsed every call
        let mut packet = silent_packet();
        packet.is_beat = true;
        monitor.update(Duration::from_millis(1), &packet, &vec![0.1; 16], AgcSnapshot::default());
        assert_eq!(monitor.beat_count, 0);
    }

    #[test]
    fn frame_time_history_is_capped() {
        let mut monitor = DebugMonitor::new(100.0);
        for _ in 0..(FRAME_TIME_CAPACITY + 10) {
            monitor.update(Duration::from_millis(2), &silent_packet(), &vec![0.0; 16], AgcSnapshot::default());
        }
        assert_eq!(monitor.frame_times.len(), FRAME_TIME_CAPACITY);
    }
}
