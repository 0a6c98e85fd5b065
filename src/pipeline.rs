//! Pipeline Driver: binds every per-frame step into one `process_frame` call —
//! ring buffer, filterbank, STFT/HPSS, chroma, brightness, flux, tempo, AGC,
//! and the outbound transmit — and owns the shared `ParameterStore` and
//! `DebugMonitor`.
//!
//! The step order and per-feature formulas are grounded on
//! `engine_v2/analyzer.py`'s `AudioAnalyzer.process`: update the ring buffer,
//! run the spectral decomposition, derive band/brightness/flux/chroma off
//! the newest frame, run beat detection. Error handling is new: the Python
//! version has no fatal/recoverable distinction at all (a NaN just propagates
//! silently into the packet); here a non-finite result for any step logs a
//! warning and drops the whole frame rather than transmitting bad data.

use std::sync::Arc;
use std::time::Instant;

use log::warn;

use crate::audio::{
    agc::AgcTracker, brightness, chroma::ChromaMapper, chroma::ChromaNormalizer, filterbank::Filterbank,
    flux::FluxDetector, hpss, ring_buffer::RingBuffer, source::CaptureSource, spectrogram::StftAnalyzer,
    tempo::TempoTracker,
};
use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::monitor::{AgcSnapshot, DebugMonitor};
use crate::net::Transmitter;
use crate::packet::FeaturePacket;
use crate::params::ParameterStore;

const NOTE_AGC_PERCENTILE: u32 = 90;
const NOTE_AGC_HALF_LIFE_SECS: f32 = 15.0;
const NOTE_AGC_ATTACK_SECS: f32 = 0.1;
const NOTE_AGC_HISTORY_SECS: u32 = 4;

const BAND_AGC_PERCENTILE: u32 = 90;
const BAND_AGC_HALF_LIFE_SECS: f32 = 15.0;
const BAND_AGC_ATTACK_SECS: f32 = 0.1;
const BAND_AGC_HISTORY_SECS: u32 = 10;

const FLUX_HISTORY_CAPACITY: usize = 20;

pub struct PipelineDriver {
    config: Config,
    fps: f32,
    bin_width: f32,

    ring_buffer: RingBuffer,
    filterbank: Filterbank,
    stft: StftAnalyzer,
    chroma_mapper: ChromaMapper,
    chroma_normalizer: ChromaNormalizer,
    flux_detector: FluxDetector,
    tempo: TempoTracker,

    low_agc: AgcTracker,
    mid_agc: AgcTracker,
    high_agc: AgcTracker,
    note_agc: AgcTracker,

    params: Arc<ParameterStore>,
    monitor: DebugMonitor,
    transmitter: Transmitter,
}

impl PipelineDriver {
    pub fn new(config: Config, params: Arc<ParameterStore>) -> EngineResult<Self> {
        let sample_rate = config.sample_rate as f32;
        let fps = sample_rate / config.chunk as f32;
        let n_fft = config.n_fft();
        let n_bins = n_fft / 2 + 1;

        let transmitter = Transmitter::connect(config.engine_addr)?;

        Ok(Self {
            fps,
            bin_width: sample_rate / n_fft as f32,

            ring_buffer: RingBuffer::new(config.chunk, config.window_chunks),
            filterbank: Filterbank::new(config.chunk, sample_rate),
            stft: StftAnalyzer::new(n_fft, config.hop()),
            chroma_mapper: ChromaMapper::new(n_bins, n_fft, sample_rate),
            chroma_normalizer: ChromaNormalizer::new(n_fft),
            flux_detector: FluxDetector::new(FLUX_HISTORY_CAPACITY),
            tempo: TempoTracker::new(fps),

            low_agc: AgcTracker::with_history_secs(
                BAND_AGC_PERCENTILE, BAND_AGC_HALF_LIFE_SECS, BAND_AGC_ATTACK_SECS, BAND_AGC_HISTORY_SECS, fps,
            ),
            mid_agc: AgcTracker::with_history_secs(
                BAND_AGC_PERCENTILE, BAND_AGC_HALF_LIFE_SECS, BAND_AGC_ATTACK_SECS, BAND_AGC_HISTORY_SECS, fps,
            ),
            high_agc: AgcTracker::with_history_secs(
                BAND_AGC_PERCENTILE, BAND_AGC_HALF_LIFE_SECS, BAND_AGC_ATTACK_SECS, BAND_AGC_HISTORY_SECS, fps,
            ),
            note_agc: AgcTracker::with_history_secs(
                NOTE_AGC_PERCENTILE, NOTE_AGC_HALF_LIFE_SECS, NOTE_AGC_ATTACK_SECS, NOTE_AGC_HISTORY_SECS, fps,
            ),

            params,
            monitor: DebugMonitor::new(config.summary_interval_secs),
            transmitter,
            config,
        })
    }

    /// Drive the pipeline to completion, reading frames from `source` until
    /// it reports a fatal device error.
    pub fn run(&mut self, source: &mut dyn CaptureSource) -> EngineResult<()> {
        loop {
            let frame = source.read().ok_or(EngineError::Device(
                "capture source closed unexpectedly".into(),
            ))?;
            if let Err(e) = self.process_frame(&frame) {
                warn!("dropping frame: {e}");
            }
        }
    }

    /// Run one capture frame through every pipeline stage, transmitting a
    /// `FeaturePacket` on success.
    pub fn process_frame(&mut self, frame: &[f32]) -> EngineResult<()> {
        let started = Instant::now();
        debug_assert_eq!(frame.len(), self.config.chunk);

        self.ring_buffer.append(frame);

        let raw_bands = self.filterbank.process_bands(frame);
        let low_gain = self.params.low_gain();
        let mid_gain = self.params.mid_gain();
        let high_gain = self.params.high_gain();
        let low = apply_band_gain(raw_bands.low, low_gain, &mut self.low_agc);
        let mid = apply_band_gain(raw_bands.mid, mid_gain, &mut self.mid_agc);
        let high = apply_band_gain(raw_bands.high, high_gain, &mut self.high_agc);

        let spectrogram = self.stft.analyze(self.ring_buffer.snapshot());
        let hpss_result = hpss::separate(&spectrogram);

        let raw_spectrum = spectrogram.last_frame();
        let brightness_value = brightness::brightness(raw_spectrum, self.bin_width);

        let percussive = hpss_result.percussive.last_frame();
        let flux_raw = self.flux_detector.update(percussive);
        let flux = (flux_raw * self.params.flux_sens()).max(0.0);

        let harmonic = hpss_result.harmonic.last_frame();
        let classes = self.chroma_mapper.aggregate(harmonic);
        let note_agc_reference = self.note_agc.update(&classes);
        let notes = self.chroma_normalizer.normalize(&classes, self.params.norm_mode(), note_agc_reference);

        let dt = 1.0 / self.fps;
        let is_beat = self.tempo.update(flux_raw, dt);
        let bpm = self.tempo.bpm();

        let packet = FeaturePacket {
            brightness: brightness_value,
            flux,
            low,
            mid,
            high,
            bpm,
            is_beat,
            notes,
        };

        if !packet_is_finite(&packet) {
            warn!("non-finite values in computed feature packet; dropping frame");
            return Ok(());
        }

        self.transmitter.send(&packet);

        let agc_snapshot = AgcSnapshot {
            low: self.low_agc.reference(),
            mid: self.mid_agc.reference(),
            high: self.high_agc.reference(),
        };
        self.monitor.update(started.elapsed(), &packet, frame, agc_snapshot);

        Ok(())
    }

    pub fn monitor_mut(&mut self) -> &mut DebugMonitor {
        &mut self.monitor
    }
}

/// Normalize a raw band RMS against its AGC reference, then apply the
/// user-tunable gain, clamping to the packet's `[0, 1]` range.
fn apply_band_gain(raw: f32, gain: f32, agc: &mut AgcTracker) -> f32 {
    agc.update(&[raw]);
    let reference = agc.reference().max(1e-6);
    ((raw / reference) * gain).clamp(0.0, 1.0)
}

fn packet_is_finite(packet: &FeaturePacket) -> bool {
    packet.brightness.is_finite()
        && packet.flux.is_finite()
        && packet.low.is_finite()
        && packet.mid.is_finite()
        && packet.high.is_finite()
        && packet.bpm.is_finite()
        && packet.notes.iter().all(|n| n.is_finite())
}
