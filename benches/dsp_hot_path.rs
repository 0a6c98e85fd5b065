//! Benchmarks for the per-frame DSP hot path: the filterbank alone, the
//! STFT/HPSS pass alone, and a full `PipelineDriver::process_frame` call,
//! so a regression in any one stage stands out.

use std::net::UdpSocket;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use notewave_engine::audio::filterbank::Filterbank;
use notewave_engine::audio::hpss;
use notewave_engine::audio::spectrogram::StftAnalyzer;
use notewave_engine::config::Config;
use notewave_engine::params::ParameterStore;
use notewave_engine::pipeline::PipelineDriver;

const SAMPLE_RATE: f32 = 48_000.0;
const CHUNK: usize = 1024;

fn test_tone(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn filterbank_bench(filterbank: &mut Filterbank, frame: &[f32]) {
    black_box(filterbank.process_bands(frame));
}

fn stft_hpss_bench(stft: &mut StftAnalyzer, samples: &[f32]) {
    let spectrogram = stft.analyze(samples);
    black_box(hpss::separate(&spectrogram));
}

fn pipeline_bench(pipeline: &mut PipelineDriver, frame: &[f32]) {
    pipeline.process_frame(frame).unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let frame = test_tone(CHUNK);

    let mut filterbank = Filterbank::new(CHUNK, SAMPLE_RATE);
    c.bench_function("filterbank_process_bands", |b| {
        b.iter(|| filterbank_bench(&mut filterbank, &frame))
    });

    let mut stft = StftAnalyzer::new(CHUNK * 2, CHUNK);
    let window = test_tone(CHUNK * 6);
    c.bench_function("stft_plus_hpss", |b| {
        b.iter(|| stft_hpss_bench(&mut stft, &window))
    });

    let recv = UdpSocket::bind("127.0.0.1:0").unwrap();
    let mut config = Config { chunk: CHUNK, sample_rate: SAMPLE_RATE as u32, ..Config::default() };
    config.engine_addr = recv.local_addr().unwrap();
    let params = Arc::new(ParameterStore::new());
    let mut pipeline = PipelineDriver::new(config, params).unwrap();
    c.bench_function("pipeline_process_frame", |b| {
        b.iter(|| pipeline_bench(&mut pipeline, &frame))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
