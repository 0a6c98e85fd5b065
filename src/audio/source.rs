//! Source Adapter: pulls one frame of mono Float32 samples per tick.
//!
//! The concrete capture device is an external collaborator; the DSP
//! pipeline only ever sees the `CaptureSource` trait. `CpalSource` is the
//! shipped implementation, grounded on `audio/processor.rs`'s capture pattern
//! (`cpal::default_host` + `build_input_stream` + a channel back to the
//! consumer). `ChannelSource` is the test seam used by unit and scenario tests
//! to feed synthetic audio without a real device.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

/// Pull-style source of fixed-size mono frames. `read` blocks until a frame is
/// available and returns `None` only on a fatal device error.
pub trait CaptureSource {
    fn read(&mut self) -> Option<Vec<f32>>;
}

/// Test/offline source: frames pushed through a bounded channel.
pub struct ChannelSource {
    receiver: Receiver<Vec<f32>>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Vec<f32>>) -> Self {
        Self { receiver }
    }
}

impl CaptureSource for ChannelSource {
    fn read(&mut self) -> Option<Vec<f32>> {
        self.receiver.recv().ok()
    }
}

/// Live microphone input via `cpal`, downmixed to mono.
pub struct CpalSource {
    _stream: cpal::Stream,
    receiver: Receiver<Vec<f32>>,
    chunk: usize,
    pending: Vec<f32>,
}

impl CpalSource {
    pub fn new(chunk: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?;
        let config = device
            .default_input_config()
            .map_err(|e| anyhow!("failed to get default input config: {e}"))?;

        info!(
            "using audio device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let channels = config.channels() as usize;
        // Bounded: under a buffer overrun from the capture layer we drop the
        // oldest pending frame rather than delay the DSP loop.
        let (sender, receiver): (Sender<Vec<f32>>, Receiver<Vec<f32>>) =
            crossbeam_channel::bounded(4);

        let stream_config: cpal::StreamConfig = config.into();
        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                        .collect()
                };
                if sender.is_full() {
                    let _ = sender.try_recv();
                }
                if sender.try_send(mono).is_err() {
                    warn!("dropped audio frame: downstream not keeping up");
                }
            },
            |err| warn!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            receiver,
            chunk,
            pending: Vec::with_capacity(chunk * 2),
        })
    }
}

impl CaptureSource for CpalSource {
    fn read(&mut self) -> Option<Vec<f32>> {
        while self.pending.len() < self.chunk {
            match self.receiver.recv() {
                Ok(mut data) => self.pending.append(&mut data),
                Err(_) => return None,
            }
        }
        let frame: Vec<f32> = self.pending.drain(..self.chunk).collect();
        Some(frame)
    }
}
