//! Real-time audio analysis engine: captures mono audio, runs it through a
//! filterbank/STFT/HPSS/chroma pipeline, and streams the resulting features
//! out over UDP while listening for live parameter updates on a second port.

pub mod audio;
pub mod config;
pub mod error;
pub mod monitor;
pub mod net;
pub mod packet;
pub mod params;
pub mod pipeline;
