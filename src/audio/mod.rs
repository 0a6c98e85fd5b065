//! DSP pipeline modules: capture, filterbank, STFT/HPSS, chroma, brightness,
//! flux, tempo, and AGC.

pub mod agc;
pub mod brightness;
pub mod chroma;
pub mod filterbank;
pub mod flux;
pub mod hpss;
pub mod ring_buffer;
pub mod source;
pub mod spectrogram;
pub mod tempo;

pub use agc::AgcTracker;
pub use chroma::{ChromaMapper, ChromaNormalizer};
pub use filterbank::{Filterbank, RawBandEnergy};
pub use flux::FluxDetector;
pub use ring_buffer::RingBuffer;
pub use source::{CaptureSource, ChannelSource, CpalSource};
pub use spectrogram::{Spectrogram, StftAnalyzer};
pub use tempo::TempoTracker;
