//! Static engine configuration and its derived quantities.
//!
//! Mirrors `note_dancer.config` (`CHUNK`, `RATE`, `WINDOW_CHUNKS`,
//! `UDP_IP`, `UDP_PORT_ENGINE`, `UDP_PORT_COMMANDS`): no persistence, no CLI
//! parsing here, just the constants the rest of the engine derives from.

use std::net::SocketAddr;

/// Number of mono samples in one captured audio frame.
pub const DEFAULT_CHUNK: usize = 1024;
/// Capture sample rate in Hz.
pub const DEFAULT_RATE: u32 = 48_000;
/// Ring buffer length expressed as a multiple of `CHUNK`.
pub const DEFAULT_WINDOW_CHUNKS: usize = 6;

pub const DEFAULT_ENGINE_ADDR: &str = "127.0.0.1:5005";
pub const DEFAULT_COMMAND_ADDR: &str = "127.0.0.1:5006";

/// Number of bytes in one encoded feature packet (19 big-endian f32 values).
pub const PACKET_BYTES: usize = 19 * 4;

/// Maximum size of an inbound command datagram.
pub const MAX_COMMAND_DATAGRAM_BYTES: usize = 1024;

/// Read timeout for the command listener's UDP socket.
pub const COMMAND_SOCKET_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub chunk: usize,
    pub sample_rate: u32,
    pub window_chunks: usize,
    pub engine_addr: SocketAddr,
    pub command_addr: SocketAddr,
    pub summary_interval_secs: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk: DEFAULT_CHUNK,
            sample_rate: DEFAULT_RATE,
            window_chunks: DEFAULT_WINDOW_CHUNKS,
            engine_addr: DEFAULT_ENGINE_ADDR.parse().expect("valid default addr"),
            command_addr: DEFAULT_COMMAND_ADDR.parse().expect("valid default addr"),
            summary_interval_secs: 2.0,
        }
    }
}

impl Config {
    /// Frames per second the engine processes at: `sample_rate / chunk`.
    pub fn fps(&self) -> f32 {
        self.sample_rate as f32 / self.chunk as f32
    }

    /// FFT size used by the spectrogram: `2 * chunk`.
    pub fn n_fft(&self) -> usize {
        self.chunk * 2
    }

    /// STFT hop length: equal to `chunk` (no overlap beyond the sliding window).
    pub fn hop(&self) -> usize {
        self.chunk
    }

    /// Ring buffer length in samples: `chunk * window_chunks`.
    pub fn window_len(&self) -> usize {
        self.chunk * self.window_chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_quantities_match_spec_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.n_fft(), 2048);
        assert_eq!(cfg.window_len(), 6144);
        assert!((cfg.fps() - 46.875).abs() < 1e-6);
    }
}
