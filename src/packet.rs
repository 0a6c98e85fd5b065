//! The 19-float feature packet: fixed field order, big-endian wire encoding.
//!
//! Grounded on `note_dancer.transmitter.NetworkTransmitter`, which packs the same
//! 19 fields with `struct.pack("!19f", ...)`.

use crate::config::PACKET_BYTES;

/// One analysis frame's worth of output features, in emission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeaturePacket {
    pub brightness: f32,
    pub flux: f32,
    pub low: f32,
    pub mid: f32,
    pub high: f32,
    pub bpm: f32,
    pub is_beat: bool,
    pub notes: [f32; 12],
}

impl FeaturePacket {
    /// Encode as 19 consecutive big-endian f32 values (76 bytes total), in the
    /// fixed order: brightness, flux, low, mid, high, bpm, is_beat, n0..n11.
    pub fn encode(&self) -> [u8; PACKET_BYTES] {
        let mut out = [0u8; PACKET_BYTES];
        let values = self.as_values();
        for (i, v) in values.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&v.to_be_bytes());
        }
        out
    }

    /// Decode from a 76-byte big-endian payload. Returns `None` if the slice is
    /// the wrong length.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PACKET_BYTES {
            return None;
        }
        let mut values = [0f32; 19];
        for (i, v) in values.iter_mut().enumerate() {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            *v = f32::from_be_bytes(buf);
        }
        Some(Self {
            brightness: values[0],
            flux: values[1],
            low: values[2],
            mid: values[3],
            high: values[4],
            bpm: values[5],
            is_beat: values[6] != 0.0,
            notes: [
                values[7], values[8], values[9], values[10], values[11], values[12],
                values[13], values[14], values[15], values[16], values[17], values[18],
            ],
        })
    }

    fn as_values(&self) -> [f32; 19] {
        let mut values = [0f32; 19];
        values[0] = self.brightness;
        values[1] = self.flux;
        values[2] = self.low;
        values[3] = self.mid;
        values[4] = self.high;
        values[5] = self.bpm;
        values[6] = if self.is_beat { 1.0 } else { 0.0 };
        values[7..19].copy_from_slice(&self.notes);
        values
    }
}
