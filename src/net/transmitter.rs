//! UDP Packet Transmitter: encodes a `FeaturePacket` and fires it at a
//! connected destination socket, one send per processed frame.
//!
//! Grounded on `engine_v2/transmitter.py`'s `NetworkTransmitter`: same
//! struct-pack-then-sendto shape, same "log and drop" policy on a send
//! failure (a single lost UDP packet should never stall the DSP loop). Using
//! `UdpSocket::connect` up front (rather than repeating `send_to` every
//! frame) lets the OS cache the route and turns each send into a plain
//! `send`, the same one-time-setup-then-repeat-writes shape the Python
//! version gets from binding `self.dest` once in `__init__`.

use std::net::{SocketAddr, UdpSocket};

use log::warn;

use crate::error::{EngineError, EngineResult};
use crate::packet::FeaturePacket;

pub struct Transmitter {
    socket: UdpSocket,
}

impl Transmitter {
    pub fn connect(dest: SocketAddr) -> EngineResult<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| EngineError::Device(format!("transmitter socket bind failed: {e}")))?;
        socket
            .connect(dest)
            .map_err(|e| EngineError::Device(format!("transmitter connect failed: {e}")))?;
        Ok(Self { socket })
    }

    /// Encode and send. A send failure is logged and swallowed; losing one
    /// outbound packet is never a reason to stop the pipeline.
    pub fn send(&self, packet: &FeaturePacket) {
        let bytes = packet.encode();
        if let Err(e) = self.socket.send(&bytes) {
            warn!("failed to send feature packet: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_round_trips_through_a_real_socket() {
        let recv_socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let recv_addr = recv_socket.local_addr().unwrap();
        recv_socket
            .set_read_timeout(Some(std::time::Duration::from_millis(500)))
            .unwrap();

        let transmitter = Transmitter::connect(recv_addr).unwrap();
        let packet = FeaturePacket {
            brightness: 0.5,
            flux: 0.25,
            low: 0.1,
            mid: 0.2,
            high: 0.3,
            bpm: 120.0,
            is_beat: true,
            notes: [0.0; 12],
        };
        transmitter.send(&packet);

        let mut buf = [0u8; 128];
        let (len, _) = recv_socket.recv_from(&mut buf).unwrap();
        let decoded = FeaturePacket::decode(&buf[..len]).unwrap();
        assert_eq!(decoded.bpm, 120.0);
        assert!(decoded.is_beat);
    }
}
