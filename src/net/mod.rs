//! Networking boundary: the UDP Command Listener (inbound parameter updates)
//! and the UDP Packet Transmitter (outbound feature packets).

pub mod command_listener;
pub mod transmitter;

pub use command_listener::CommandListener;
pub use transmitter::Transmitter;
